use std::path::PathBuf;
use thiserror::Error;

/// Errors the façade can report before a job reaches the engine.
///
/// Engine-side failures are not errors in this sense: they arrive as a
/// terminal `JobOutcome::Failure` and are surfaced through the UI queue.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// Input path is empty or does not point at a readable file.
    #[error("invalid input {path:?}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    /// A transcode job is already submitted or running.
    #[error("a transcode job is already in flight")]
    JobInFlight,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TranscodeError>;
