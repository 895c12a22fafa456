// Transcoding engine boundary - independent of UI

pub mod codec;
pub mod command;
pub mod probe;
pub mod runner;

pub use codec::{CodecPolicy, DEFAULT_POLICY, known_labels, lookup, validate_labels};
pub use command::JobDescriptor;
pub use probe::{ffmpeg_version, ffprobe_version, probe_duration};
pub use runner::{
    FfmpegRunner, JobHandle, JobOutcome, JobProgress, JobRunner, SessionCallbacks, SessionKind,
    SessionState, SessionSummary,
};
