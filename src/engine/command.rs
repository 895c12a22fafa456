// Transcode job construction - fixed output path and argument vector

use std::fs;
use std::path::{Path, PathBuf};

use super::codec::CodecPolicy;
use crate::error::{Result, TranscodeError};

/// Fixed output filename stem; one compressed artifact is retained at a
/// time and a new run replaces it.
const OUTPUT_STEM: &str = "compressed_video";

/// Fully-specified transcode job, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    command_arguments: Vec<String>,
}

impl JobDescriptor {
    /// Argument vector handed to the engine, in order.
    pub fn command_arguments(&self) -> &[String] {
        &self.command_arguments
    }
}

/// Build a job descriptor for `input_path` under `output_dir`.
///
/// Deletes any pre-existing output artifact so the engine never has to
/// prompt about overwriting. Same inputs always produce the same argument
/// vector.
pub fn build(
    input_path: &Path,
    policy: &CodecPolicy,
    output_dir: &Path,
) -> Result<JobDescriptor> {
    validate_input(input_path)?;

    let output_path = output_dir.join(format!("{OUTPUT_STEM}.{}", policy.extension));
    if output_path.exists() {
        fs::remove_file(&output_path)?;
    }

    let mut args: Vec<String> = Vec::with_capacity(14 + policy.extra_args.len());
    args.push("-i".into());
    args.push(input_path.to_string_lossy().into_owned());
    args.push("-c:v".into());
    args.push(policy.encoder.into());
    // Fixed quality and audio parameters shared by every codec choice
    args.extend(
        ["-crf", "23", "-preset", "medium", "-c:a", "aac", "-b:a", "192k"]
            .iter()
            .map(|s| s.to_string()),
    );
    args.push("-pix_fmt".into());
    args.push(policy.pixel_format.into());
    args.extend(policy.extra_args.iter().map(|s| s.to_string()));
    args.push(output_path.to_string_lossy().into_owned());

    Ok(JobDescriptor {
        input_path: input_path.to_path_buf(),
        output_path,
        command_arguments: args,
    })
}

/// Best-effort pre-submission check. Readability beyond "exists and is a
/// regular file" is left to the engine.
fn validate_input(input_path: &Path) -> Result<()> {
    if input_path.as_os_str().is_empty() {
        return Err(TranscodeError::InvalidInput {
            path: input_path.to_path_buf(),
            reason: "path is empty".into(),
        });
    }
    if !input_path.is_file() {
        return Err(TranscodeError::InvalidInput {
            path: input_path.to_path_buf(),
            reason: "not a readable file".into(),
        });
    }
    Ok(())
}
