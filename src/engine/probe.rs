// Input probing and toolchain preflight using ffprobe/ffmpeg

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;

use crate::config::EngineConfig;

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

/// Check that ffmpeg is available and return its version line.
pub fn ffmpeg_version(engine: &EngineConfig) -> Result<String> {
    version_line(&engine.ffmpeg_path)
        .context("Failed to execute ffmpeg. Is ffmpeg installed and in PATH?")
}

/// Check that ffprobe is available and return its version line.
pub fn ffprobe_version(engine: &EngineConfig) -> Result<String> {
    version_line(&engine.ffprobe_path)
        .context("Failed to execute ffprobe. Is ffprobe installed and in PATH?")
}

fn version_line(binary: &str) -> Result<String> {
    let output = Command::new(binary).arg("-version").output()?;

    if !output.status.success() {
        anyhow::bail!("{} command failed with status: {}", binary, output.status);
    }

    let version_output = String::from_utf8_lossy(&output.stdout);
    let first_line = version_output.lines().next().unwrap_or("Unknown version");

    Ok(first_line.to_string())
}

/// Probe a video file to get its duration in seconds.
pub fn probe_duration(engine: &EngineConfig, path: &Path) -> Result<f64> {
    let output = Command::new(&engine.ffprobe_path)
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .context("Failed to execute ffprobe")?;

    if !output.status.success() {
        anyhow::bail!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the duration out of ffprobe's `-show_format` JSON.
pub fn parse_ffprobe_duration(json: &str) -> Result<f64> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe JSON output")?;

    let duration_str = parsed
        .format
        .duration
        .context("ffprobe output has no duration field")?;

    duration_str
        .parse::<f64>()
        .with_context(|| format!("Invalid duration value: {duration_str}"))
}
