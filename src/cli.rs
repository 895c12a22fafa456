use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ffpress")]
#[command(about = "Video compressor with codec presets and live progress", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a video with a codec preset and play-ready output
    Transcode {
        /// Path to the input video file
        input: PathBuf,

        /// Codec label (see `list-codecs`); defaults to the configured codec
        #[arg(long)]
        codec: Option<String>,
    },

    /// Run a raw command string against the engine
    Exec {
        /// Full argument string, shell-style quoting respected
        command: String,

        /// Run ffprobe instead of ffmpeg
        #[arg(long)]
        probe: bool,
    },

    /// Probe a video file to get its duration
    Probe {
        /// Path to the video file
        file: PathBuf,
    },

    /// List the selectable codec labels and their policies
    ListCodecs,

    /// Check if ffmpeg and ffprobe are installed
    CheckFfmpeg,

    /// Write the default config file if none exists
    InitConfig,
}
