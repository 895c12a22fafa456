// Codec policy table - maps user-facing labels to encoder settings

/// Everything the command builder needs to know about one codec choice.
///
/// Policies are fixed at compile time; `lookup` never fails. Labels the
/// table does not know resolve to [`DEFAULT_POLICY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecPolicy {
    /// Label shown in the codec picker.
    pub label: &'static str,
    /// Encoder name passed to ffmpeg via `-c:v`.
    pub encoder: &'static str,
    /// Pixel format passed via `-pix_fmt`.
    pub pixel_format: &'static str,
    /// Codec-specific options appended after the fixed parameters.
    pub extra_args: &'static [&'static str],
    /// Container extension for the output file.
    pub extension: &'static str,
}

/// Fallback for unknown labels: the label itself is used as the encoder
/// name, with the common 8-bit pixel format and an mp4 container.
pub const DEFAULT_POLICY: CodecPolicy = CodecPolicy {
    label: "mpeg4",
    encoder: "mpeg4",
    pixel_format: "yuv420p",
    extra_args: &[],
    extension: "mp4",
};

/// One row per selectable codec. Order matches the picker.
pub static POLICIES: &[CodecPolicy] = &[
    CodecPolicy {
        label: "mpeg4",
        encoder: "mpeg4",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "x264",
        encoder: "libx264",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "h264_mediacodec",
        encoder: "h264_mediacodec",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "hevc_mediacodec",
        encoder: "hevc_mediacodec",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "openh264",
        encoder: "libopenh264",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "x265",
        encoder: "libx265",
        pixel_format: "yuv420p10le",
        extra_args: &["-crf", "28", "-preset", "fast"],
        extension: "mp4",
    },
    CodecPolicy {
        label: "xvid",
        encoder: "libxvid",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "vp8",
        encoder: "libvpx",
        pixel_format: "yuv420p",
        extra_args: &["-b:v", "1M", "-crf", "10"],
        extension: "webm",
    },
    CodecPolicy {
        label: "vp9",
        encoder: "libvpx-vp9",
        pixel_format: "yuv420p",
        extra_args: &["-b:v", "2M"],
        extension: "webm",
    },
    CodecPolicy {
        label: "aom",
        encoder: "libaom-av1",
        pixel_format: "yuv420p",
        extra_args: &["-crf", "30", "-strict", "experimental"],
        extension: "mkv",
    },
    CodecPolicy {
        label: "kvazaar",
        encoder: "libkvazaar",
        pixel_format: "yuv420p",
        extra_args: &[],
        extension: "mp4",
    },
    CodecPolicy {
        label: "theora",
        encoder: "libtheora",
        pixel_format: "yuv420p",
        extra_args: &["-qscale:v", "7"],
        extension: "ogv",
    },
];

/// Resolve a user-facing label to its policy. Total: unknown labels get
/// the default policy.
pub fn lookup(label: &str) -> &'static CodecPolicy {
    POLICIES
        .iter()
        .find(|p| p.label == label)
        .unwrap_or(&DEFAULT_POLICY)
}

/// Labels in picker order, for `list-codecs` and validation.
pub fn known_labels() -> impl Iterator<Item = &'static str> {
    POLICIES.iter().map(|p| p.label)
}

/// Startup check: every advertised label must resolve to exactly one row.
///
/// Returns the offending label on a duplicate or a label that silently
/// falls through to the default policy.
pub fn validate_labels<'a>(advertised: impl IntoIterator<Item = &'a str>) -> Result<(), String> {
    for label in advertised {
        let matches = POLICIES.iter().filter(|p| p.label == label).count();
        match matches {
            1 => {}
            0 => return Err(format!("codec label '{label}' has no policy")),
            _ => return Err(format!("codec label '{label}' has {matches} policies")),
        }
    }
    Ok(())
}
