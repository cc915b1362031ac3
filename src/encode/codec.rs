use crate::foundation::error::{CaptureError, CaptureResult};

/// Output container for video exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    /// ISO BMFF, written fragmented so it can stream.
    Mp4,
    /// WebM (Matroska subset).
    Webm,
    /// QuickTime, written fast-start.
    Mov,
    /// Matroska.
    Mkv,
}

impl Container {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mov => "mov",
            Self::Mkv => "mkv",
        }
    }

    /// Muxer name passed to `ffmpeg -f`.
    pub fn ffmpeg_muxer(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Mov => "mov",
            Self::Mkv => "matroska",
        }
    }

    /// Return `true` when `codec` can be stored in this container.
    pub fn supports(self, codec: VideoCodec) -> bool {
        match self {
            Self::Mp4 | Self::Mkv => true,
            Self::Mov => matches!(codec, VideoCodec::H264 | VideoCodec::H265),
            Self::Webm => matches!(codec, VideoCodec::Vp9 | VideoCodec::Av1),
        }
    }
}

impl std::str::FromStr for Container {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "mov" => Ok(Self::Mov),
            "mkv" => Ok(Self::Mkv),
            other => Err(CaptureError::unsupported(format!(
                "unknown container '{other}'"
            ))),
        }
    }
}

/// Video codec family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// H.264 / AVC.
    H264,
    /// H.265 / HEVC.
    H265,
    /// VP9.
    Vp9,
    /// AV1.
    Av1,
}

impl std::str::FromStr for VideoCodec {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h264" | "avc" => Ok(Self::H264),
            "h265" | "hevc" => Ok(Self::H265),
            "vp9" => Ok(Self::Vp9),
            "av1" => Ok(Self::Av1),
            other => Err(CaptureError::unsupported(format!("unknown codec '{other}'"))),
        }
    }
}

/// Concrete codec chosen for a track.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCodec {
    /// Codec family.
    pub family: VideoCodec,
    /// Codec identifier string (RFC 6381 style).
    pub identifier: &'static str,
    /// Profile passed to the encoder, when the family has one to pick.
    pub profile: Option<&'static str>,
    /// `ffmpeg` encoder name.
    pub ffmpeg_encoder: &'static str,
}

/// Heights at or above this use the high-profile H.264 identifier.
pub const H264_HIGH_PROFILE_MIN_HEIGHT: u32 = 1080;

/// Map a codec family and output height to a concrete identifier.
pub fn resolve(codec: VideoCodec, height: u32) -> ResolvedCodec {
    match codec {
        VideoCodec::H264 if height < H264_HIGH_PROFILE_MIN_HEIGHT => ResolvedCodec {
            family: codec,
            identifier: "avc1.42001f",
            profile: Some("baseline"),
            ffmpeg_encoder: "libx264",
        },
        VideoCodec::H264 => ResolvedCodec {
            family: codec,
            identifier: "avc1.640028",
            profile: Some("high"),
            ffmpeg_encoder: "libx264",
        },
        VideoCodec::H265 => ResolvedCodec {
            family: codec,
            identifier: "hvc1.1.6.L120.B0",
            profile: Some("main"),
            ffmpeg_encoder: "libx265",
        },
        VideoCodec::Vp9 => ResolvedCodec {
            family: codec,
            identifier: "vp09.00.10.08",
            profile: None,
            ffmpeg_encoder: "libvpx-vp9",
        },
        VideoCodec::Av1 => ResolvedCodec {
            family: codec,
            identifier: "av01.0.05M.08",
            profile: None,
            ffmpeg_encoder: "libaom-av1",
        },
    }
}

/// Resolve `codec` for `container`, rejecting combinations the container cannot hold.
pub fn resolve_for(
    container: Container,
    codec: VideoCodec,
    height: u32,
) -> CaptureResult<ResolvedCodec> {
    if !container.supports(codec) {
        return Err(CaptureError::unsupported(format!(
            "{codec:?} cannot be stored in a {} container",
            container.extension()
        )));
    }
    Ok(resolve(codec, height))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/codec.rs"]
mod tests;
