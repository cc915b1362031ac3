use crate::encode::codec::{Container, VideoCodec, resolve_for};
use crate::encode::still::{ImageFormat, StillFormat};
use crate::encode::video::validate_video_output;
use crate::foundation::core::{Fps, FrameIndex, FrameRange};
use crate::foundation::error::{CaptureError, CaptureResult};

/// Settings shared by every export kind.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Keep alpha instead of compositing onto the scene background.
    #[serde(default)]
    pub transparent: bool,
    /// Keep overlays and debug layers in the output.
    #[serde(default)]
    pub show_overlays: bool,
}

impl CaptureSettings {
    /// Plain `width x height` capture.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            transparent: false,
            show_overlays: false,
        }
    }

    /// Reject zero-sized output.
    pub fn validate(&self) -> CaptureResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::validation(format!(
                "output size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Single still frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageExportSettings {
    /// Shared capture settings.
    #[serde(flatten)]
    pub capture: CaptureSettings,
}

impl ImageExportSettings {
    /// Validate before any rendering.
    pub fn validate(&self) -> CaptureResult<()> {
        self.capture.validate()
    }
}

/// Encoded video of a timeline range.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoExportSettings {
    /// Shared capture settings.
    #[serde(flatten)]
    pub capture: CaptureSettings,
    /// First timeline frame, inclusive.
    pub start_frame: u64,
    /// Last timeline frame, inclusive.
    pub end_frame: u64,
    /// Output frames per second.
    pub frame_rate: u32,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Output container.
    pub container: Container,
    /// Output codec.
    pub codec: VideoCodec,
}

impl VideoExportSettings {
    /// Timeline frames covered, as a half-open range.
    pub fn frame_range(&self) -> CaptureResult<FrameRange> {
        FrameRange::inclusive(FrameIndex(self.start_frame), FrameIndex(self.end_frame))
    }

    /// Output frame rate.
    pub fn fps(&self) -> CaptureResult<Fps> {
        Fps::whole(self.frame_rate)
    }

    /// Validate geometry, range, rate and the container/codec pair.
    pub fn validate(&self) -> CaptureResult<()> {
        self.capture.validate()?;
        self.frame_range()?;
        let fps = self.fps()?;
        validate_video_output(self.capture.width, self.capture.height, fps, self.bitrate)?;
        resolve_for(self.container, self.codec, self.capture.height)?;
        Ok(())
    }
}

/// Directory of numbered stills, optionally motion blurred.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceExportSettings {
    /// Shared capture settings.
    #[serde(flatten)]
    pub capture: CaptureSettings,
    /// First timeline frame, inclusive.
    pub start_frame: u64,
    /// Last timeline frame, inclusive.
    pub end_frame: u64,
    /// Still format for every frame.
    #[serde(default)]
    pub format: ImageFormat,
    /// Lossy quality in `[0, 1]`.
    #[serde(default)]
    pub quality: Option<f32>,
    /// Source frames averaged per exported frame; 1 or unset disables blur.
    #[serde(default)]
    pub motion_blur_samples: Option<u32>,
}

impl SequenceExportSettings {
    /// Timeline frames covered, as a half-open range.
    pub fn frame_range(&self) -> CaptureResult<FrameRange> {
        FrameRange::inclusive(FrameIndex(self.start_frame), FrameIndex(self.end_frame))
    }

    /// Motion blur group size `M`.
    pub fn blur_samples(&self) -> u32 {
        self.motion_blur_samples.unwrap_or(1)
    }

    /// Resolved still encoding.
    pub fn still_format(&self) -> StillFormat {
        StillFormat::from_settings(self.format, self.quality)
    }

    /// Validate geometry, range, quality and blur count.
    pub fn validate(&self) -> CaptureResult<()> {
        self.capture.validate()?;
        self.frame_range()?;
        if let Some(q) = self.quality
            && !(0.0..=1.0).contains(&q)
        {
            return Err(CaptureError::validation(format!(
                "quality must be in [0, 1], got {q}"
            )));
        }
        if self.motion_blur_samples == Some(0) {
            return Err(CaptureError::validation(
                "motion blur sample count must be >= 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/settings.rs"]
mod tests;
