use crate::foundation::core::Canvas;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::frame::flip::RowOrigin;
use image::ImageEncoder as _;

/// Quality used for lossy stills when the settings leave it unset.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.92;

/// Still-image file format selectable in settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG.
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = CaptureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            other => Err(CaptureError::unsupported(format!(
                "unknown image format '{other}'"
            ))),
        }
    }
}

/// Resolved still encoding request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StillFormat {
    /// Lossless PNG.
    Png,
    /// JPEG with quality in `1..=100`.
    Jpeg {
        /// Encoder quality percent.
        quality: u8,
    },
}

impl StillFormat {
    /// Build from a settings format and optional `[0, 1]` quality factor.
    pub fn from_settings(format: ImageFormat, quality: Option<f32>) -> Self {
        match format {
            ImageFormat::Png => Self::Png,
            ImageFormat::Jpeg => Self::Jpeg {
                quality: jpeg_quality_percent(quality.unwrap_or(DEFAULT_JPEG_QUALITY)),
            },
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => ImageFormat::Png.extension(),
            Self::Jpeg { .. } => ImageFormat::Jpeg.extension(),
        }
    }
}

/// Map a `[0, 1]` quality factor to a JPEG quality percent.
pub fn jpeg_quality_percent(q: f32) -> u8 {
    let q = if q.is_finite() { q } else { DEFAULT_JPEG_QUALITY };
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes one RGBA8 frame into a still-image file.
///
/// Frames are handed over top-left first unless [`StillEncoder::row_origin`] says otherwise;
/// canvas-style accelerated encoders expect bottom-left rows.
#[async_trait::async_trait]
pub trait StillEncoder: Send {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Row order this encoder expects.
    fn row_origin(&self) -> RowOrigin {
        RowOrigin::TopLeft
    }

    /// Return `true` when this encoder handles `format`.
    fn supports(&self, _format: StillFormat) -> bool {
        true
    }

    /// Encode `rgba` (`width * height * 4` bytes) as `format`.
    async fn encode(
        &mut self,
        canvas: Canvas,
        rgba: &[u8],
        format: StillFormat,
    ) -> CaptureResult<Vec<u8>>;
}

/// CPU encoder built on the `image` crate; always available.
#[derive(Clone, Copy, Debug, Default)]
pub struct SoftwareStillEncoder;

#[async_trait::async_trait]
impl StillEncoder for SoftwareStillEncoder {
    fn name(&self) -> &str {
        "software"
    }

    async fn encode(
        &mut self,
        canvas: Canvas,
        rgba: &[u8],
        format: StillFormat,
    ) -> CaptureResult<Vec<u8>> {
        match format {
            StillFormat::Png => encode_png(canvas, rgba),
            StillFormat::Jpeg { quality } => encode_jpeg(canvas, rgba, quality),
        }
    }
}

/// Encode RGBA8 as PNG.
pub fn encode_png(canvas: Canvas, rgba: &[u8]) -> CaptureResult<Vec<u8>> {
    check_len(canvas, rgba)?;
    let mut buffer = Vec::new();
    image::codecs::png::PngEncoder::new(&mut buffer).write_image(
        rgba,
        canvas.width,
        canvas.height,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(buffer)
}

/// Encode RGBA8 as JPEG, dropping alpha.
pub fn encode_jpeg(canvas: Canvas, rgba: &[u8], quality: u8) -> CaptureResult<Vec<u8>> {
    check_len(canvas, rgba)?;
    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();
    let mut buffer = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .write_image(
            &rgb,
            canvas.width,
            canvas.height,
            image::ExtendedColorType::Rgb8,
        )?;
    Ok(buffer)
}

fn check_len(canvas: Canvas, rgba: &[u8]) -> CaptureResult<()> {
    if rgba.len() != canvas.rgba8_len() {
        return Err(CaptureError::validation(format!(
            "still encoder got {} bytes for {}x{}",
            rgba.len(),
            canvas.width,
            canvas.height
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/still.rs"]
mod tests;
