use crate::foundation::core::Canvas;
use crate::foundation::error::{CaptureError, CaptureResult};

/// One RGBA8 frame: tightly packed, row-major, top-left origin once it leaves
/// [`crate::capture_frame`].
///
/// `premultiplied` is `true` while color channels are still scaled by alpha (straight off the
/// render target) and becomes `false` once the frame has been composited onto an opaque
/// background.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Allocate a zeroed frame. Both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> CaptureResult<Self> {
        let canvas = Canvas { width, height };
        if width == 0 || height == 0 {
            return Err(CaptureError::validation(
                "frame width/height must be non-zero",
            ));
        }
        Ok(Self {
            width,
            height,
            data: vec![0u8; canvas.rgba8_len()],
            premultiplied: true,
        })
    }

    /// Wrap existing pixel data, checking its length.
    pub fn from_raw(
        width: u32,
        height: u32,
        data: Vec<u8>,
        premultiplied: bool,
    ) -> CaptureResult<Self> {
        let expected = Canvas { width, height }.rgba8_len();
        if data.len() != expected {
            return Err(CaptureError::validation(format!(
                "frame data is {} bytes, expected {expected} for {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied,
        })
    }

    /// Frame dimensions.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Borrow row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Read the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/buffer.rs"]
mod tests;
