use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::unit_f32_to_u8;

/// Float-precision running sum of composited frames, averaged into one export frame.
///
/// Sized once per export operation and reset at the start of every blur group.
#[derive(Debug, Clone)]
pub struct MotionBlurAccumulator {
    sum: Vec<f32>,
    samples: u32,
}

impl MotionBlurAccumulator {
    /// Create an accumulator for frames of `byte_len` RGBA8 bytes.
    pub fn new(byte_len: usize) -> Self {
        Self {
            sum: vec![0.0; byte_len],
            samples: 0,
        }
    }

    /// Zero the sum for a new blur group.
    pub fn reset(&mut self) {
        self.sum.fill(0.0);
        self.samples = 0;
    }

    /// Number of frames accumulated since the last reset.
    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Add one frame to the running sum.
    pub fn accumulate(&mut self, data: &[u8]) -> CaptureResult<()> {
        if data.len() != self.sum.len() {
            return Err(CaptureError::validation(format!(
                "accumulator holds {} bytes, frame has {}",
                self.sum.len(),
                data.len()
            )));
        }
        for (s, &v) in self.sum.iter_mut().zip(data) {
            *s += f32::from(v);
        }
        self.samples += 1;
        Ok(())
    }

    /// Write `round(sum / samples)` into `out`.
    pub fn resolve_into(&self, out: &mut [u8]) -> CaptureResult<()> {
        if self.samples == 0 {
            return Err(CaptureError::render(
                "motion blur group produced no accumulated samples",
            ));
        }
        if out.len() != self.sum.len() {
            return Err(CaptureError::validation(format!(
                "accumulator holds {} bytes, output has {}",
                self.sum.len(),
                out.len()
            )));
        }
        let inv = 1.0 / self.samples as f32;
        for (o, &s) in out.iter_mut().zip(&self.sum) {
            *o = unit_f32_to_u8(s * inv);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/accumulate.rs"]
mod tests;
