use crate::foundation::error::{CaptureError, CaptureResult};

/// Which row a pixel buffer stores first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowOrigin {
    /// Row 0 is the top of the image (image files, 2D canvases).
    TopLeft,
    /// Row 0 is the bottom of the image (GPU readback).
    BottomLeft,
}

/// Swap row `y` with row `height - 1 - y` for every `y < height / 2`.
///
/// Applying the flip twice restores the original buffer.
pub fn flip_rows_in_place(data: &mut [u8], width: u32, height: u32) -> CaptureResult<()> {
    let stride = width as usize * 4;
    if data.len() != stride * height as usize {
        return Err(CaptureError::validation(format!(
            "flip expects {}x{} rgba8 data ({} bytes), got {}",
            width,
            height,
            stride * height as usize,
            data.len()
        )));
    }

    let rows = height as usize;
    for y in 0..rows / 2 {
        let (head, tail) = data.split_at_mut((rows - 1 - y) * stride);
        head[y * stride..(y + 1) * stride].swap_with_slice(&mut tail[..stride]);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/frame/flip.rs"]
mod tests;
