use crate::foundation::core::Rgba8;
use crate::foundation::error::CaptureResult;
use crate::frame::buffer::FrameRGBA;
use crate::frame::composite::flatten_premul_over_bg_in_place;
use crate::frame::flip::flip_rows_in_place;
use crate::host::renderer::{PixelRect, Renderer};

/// Render the current scene state and read it back into `frame`.
///
/// The readback arrives bottom row first and is flipped to a top-left origin. With a
/// `background` the premultiplied pixels are flattened onto it and the frame becomes opaque;
/// without one (transparent export) the premultiplied values are kept as read.
pub async fn capture_frame<R: Renderer + ?Sized>(
    renderer: &mut R,
    frame: &mut FrameRGBA,
    background: Option<Rgba8>,
) -> CaptureResult<()> {
    renderer.request_render().finished().await?;
    renderer
        .read_pixels(PixelRect::full(frame.width, frame.height), &mut frame.data)
        .await?;

    flip_rows_in_place(&mut frame.data, frame.width, frame.height)?;
    frame.premultiplied = true;

    if let Some(bg) = background {
        flatten_premul_over_bg_in_place(&mut frame.data, bg)?;
        frame.premultiplied = false;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/capture/grab.rs"]
mod tests;
