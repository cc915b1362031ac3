use crate::capture::grab::capture_frame;
use crate::capture::prepare::{FramePreparer, PrepareOutcome, SORT_FALLBACK_TIMEOUT};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::frame::accumulate::MotionBlurAccumulator;
use crate::frame::buffer::FrameRGBA;
use crate::host::renderer::RendererState;
use crate::host::scene::Viewer;
use std::time::Duration;

/// Parameters for entering an offscreen capture session.
#[derive(Clone, Copy, Debug)]
pub struct SessionOpts {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Keep overlays and debug layers visible in the capture.
    pub show_overlays: bool,
    /// Keep the alpha channel instead of compositing onto the scene background.
    pub transparent: bool,
    /// Allocate a motion blur accumulator.
    pub motion_blur: bool,
    /// Fallback timeout for sort completion.
    pub sort_timeout: Duration,
}

impl SessionOpts {
    /// Options for a `width x height` opaque capture without overlays or blur.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            show_overlays: false,
            transparent: false,
            motion_blur: false,
            sort_timeout: SORT_FALLBACK_TIMEOUT,
        }
    }
}

/// Exclusive offscreen session over a viewer, owning every per-export buffer.
///
/// Only one session may be active per viewer; the `&mut` borrow enforces that statically.
/// Renderer state captured at [`CaptureSession::begin`] is restored by
/// [`CaptureSession::finish`], or by `Drop` on any other exit path.
pub struct CaptureSession<'v, V: Viewer + ?Sized> {
    viewer: &'v mut V,
    saved: Option<RendererState>,
    background: Option<Rgba8>,
    frame: FrameRGBA,
    accumulator: Option<MotionBlurAccumulator>,
    preparer: FramePreparer,
}

impl<'v, V: Viewer + ?Sized> CaptureSession<'v, V> {
    /// Snapshot renderer state and switch the viewer to offscreen rendering.
    pub fn begin(viewer: &'v mut V, opts: SessionOpts) -> CaptureResult<Self> {
        let frame = FrameRGBA::new(opts.width, opts.height)?;
        let accumulator = opts
            .motion_blur
            .then(|| MotionBlurAccumulator::new(frame.data.len()));

        let saved = viewer.renderer_state();
        let background = (!opts.transparent).then(|| viewer.background_color());

        viewer.begin_offscreen(opts.width, opts.height)?;
        viewer.apply_renderer_state(RendererState {
            overlays_visible: opts.show_overlays,
            debug_layers_visible: opts.show_overlays,
            clear_color: Rgba8::transparent(),
        });
        tracing::debug!(
            width = opts.width,
            height = opts.height,
            transparent = opts.transparent,
            overlays = opts.show_overlays,
            "offscreen session started"
        );

        Ok(Self {
            viewer,
            saved: Some(saved),
            background,
            frame,
            accumulator,
            preparer: FramePreparer::new(opts.sort_timeout),
        })
    }

    /// Borrow the viewer driven by this session.
    pub fn viewer(&self) -> &V {
        self.viewer
    }

    /// Background frames are composited onto, `None` for transparent captures.
    pub fn background(&self) -> Option<Rgba8> {
        self.background
    }

    /// The reusable frame buffer holding the latest capture or blur result.
    pub fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    /// Move the timeline and wait for sorting; see [`FramePreparer::prepare`].
    pub async fn prepare(&mut self, time_secs: f64, skip_sort: bool) -> PrepareOutcome {
        self.preparer
            .prepare(&mut *self.viewer, time_secs, skip_sort)
            .await
    }

    /// Render and read back into the session frame.
    pub async fn capture(&mut self) -> CaptureResult<&FrameRGBA> {
        capture_frame(&mut *self.viewer, &mut self.frame, self.background).await?;
        Ok(&self.frame)
    }

    /// Start a new blur group.
    pub fn begin_blur_group(&mut self) -> CaptureResult<()> {
        self.accumulator_mut()?.reset();
        Ok(())
    }

    /// Add the current frame to the blur group.
    pub fn accumulate(&mut self) -> CaptureResult<()> {
        let acc = self
            .accumulator
            .as_mut()
            .ok_or_else(|| CaptureError::render("session has no motion blur accumulator"))?;
        acc.accumulate(&self.frame.data)
    }

    /// Replace the session frame with the blur group's average.
    pub fn resolve_blur(&mut self) -> CaptureResult<&FrameRGBA> {
        let acc = self
            .accumulator
            .as_ref()
            .ok_or_else(|| CaptureError::render("session has no motion blur accumulator"))?;
        acc.resolve_into(&mut self.frame.data)?;
        Ok(&self.frame)
    }

    /// Leave offscreen mode and restore the renderer state captured at `begin`.
    pub fn finish(mut self) {
        self.restore();
    }

    fn accumulator_mut(&mut self) -> CaptureResult<&mut MotionBlurAccumulator> {
        self.accumulator
            .as_mut()
            .ok_or_else(|| CaptureError::render("session has no motion blur accumulator"))
    }

    fn restore(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.viewer.end_offscreen();
            self.viewer.apply_renderer_state(saved);
            tracing::debug!("offscreen session ended; renderer state restored");
        }
    }
}

impl<V: Viewer + ?Sized> Drop for CaptureSession<'_, V> {
    fn drop(&mut self) {
        self.restore();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
