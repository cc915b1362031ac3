use crate::foundation::core::Rgba8;
use crate::foundation::error::{CaptureError, CaptureResult};
use tokio::sync::oneshot;

/// Renderer settings an offscreen session overrides and must put back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererState {
    /// Gizmos, selection outlines and other viewport overlays.
    pub overlays_visible: bool,
    /// Debug layers such as bounds and grids.
    pub debug_layers_visible: bool,
    /// Color the render target is cleared to before drawing.
    pub clear_color: Rgba8,
}

/// Rectangular pixel region of a render target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Bottom edge (render targets use a bottom-left origin).
    pub y: u32,
    /// Region width.
    pub width: u32,
    /// Region height.
    pub height: u32,
}

impl PixelRect {
    /// Region covering a whole `width x height` target.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// One-shot "render finished" notification.
#[derive(Debug)]
pub struct RenderSignal(oneshot::Receiver<()>);

impl RenderSignal {
    /// Create a linked notifier/signal pair.
    pub fn channel() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self(rx))
    }

    /// Wait until the renderer reports the frame as finished.
    pub async fn finished(self) -> CaptureResult<()> {
        self.0
            .await
            .map_err(|_| CaptureError::render("renderer dropped the render-complete signal"))
    }
}

/// Rendering capabilities the capture pipeline drives.
///
/// Implementations wrap a real viewer; [`crate::synthetic::SyntheticViewer`] is a CPU stand-in.
#[async_trait::async_trait]
pub trait Renderer: Send {
    /// Current overlay/debug/clear settings.
    fn renderer_state(&self) -> RendererState;

    /// Replace overlay/debug/clear settings.
    fn apply_renderer_state(&mut self, state: RendererState);

    /// Scene background used when exporting without transparency.
    fn background_color(&self) -> Rgba8;

    /// Switch rendering to an offscreen `width x height` target.
    fn begin_offscreen(&mut self, width: u32, height: u32) -> CaptureResult<()>;

    /// Return to interactive rendering.
    fn end_offscreen(&mut self);

    /// Force a render of the current scene state.
    fn request_render(&mut self) -> RenderSignal;

    /// Copy the active target into staging and read `rect` back as premultiplied RGBA8,
    /// bottom row first.
    async fn read_pixels(&mut self, rect: PixelRect, dst: &mut [u8]) -> CaptureResult<()>;
}
