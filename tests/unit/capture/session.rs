use super::*;
use crate::foundation::core::{CameraPose, Fps};
use crate::host::renderer::{PixelRect, RenderSignal, Renderer};
use crate::host::scene::{PointCloudId, Scene, SortSignal};

const INTERACTIVE: RendererState = RendererState {
    overlays_visible: true,
    debug_layers_visible: true,
    clear_color: Rgba8::opaque(10, 20, 30),
};

/// Viewer that renders a constant color and records offscreen transitions.
struct FlatViewer {
    state: RendererState,
    applied: Vec<RendererState>,
    offscreen: Option<(u32, u32)>,
    offscreen_exits: usize,
    color: [u8; 4],
    sorts: usize,
}

impl FlatViewer {
    fn new(color: [u8; 4]) -> Self {
        Self {
            state: INTERACTIVE,
            applied: Vec::new(),
            offscreen: None,
            offscreen_exits: 0,
            color,
            sorts: 0,
        }
    }
}

#[async_trait::async_trait]
impl Renderer for FlatViewer {
    fn renderer_state(&self) -> RendererState {
        self.state
    }
    fn apply_renderer_state(&mut self, state: RendererState) {
        self.state = state;
        self.applied.push(state);
    }
    fn background_color(&self) -> Rgba8 {
        Rgba8::opaque(0, 0, 0)
    }
    fn begin_offscreen(&mut self, width: u32, height: u32) -> CaptureResult<()> {
        self.offscreen = Some((width, height));
        Ok(())
    }
    fn end_offscreen(&mut self) {
        self.offscreen = None;
        self.offscreen_exits += 1;
    }
    fn request_render(&mut self) -> RenderSignal {
        let (tx, signal) = RenderSignal::channel();
        let _ = tx.send(());
        signal
    }
    async fn read_pixels(&mut self, _rect: PixelRect, dst: &mut [u8]) -> CaptureResult<()> {
        for px in dst.chunks_exact_mut(4) {
            px.copy_from_slice(&self.color);
        }
        Ok(())
    }
}

impl Scene for FlatViewer {
    fn source_name(&self) -> String {
        "flat".into()
    }
    fn current_time(&self) -> f64 {
        0.0
    }
    fn timeline_fps(&self) -> Fps {
        Fps::whole(30).unwrap()
    }
    fn set_time(&mut self, _seconds: f64) {}
    fn update_camera(&mut self, _dt: f64) {}
    fn camera_pose(&self) -> CameraPose {
        CameraPose {
            position: [0.0, 0.0, 1.0],
            forward: [0.0, 0.0, -1.0],
        }
    }
    fn visible_point_clouds(&self) -> Vec<PointCloudId> {
        vec![PointCloudId(7)]
    }
    fn request_sort(&mut self, _cloud: PointCloudId) -> SortSignal {
        self.sorts += 1;
        SortSignal::Idle
    }
}

fn opts(w: u32, h: u32) -> SessionOpts {
    SessionOpts::new(w, h)
}

#[test]
fn begin_enters_offscreen_with_transparent_clear() {
    let mut viewer = FlatViewer::new([0, 0, 0, 0]);
    let session = CaptureSession::begin(
        &mut viewer,
        SessionOpts {
            show_overlays: false,
            ..opts(4, 2)
        },
    )
    .unwrap();
    assert_eq!(session.viewer().offscreen, Some((4, 2)));
    assert_eq!(
        session.viewer().state,
        RendererState {
            overlays_visible: false,
            debug_layers_visible: false,
            clear_color: Rgba8::transparent(),
        }
    );
    assert_eq!(session.background(), Some(Rgba8::opaque(0, 0, 0)));
    session.finish();

    assert_eq!(viewer.state, INTERACTIVE);
    assert_eq!(viewer.offscreen, None);
    assert_eq!(viewer.offscreen_exits, 1);
}

#[test]
fn overlays_flag_keeps_overlays_and_transparent_drops_background() {
    let mut viewer = FlatViewer::new([0, 0, 0, 0]);
    let session = CaptureSession::begin(
        &mut viewer,
        SessionOpts {
            show_overlays: true,
            transparent: true,
            ..opts(2, 2)
        },
    )
    .unwrap();
    assert!(session.viewer().state.overlays_visible);
    assert!(session.viewer().state.debug_layers_visible);
    assert_eq!(session.background(), None);
}

#[test]
fn drop_restores_state_exactly_once() {
    let mut viewer = FlatViewer::new([0, 0, 0, 0]);
    {
        let _session = CaptureSession::begin(&mut viewer, opts(2, 2)).unwrap();
    }
    assert_eq!(viewer.state, INTERACTIVE);
    assert_eq!(viewer.offscreen_exits, 1);
    // One override at begin, one restore.
    assert_eq!(viewer.applied.len(), 2);
}

#[test]
fn zero_sized_session_is_rejected_before_touching_the_viewer() {
    let mut viewer = FlatViewer::new([0, 0, 0, 0]);
    let err = CaptureSession::begin(&mut viewer, opts(0, 2))
        .err()
        .unwrap();
    assert!(err.is_setup());
    assert!(viewer.applied.is_empty());
    assert_eq!(viewer.offscreen, None);
}

#[tokio::test]
async fn capture_composites_onto_background() {
    let mut viewer = FlatViewer::new([100, 0, 0, 100]);
    let mut session = CaptureSession::begin(&mut viewer, opts(2, 2)).unwrap();
    let frame = session.capture().await.unwrap();
    assert!(!frame.premultiplied);
    assert_eq!(frame.pixel(1, 1), [100, 0, 0, 255]);
}

#[tokio::test]
async fn blur_requires_an_accumulator() {
    let mut viewer = FlatViewer::new([1, 2, 3, 255]);
    let mut session = CaptureSession::begin(&mut viewer, opts(2, 2)).unwrap();
    assert!(session.begin_blur_group().is_err());
    assert!(session.accumulate().is_err());
    assert!(session.resolve_blur().is_err());
}

#[tokio::test]
async fn blur_averages_accumulated_captures() {
    let mut viewer = FlatViewer::new([10, 20, 30, 255]);
    let mut session = CaptureSession::begin(
        &mut viewer,
        SessionOpts {
            motion_blur: true,
            ..opts(2, 2)
        },
    )
    .unwrap();

    session.begin_blur_group().unwrap();
    for _ in 0..3 {
        session.capture().await.unwrap();
        session.accumulate().unwrap();
    }
    let frame = session.resolve_blur().unwrap();
    assert!(frame.data.chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[tokio::test]
async fn prepare_sorts_first_then_skips_static_pose() {
    let mut viewer = FlatViewer::new([0, 0, 0, 255]);
    let mut session = CaptureSession::begin(&mut viewer, opts(2, 2)).unwrap();

    let first = session.prepare(0.0, false).await;
    let second = session.prepare(0.5, false).await;
    assert!(matches!(first, PrepareOutcome::Sorted(r) if r.idle == 1));
    assert_eq!(second, PrepareOutcome::PoseUnchanged);
    assert_eq!(session.viewer().sorts, 1);
}
