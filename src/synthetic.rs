//! Deterministic CPU viewer used by the CLI and the test suite.
//!
//! It draws a ring of translucent point splats seen from an orbiting camera into a
//! premultiplied RGBA8 target stored bottom row first, which is what a GPU readback returns.

use crate::foundation::core::{CameraPose, Fps, Rgba8};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::mul_div255_u16;
use crate::host::renderer::{PixelRect, RenderSignal, Renderer, RendererState};
use crate::host::scene::{PointCloudId, Scene, SortSignal};
use tokio::sync::oneshot;

/// How the synthetic sorter answers sort requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBehavior {
    /// Fire the completion signal immediately.
    #[default]
    Signal,
    /// Never fire; waiters fall back to their timeout.
    Silent,
    /// Report an idle sorter.
    Idle,
}

/// One colored disk in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Splat {
    /// World-space center.
    pub position: [f32; 3],
    /// World-space radius.
    pub radius: f32,
    /// Straight-alpha color.
    pub color: Rgba8,
}

/// CPU stand-in for an interactive point-cloud viewer.
#[derive(Debug)]
pub struct SyntheticViewer {
    name: String,
    timeline_fps: Fps,
    time: f64,
    orbit_period_secs: f64,
    orbit_radius: f32,
    pose: CameraPose,
    background: Rgba8,
    state: RendererState,
    interactive_size: (u32, u32),
    offscreen: Option<(u32, u32)>,
    target: Vec<u8>,
    target_size: (u32, u32),
    splats: Vec<Splat>,
    sort_behavior: SortBehavior,
    held_sorts: Vec<oneshot::Sender<()>>,
    renders: u64,
    sort_requests: u64,
}

const CLOUD: PointCloudId = PointCloudId(0);

impl SyntheticViewer {
    /// Viewer named `name` with the default splat ring, a 4 second orbit and a 30 fps timeline.
    pub fn new(name: impl Into<String>) -> Self {
        let orbit_radius = 4.0;
        Self {
            name: name.into(),
            timeline_fps: Fps { num: 30, den: 1 },
            time: 0.0,
            orbit_period_secs: 4.0,
            orbit_radius,
            pose: orbit_pose(0.0, 4.0, orbit_radius),
            background: Rgba8::opaque(24, 26, 32),
            state: RendererState {
                overlays_visible: true,
                debug_layers_visible: true,
                clear_color: Rgba8::opaque(24, 26, 32),
            },
            interactive_size: (320, 180),
            offscreen: None,
            target: Vec::new(),
            target_size: (0, 0),
            splats: default_splats(),
            sort_behavior: SortBehavior::default(),
            held_sorts: Vec::new(),
            renders: 0,
            sort_requests: 0,
        }
    }

    /// Seconds per camera revolution; `0` keeps the camera still.
    pub fn with_orbit_period(mut self, secs: f64) -> Self {
        self.orbit_period_secs = secs.max(0.0);
        self.pose = orbit_pose(self.time, self.orbit_period_secs, self.orbit_radius);
        self
    }

    /// Timeline frame rate.
    pub fn with_timeline_fps(mut self, fps: Fps) -> Self {
        self.timeline_fps = fps;
        self
    }

    /// Scene background color.
    pub fn with_background(mut self, color: Rgba8) -> Self {
        self.background = color;
        self.state.clear_color = color;
        self
    }

    /// Replace the splats.
    pub fn with_splats(mut self, splats: Vec<Splat>) -> Self {
        self.splats = splats;
        self
    }

    /// Sorter behavior.
    pub fn with_sort_behavior(mut self, behavior: SortBehavior) -> Self {
        self.sort_behavior = behavior;
        self
    }

    /// Renders performed so far.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// Sort requests received so far.
    pub fn sort_requests(&self) -> u64 {
        self.sort_requests
    }

    /// Return `true` while an offscreen session is active.
    pub fn is_offscreen(&self) -> bool {
        self.offscreen.is_some()
    }

    fn active_size(&self) -> (u32, u32) {
        self.offscreen.unwrap_or(self.interactive_size)
    }

    fn render(&mut self) {
        let (w, h) = self.active_size();
        let len = w as usize * h as usize * 4;
        self.target.resize(len, 0);
        self.target_size = (w, h);

        let clear = premultiply(self.state.clear_color);
        for px in self.target.chunks_exact_mut(4) {
            px.copy_from_slice(&clear);
        }

        let basis = CameraBasis::new(self.pose);
        let focal = h as f32;
        let mut visible: Vec<(f32, &Splat)> = self
            .splats
            .iter()
            .filter_map(|s| basis.depth(s.position).map(|z| (z, s)))
            .collect();
        // Back to front for correct translucency.
        visible.sort_by(|a, b| b.0.total_cmp(&a.0));

        for (z, splat) in visible {
            let (x, y) = basis.project(splat.position, z);
            let cx = w as f32 * 0.5 + x * focal;
            let cy = h as f32 * 0.5 + y * focal;
            let r = splat.radius / z * focal;
            fill_disk(&mut self.target, w, h, cx, cy, r, premultiply(splat.color));
        }

        if self.state.overlays_visible {
            draw_border(&mut self.target, w, h, [255, 255, 255, 255]);
        }
        if self.state.debug_layers_visible {
            // Top-left corner marker; rows are stored bottom first.
            for y in h.saturating_sub(2)..h {
                for x in 0..w.min(2) {
                    put(&mut self.target, w, x, y, [255, 0, 255, 255]);
                }
            }
        }
        self.renders += 1;
    }
}

#[async_trait::async_trait]
impl Renderer for SyntheticViewer {
    fn renderer_state(&self) -> RendererState {
        self.state
    }

    fn apply_renderer_state(&mut self, state: RendererState) {
        self.state = state;
    }

    fn background_color(&self) -> Rgba8 {
        self.background
    }

    fn begin_offscreen(&mut self, width: u32, height: u32) -> CaptureResult<()> {
        if self.offscreen.is_some() {
            return Err(CaptureError::render("offscreen session already active"));
        }
        if width == 0 || height == 0 {
            return Err(CaptureError::validation("offscreen target must be non-empty"));
        }
        self.offscreen = Some((width, height));
        Ok(())
    }

    fn end_offscreen(&mut self) {
        self.offscreen = None;
    }

    fn request_render(&mut self) -> RenderSignal {
        self.render();
        let (tx, signal) = RenderSignal::channel();
        let _ = tx.send(());
        signal
    }

    async fn read_pixels(&mut self, rect: PixelRect, dst: &mut [u8]) -> CaptureResult<()> {
        let (w, h) = self.target_size;
        if rect.x.saturating_add(rect.width) > w || rect.y.saturating_add(rect.height) > h {
            return Err(CaptureError::render(format!(
                "readback rect {rect:?} outside {w}x{h} target"
            )));
        }
        let row_len = rect.width as usize * 4;
        if dst.len() != row_len * rect.height as usize {
            return Err(CaptureError::render(format!(
                "readback buffer is {} bytes, rect needs {}",
                dst.len(),
                row_len * rect.height as usize
            )));
        }
        for (i, out) in dst.chunks_exact_mut(row_len).enumerate() {
            let start = ((rect.y as usize + i) * w as usize + rect.x as usize) * 4;
            out.copy_from_slice(&self.target[start..start + row_len]);
        }
        Ok(())
    }
}

impl Scene for SyntheticViewer {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn timeline_fps(&self) -> Fps {
        self.timeline_fps
    }

    fn set_time(&mut self, seconds: f64) {
        self.time = seconds;
    }

    fn update_camera(&mut self, _dt: f64) {
        self.pose = orbit_pose(self.time, self.orbit_period_secs, self.orbit_radius);
    }

    fn camera_pose(&self) -> CameraPose {
        self.pose
    }

    fn visible_point_clouds(&self) -> Vec<PointCloudId> {
        if self.splats.is_empty() {
            Vec::new()
        } else {
            vec![CLOUD]
        }
    }

    fn request_sort(&mut self, _cloud: PointCloudId) -> SortSignal {
        self.sort_requests += 1;
        match self.sort_behavior {
            SortBehavior::Idle => SortSignal::Idle,
            SortBehavior::Signal => {
                let (tx, rx) = oneshot::channel();
                let _ = tx.send(());
                SortSignal::Pending(rx)
            }
            SortBehavior::Silent => {
                let (tx, rx) = oneshot::channel();
                self.held_sorts.push(tx);
                SortSignal::Pending(rx)
            }
        }
    }
}

fn default_splats() -> Vec<Splat> {
    let palette = [
        Rgba8::new(230, 80, 70, 200),
        Rgba8::new(80, 200, 120, 160),
        Rgba8::new(70, 130, 230, 220),
        Rgba8::new(240, 200, 60, 128),
        Rgba8::new(200, 90, 220, 180),
        Rgba8::new(90, 220, 230, 255),
    ];
    (0..12)
        .map(|i| {
            let a = i as f32 / 12.0 * std::f32::consts::TAU;
            Splat {
                position: [a.cos() * 1.2, ((i % 3) as f32 - 1.0) * 0.35, a.sin() * 1.2],
                radius: 0.28,
                color: palette[i % palette.len()],
            }
        })
        .collect()
}

fn orbit_pose(time: f64, period: f64, radius: f32) -> CameraPose {
    let angle = if period > 0.0 {
        (time / period * std::f64::consts::TAU) as f32
    } else {
        0.0
    };
    let position = [radius * angle.sin(), 0.6, radius * angle.cos()];
    CameraPose {
        position,
        forward: normalize([-position[0], -position[1], -position[2]]),
    }
}

struct CameraBasis {
    position: [f32; 3],
    forward: [f32; 3],
    right: [f32; 3],
    up: [f32; 3],
}

impl CameraBasis {
    const NEAR: f32 = 0.05;

    fn new(pose: CameraPose) -> Self {
        let right = normalize(cross(pose.forward, [0.0, 1.0, 0.0]));
        let up = cross(right, pose.forward);
        Self {
            position: pose.position,
            forward: pose.forward,
            right,
            up,
        }
    }

    fn depth(&self, p: [f32; 3]) -> Option<f32> {
        let z = dot(sub(p, self.position), self.forward);
        (z > Self::NEAR).then_some(z)
    }

    fn project(&self, p: [f32; 3], z: f32) -> (f32, f32) {
        let d = sub(p, self.position);
        (dot(d, self.right) / z, dot(d, self.up) / z)
    }
}

fn premultiply(c: Rgba8) -> [u8; 4] {
    let a = u16::from(c.a);
    [
        mul_div255_u16(u16::from(c.r), a) as u8,
        mul_div255_u16(u16::from(c.g), a) as u8,
        mul_div255_u16(u16::from(c.b), a) as u8,
        c.a,
    ]
}

fn put(target: &mut [u8], w: u32, x: u32, y: u32, px: [u8; 4]) {
    let i = (y as usize * w as usize + x as usize) * 4;
    target[i..i + 4].copy_from_slice(&px);
}

/// Premultiplied source-over.
fn blend(target: &mut [u8], w: u32, x: u32, y: u32, src: [u8; 4]) {
    let i = (y as usize * w as usize + x as usize) * 4;
    let inv = 255 - u16::from(src[3]);
    for (d, &s) in target[i..i + 4].iter_mut().zip(&src) {
        let v = u16::from(s) + mul_div255_u16(u16::from(*d), inv);
        *d = v.min(255) as u8;
    }
}

fn fill_disk(target: &mut [u8], w: u32, h: u32, cx: f32, cy: f32, r: f32, src: [u8; 4]) {
    if r <= 0.0 {
        return;
    }
    let x0 = (cx - r).floor().max(0.0) as u32;
    let y0 = (cy - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil().max(0.0) as u32).min(w);
    let y1 = ((cy + r).ceil().max(0.0) as u32).min(h);
    let r2 = r * r;
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                blend(target, w, x, y, src);
            }
        }
    }
}

fn draw_border(target: &mut [u8], w: u32, h: u32, px: [u8; 4]) {
    for x in 0..w {
        put(target, w, x, 0, px);
        put(target, w, x, h - 1, px);
    }
    for y in 0..h {
        put(target, w, 0, y, px);
        put(target, w, w - 1, y, px);
    }
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(v, v).sqrt();
    if len > 0.0 {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        v
    }
}

#[cfg(test)]
#[path = "../tests/unit/synthetic.rs"]
mod tests;
