use crate::foundation::core::{CameraPose, Fps};
use tokio::sync::oneshot;

/// Identifies one point-cloud element of the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointCloudId(pub u32);

/// Answer to a depth-sort request.
#[derive(Debug)]
pub enum SortSignal {
    /// The sorter is working; the receiver fires when the new order is in place.
    ///
    /// Some engines never fire when the sort turns out to be a no-op, so waiters race this
    /// against a timeout.
    Pending(oneshot::Receiver<()>),
    /// The sorter reports it is idle: the current order is already valid.
    Idle,
}

/// Scene capabilities: timeline, camera and point-cloud sorting.
pub trait Scene: Send {
    /// Name used to derive output file names.
    fn source_name(&self) -> String;

    /// Current timeline position in seconds.
    fn current_time(&self) -> f64;

    /// Frame rate of the scene's animation timeline.
    fn timeline_fps(&self) -> Fps;

    /// Move the timeline to `seconds`.
    fn set_time(&mut self, seconds: f64);

    /// Advance camera controllers by `dt` seconds (0 applies pending state immediately).
    fn update_camera(&mut self, dt: f64);

    /// Current camera pose.
    fn camera_pose(&self) -> CameraPose;

    /// Point clouds that currently contribute to the image.
    fn visible_point_clouds(&self) -> Vec<PointCloudId>;

    /// Ask one point cloud to re-sort for the current camera.
    fn request_sort(&mut self, cloud: PointCloudId) -> SortSignal;
}

/// A viewer exposes both rendering and scene capabilities.
pub trait Viewer: super::renderer::Renderer + Scene {}

impl<T: super::renderer::Renderer + Scene + ?Sized> Viewer for T {}
