//! viewcap captures frames from an interactive 3D viewer and exports them as a PNG still, an
//! encoded video or a numbered image sequence, with optional motion blur.
//!
//! The viewer is reached through the [`Renderer`] and [`Scene`] traits. An [`Exporter`] owns an
//! offscreen [`CaptureSession`] for the duration of one export and drives every planned frame
//! through `prepare -> capture -> [accumulate] -> encode` into a [`FrameSink`]:
//!
//! - [`Exporter::export_image`] saves `<sourceName>-image.png` through [`Downloads`]
//! - [`Exporter::export_video`] feeds a [`VideoEncoder`] such as [`FfmpegEncoder`]
//! - [`Exporter::export_sequence`] writes `frame_NNNNNN.{png,jpg}` into a [`FrameDirectory`]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod capture;
mod encode;
mod export;
mod foundation;
mod frame;
mod host;

/// Tool configuration.
pub mod config;
/// Tracing subscriber setup.
pub mod logging;
/// CPU reference viewer.
pub mod synthetic;

pub use crate::foundation::core::{Canvas, CameraPose, Fps, FrameIndex, FrameRange, Rgba8};
pub use crate::foundation::error::{CaptureError, CaptureResult};

pub use crate::frame::accumulate::MotionBlurAccumulator;
pub use crate::frame::buffer::FrameRGBA;
pub use crate::frame::composite::flatten_premul_over_bg_in_place;
pub use crate::frame::flip::{RowOrigin, flip_rows_in_place};

pub use crate::host::progress::{
    ExportKind, ExportStage, NoopProgress, ProgressEvent, ProgressReporter, RecordingProgress,
    TracingProgress,
};
pub use crate::host::renderer::{PixelRect, RenderSignal, Renderer, RendererState};
pub use crate::host::scene::{PointCloudId, Scene, SortSignal, Viewer};
pub use crate::host::storage::{Downloads, FrameDirectory, FsDirectory, MemoryFiles, VideoOutput};

pub use crate::capture::cancel::CancelFlag;
pub use crate::capture::grab::capture_frame;
pub use crate::capture::prepare::{
    FramePreparer, PrepareOutcome, SORT_FALLBACK_TIMEOUT, SortReport,
};
pub use crate::capture::session::{CaptureSession, SessionOpts};

pub use crate::encode::codec::{Container, ResolvedCodec, VideoCodec, resolve, resolve_for};
pub use crate::encode::ffmpeg::{FfmpegEncoder, ffmpeg_args, is_ffmpeg_on_path};
pub use crate::encode::image_file::{StillImageSink, still_file_name};
pub use crate::encode::sequence::{SequenceSink, frame_file_name};
pub use crate::encode::sink::{EncodedArtifact, FrameSink, InMemorySink, SinkConfig};
pub use crate::encode::still::{
    DEFAULT_JPEG_QUALITY, ImageFormat, SoftwareStillEncoder, StillEncoder, StillFormat,
    encode_jpeg, encode_png, jpeg_quality_percent,
};
pub use crate::encode::video::{
    VideoEncoder, VideoFrame, VideoSink, VideoSinkOpts, VideoTrack, frame_duration_us,
    timestamp_us, validate_video_output,
};

pub use crate::export::Exporter;
pub use crate::export::driver::drive;
pub use crate::export::plan::{
    ExportPlan, PlannedFrame, PlannedSample, blur_group, image_plan, sequence_plan, video_plan,
};
pub use crate::export::settings::{
    CaptureSettings, ImageExportSettings, SequenceExportSettings, VideoExportSettings,
};
