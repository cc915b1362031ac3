//! The three export operations and the shared frame driver behind them.

pub(crate) mod driver;
pub(crate) mod plan;
pub(crate) mod settings;

use crate::capture::cancel::CancelFlag;
use crate::capture::session::{CaptureSession, SessionOpts};
use crate::config::CaptureOptions;
use crate::encode::image_file::StillImageSink;
use crate::encode::sequence::SequenceSink;
use crate::encode::sink::{EncodedArtifact, FrameSink, SinkConfig};
use crate::encode::still::StillEncoder;
use crate::encode::video::{VideoEncoder, VideoSink, VideoSinkOpts};
use crate::export::driver::drive;
use crate::export::plan::{ExportPlan, image_plan, sequence_plan, video_plan};
use crate::export::settings::{
    CaptureSettings, ImageExportSettings, SequenceExportSettings, VideoExportSettings,
};
use crate::foundation::core::Fps;
use crate::foundation::error::CaptureResult;
use crate::host::progress::{ExportKind, ExportStage, ProgressReporter, TracingProgress};
use crate::host::scene::Viewer;
use crate::host::storage::{Downloads, FrameDirectory};
use std::sync::Arc;

/// Entry point for image, video and sequence exports.
///
/// Each export validates its settings before touching the viewer, reports `started`, runs inside
/// an offscreen session, reports `failed` with the error message on any failure, restores the
/// renderer, and reports `finished`.
#[derive(Clone)]
pub struct Exporter {
    options: CaptureOptions,
    progress: Arc<dyn ProgressReporter>,
    cancel: CancelFlag,
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("options", &self.options)
            .field("cancel", &self.cancel)
            .finish_non_exhaustive()
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(CaptureOptions::default())
    }
}

impl Exporter {
    /// Exporter reporting progress through `tracing`.
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            options,
            progress: Arc::new(TracingProgress),
            cancel: CancelFlag::new(),
        }
    }

    /// Report progress to `progress` instead.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Share `cancel` with the host.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that stops running exports at the next frame boundary.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Capture one frame at the current time and save it as `<sourceName>-image.png`.
    #[tracing::instrument(skip_all, fields(
        width = settings.capture.width,
        height = settings.capture.height,
    ))]
    pub async fn export_image<V: Viewer + ?Sized>(
        &self,
        viewer: &mut V,
        settings: &ImageExportSettings,
        downloads: &mut dyn Downloads,
    ) -> CaptureResult<EncodedArtifact> {
        self.report(ExportKind::Image, async {
            settings.validate()?;
            let plan = image_plan(viewer.current_time());
            let cfg = sink_config(&settings.capture, viewer.timeline_fps(), &plan, viewer);
            let mut sink = StillImageSink::new(downloads);
            self.run(viewer, &settings.capture, &plan, &mut sink, cfg)
                .await
        })
        .await
    }

    /// Encode timeline frames `startFrame..=endFrame` as a video.
    #[tracing::instrument(skip_all, fields(
        container = ?settings.container,
        codec = ?settings.codec,
        start = settings.start_frame,
        end = settings.end_frame,
    ))]
    pub async fn export_video<V: Viewer + ?Sized>(
        &self,
        viewer: &mut V,
        settings: &VideoExportSettings,
        encoder: &mut dyn VideoEncoder,
    ) -> CaptureResult<EncodedArtifact> {
        self.report(ExportKind::Video, async {
            settings.validate()?;
            let fps = settings.fps()?;
            let plan = video_plan(settings.frame_range()?, viewer.timeline_fps(), fps)?;
            let cfg = sink_config(&settings.capture, fps, &plan, viewer);
            let mut sink = VideoSink::new(
                encoder,
                VideoSinkOpts {
                    container: settings.container,
                    codec: settings.codec,
                    bitrate: settings.bitrate,
                },
            );
            self.run(viewer, &settings.capture, &plan, &mut sink, cfg)
                .await
        })
        .await
    }

    /// Write timeline frames `startFrame..=endFrame` as numbered stills, blurred in groups of
    /// `motionBlurSamples`.
    pub async fn export_sequence<V: Viewer + ?Sized>(
        &self,
        viewer: &mut V,
        settings: &SequenceExportSettings,
        dir: &mut dyn FrameDirectory,
    ) -> CaptureResult<EncodedArtifact> {
        self.export_sequence_with(viewer, settings, dir, None).await
    }

    /// [`Exporter::export_sequence`] trying `accelerated` before the software still encoder.
    #[tracing::instrument(skip_all, fields(
        start = settings.start_frame,
        end = settings.end_frame,
        format = ?settings.format,
        blur = settings.blur_samples(),
    ))]
    pub async fn export_sequence_with<V: Viewer + ?Sized>(
        &self,
        viewer: &mut V,
        settings: &SequenceExportSettings,
        dir: &mut dyn FrameDirectory,
        accelerated: Option<Box<dyn StillEncoder>>,
    ) -> CaptureResult<EncodedArtifact> {
        self.report(ExportKind::Sequence, async {
            settings.validate()?;
            let timeline_fps = viewer.timeline_fps();
            let plan = sequence_plan(
                settings.frame_range()?,
                timeline_fps,
                settings.blur_samples(),
            )?;
            let cfg = sink_config(&settings.capture, timeline_fps, &plan, viewer);
            let mut sink = SequenceSink::new(dir, settings.still_format());
            if let Some(encoder) = accelerated {
                sink = sink.with_accelerated(encoder);
            }
            self.run(viewer, &settings.capture, &plan, &mut sink, cfg)
                .await
        })
        .await
    }

    async fn report<F>(&self, kind: ExportKind, export: F) -> CaptureResult<EncodedArtifact>
    where
        F: Future<Output = CaptureResult<EncodedArtifact>>,
    {
        self.progress.started(kind);
        let result = export.await;
        if let Err(e) = &result {
            self.progress.failed(&e.to_string());
        }
        self.progress.finished(kind);
        result
    }

    async fn run<V: Viewer + ?Sized>(
        &self,
        viewer: &mut V,
        capture: &CaptureSettings,
        plan: &ExportPlan,
        sink: &mut dyn FrameSink,
        cfg: SinkConfig,
    ) -> CaptureResult<EncodedArtifact> {
        self.cancel.check()?;
        let opts = SessionOpts {
            width: capture.width,
            height: capture.height,
            show_overlays: capture.show_overlays,
            transparent: capture.transparent,
            motion_blur: plan.needs_accumulator(),
            sort_timeout: self.options.sort_timeout(),
        };
        let mut session = CaptureSession::begin(viewer, opts)?;
        self.progress
            .progress(0.0, ExportStage::SessionActive, "offscreen session started");

        let result = drive(
            &mut session,
            plan,
            sink,
            cfg,
            &self.cancel,
            self.progress.as_ref(),
        )
        .await;
        session.finish();
        result
    }
}

fn sink_config<V: Viewer + ?Sized>(
    capture: &CaptureSettings,
    fps: Fps,
    plan: &ExportPlan,
    viewer: &V,
) -> SinkConfig {
    SinkConfig {
        width: capture.width,
        height: capture.height,
        fps,
        frame_count: plan.len() as u64,
        source_name: viewer.source_name(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/mod.rs"]
mod tests;
