use crate::capture::cancel::CancelFlag;
use crate::capture::session::CaptureSession;
use crate::encode::sink::{EncodedArtifact, FrameSink, SinkConfig};
use crate::export::plan::ExportPlan;
use crate::foundation::error::CaptureResult;
use crate::host::progress::{ExportStage, ProgressReporter};
use crate::host::scene::Viewer;

/// Run every planned frame through `prepare -> capture -> [accumulate] -> encode`.
///
/// Cancellation is checked before each render and before each hand-off to the sink. The sink
/// is not ended when the drive fails.
pub async fn drive<V: Viewer + ?Sized>(
    session: &mut CaptureSession<'_, V>,
    plan: &ExportPlan,
    sink: &mut dyn FrameSink,
    cfg: SinkConfig,
    cancel: &CancelFlag,
    progress: &dyn ProgressReporter,
) -> CaptureResult<EncodedArtifact> {
    sink.begin(cfg).await?;

    let total = plan.len().max(1) as f64;
    for (i, frame) in plan.frames.iter().enumerate() {
        let percent = 100.0 * i as f64 / total;
        let label = format!("frame {} of {}", i + 1, plan.len());
        let blurred = frame.is_blurred();
        if blurred {
            session.begin_blur_group()?;
        }

        for sample in &frame.samples {
            cancel.check()?;
            progress.progress(percent, ExportStage::PreparingFrame, &label);
            let outcome = session.prepare(sample.time_secs, sample.skip_sort).await;
            tracing::trace!(time = sample.time_secs, ?outcome, "prepared");

            progress.progress(percent, ExportStage::Capturing, &label);
            session.capture().await?;
            if sample.accumulate {
                progress.progress(percent, ExportStage::Accumulating, &label);
                session.accumulate()?;
            }
        }

        if blurred {
            session.resolve_blur()?;
        }
        cancel.check()?;
        progress.progress(percent, ExportStage::Encoding, &label);
        sink.push_frame(frame.index, session.frame()).await?;
    }

    progress.progress(100.0, ExportStage::Finalizing, "finalizing");
    sink.end().await
}

#[cfg(test)]
#[path = "../../tests/unit/export/driver.rs"]
mod tests;
