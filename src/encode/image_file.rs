use crate::encode::sink::{EncodedArtifact, FrameSink, SinkConfig, check_frame};
use crate::encode::still::encode_png;
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::frame::buffer::FrameRGBA;
use crate::host::storage::Downloads;

/// Download name for a still export of `source_name`.
pub fn still_file_name(source_name: &str) -> String {
    format!("{source_name}-image.png")
}

/// Sink that encodes a single frame as PNG and saves it through [`Downloads`].
pub struct StillImageSink<'a> {
    downloads: &'a mut dyn Downloads,
    cfg: Option<SinkConfig>,
    saved: Option<String>,
}

impl<'a> StillImageSink<'a> {
    /// Save into `downloads`.
    pub fn new(downloads: &'a mut dyn Downloads) -> Self {
        Self {
            downloads,
            cfg: None,
            saved: None,
        }
    }
}

#[async_trait::async_trait]
impl FrameSink for StillImageSink<'_> {
    async fn begin(&mut self, cfg: SinkConfig) -> CaptureResult<()> {
        if cfg.frame_count != 1 {
            return Err(CaptureError::validation(format!(
                "still image export takes exactly one frame, got {}",
                cfg.frame_count
            )));
        }
        self.cfg = Some(cfg);
        self.saved = None;
        Ok(())
    }

    async fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptureResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CaptureError::encode("still image sink not started"))?;
        if self.saved.is_some() {
            return Err(CaptureError::encode("still image sink already holds a frame"));
        }
        check_frame(cfg, None, idx, frame)?;

        let bytes = encode_png(frame.canvas(), &frame.data)?;
        let name = still_file_name(&cfg.source_name);
        self.downloads.save(&name, &bytes).await?;
        tracing::info!(file = %name, bytes = bytes.len(), "saved still image");
        self.saved = Some(name);
        Ok(())
    }

    async fn end(&mut self) -> CaptureResult<EncodedArtifact> {
        let name = self
            .saved
            .take()
            .ok_or_else(|| CaptureError::encode("still image sink received no frame"))?;
        self.cfg = None;
        Ok(EncodedArtifact::Files(vec![name]))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/image_file.rs"]
mod tests;
