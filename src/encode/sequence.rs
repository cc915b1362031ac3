use crate::encode::sink::{EncodedArtifact, FrameSink, SinkConfig, check_frame};
use crate::encode::still::{SoftwareStillEncoder, StillEncoder, StillFormat};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::frame::buffer::FrameRGBA;
use crate::frame::flip::{RowOrigin, flip_rows_in_place};
use crate::host::storage::FrameDirectory;

/// `frame_NNNNNN.ext` for export frame `idx`.
pub fn frame_file_name(idx: FrameIndex, format: StillFormat) -> String {
    format!("frame_{:06}.{}", idx.0, format.extension())
}

/// Sink that writes every exported frame as its own still file.
///
/// Each write is awaited before the next frame is accepted, which bounds memory to one encoded
/// frame. An optional accelerated encoder is tried first; any failure falls back to
/// [`SoftwareStillEncoder`] for that frame.
pub struct SequenceSink<'a> {
    dir: &'a mut dyn FrameDirectory,
    format: StillFormat,
    accelerated: Option<Box<dyn StillEncoder>>,
    software: SoftwareStillEncoder,
    staging: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    written: Vec<String>,
    fallbacks: u64,
}

impl<'a> SequenceSink<'a> {
    /// Write `format` stills into `dir`.
    pub fn new(dir: &'a mut dyn FrameDirectory, format: StillFormat) -> Self {
        Self {
            dir,
            format,
            accelerated: None,
            software: SoftwareStillEncoder,
            staging: Vec::new(),
            cfg: None,
            last_idx: None,
            written: Vec::new(),
            fallbacks: 0,
        }
    }

    /// Try `encoder` before the software path.
    pub fn with_accelerated(mut self, encoder: Box<dyn StillEncoder>) -> Self {
        self.accelerated = Some(encoder);
        self
    }

    /// Frames that fell back to the software encoder.
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }

    async fn encode(&mut self, frame: &FrameRGBA) -> CaptureResult<Vec<u8>> {
        if let Some(accel) = self.accelerated.as_mut()
            && accel.supports(self.format)
        {
            let data: &[u8] = match accel.row_origin() {
                RowOrigin::TopLeft => &frame.data,
                RowOrigin::BottomLeft => {
                    self.staging.clear();
                    self.staging.extend_from_slice(&frame.data);
                    flip_rows_in_place(&mut self.staging, frame.width, frame.height)?;
                    &self.staging
                }
            };
            match accel.encode(frame.canvas(), data, self.format).await {
                Ok(bytes) => return Ok(bytes),
                Err(e) => {
                    self.fallbacks += 1;
                    tracing::warn!(
                        encoder = accel.name(),
                        error = %e,
                        "accelerated still encoder failed; using software encoder"
                    );
                }
            }
        }
        self.software
            .encode(frame.canvas(), &frame.data, self.format)
            .await
    }
}

#[async_trait::async_trait]
impl FrameSink for SequenceSink<'_> {
    async fn begin(&mut self, cfg: SinkConfig) -> CaptureResult<()> {
        self.staging = Vec::with_capacity(cfg.width as usize * cfg.height as usize * 4);
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.written.clear();
        self.fallbacks = 0;
        Ok(())
    }

    async fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptureResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CaptureError::encode("sequence sink not started"))?;
        check_frame(cfg, self.last_idx, idx, frame)?;

        let bytes = self.encode(frame).await?;
        let name = frame_file_name(idx, self.format);
        self.dir.write_file(&name, bytes).await?;
        tracing::debug!(file = %name, "wrote sequence frame");
        self.last_idx = Some(idx);
        self.written.push(name);
        Ok(())
    }

    async fn end(&mut self) -> CaptureResult<EncodedArtifact> {
        if self.cfg.take().is_none() {
            return Err(CaptureError::encode("sequence sink not started"));
        }
        tracing::info!(
            frames = self.written.len(),
            fallbacks = self.fallbacks,
            "image sequence written"
        );
        Ok(EncodedArtifact::Files(std::mem::take(&mut self.written)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sequence.rs"]
mod tests;
