use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::frame::buffer::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Number of frames the export will push.
    pub frame_count: u64,
    /// Scene name used to derive file names.
    pub source_name: String,
}

/// What an export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedArtifact {
    /// Encoded bytes held in memory.
    InMemory(Vec<u8>),
    /// Bytes already written to a streaming destination.
    Streamed {
        /// Total container bytes forwarded.
        bytes_written: u64,
    },
    /// Files written through a storage capability, in write order.
    Files(Vec<String>),
}

/// Sink contract for consuming exported frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order, between
/// one `begin` and one `end`.
#[async_trait::async_trait]
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    async fn begin(&mut self, cfg: SinkConfig) -> CaptureResult<()>;
    /// Push one exported frame.
    async fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptureResult<()>;
    /// Called once after the last frame is pushed.
    async fn end(&mut self) -> CaptureResult<EncodedArtifact>;
}

/// Check frame order and size against the sink configuration.
pub(crate) fn check_frame(
    cfg: &SinkConfig,
    last: Option<FrameIndex>,
    idx: FrameIndex,
    frame: &FrameRGBA,
) -> CaptureResult<()> {
    if let Some(last) = last
        && idx.0 <= last.0
    {
        return Err(CaptureError::encode(format!(
            "sink received out-of-order frame index {} after {}",
            idx.0, last.0
        )));
    }
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(CaptureError::validation(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    Ok(())
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Return `true` once `end` has been called.
    pub fn ended(&self) -> bool {
        self.ended
    }
}

#[async_trait::async_trait]
impl FrameSink for InMemorySink {
    async fn begin(&mut self, cfg: SinkConfig) -> CaptureResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    async fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptureResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CaptureError::encode("in-memory sink not started"))?;
        check_frame(cfg, self.frames.last().map(|(i, _)| *i), idx, frame)?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    async fn end(&mut self) -> CaptureResult<EncodedArtifact> {
        self.ended = true;
        Ok(EncodedArtifact::InMemory(Vec::new()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
