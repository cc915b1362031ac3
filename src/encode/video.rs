use crate::encode::codec::{Container, ResolvedCodec, VideoCodec, resolve_for};
use crate::encode::sink::{EncodedArtifact, FrameSink, SinkConfig, check_frame};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::frame::buffer::FrameRGBA;

/// Presentation timestamp of output frame `k`, in microseconds.
pub fn timestamp_us(k: u64, fps: Fps) -> i64 {
    (1e6 * (k as f64) / fps.as_f64()).round() as i64
}

/// Duration of one output frame, in microseconds.
pub fn frame_duration_us(fps: Fps) -> i64 {
    (1e6 / fps.as_f64()).round() as i64
}

/// Track parameters handed to a [`VideoEncoder`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoTrack {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Track frame rate.
    pub fps: Fps,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
    /// Output container.
    pub container: Container,
    /// Resolved codec.
    pub codec: ResolvedCodec,
    /// Rotation metadata in degrees.
    pub rotation: u16,
}

/// One raw RGBA frame with its timing.
#[derive(Clone, Copy, Debug)]
pub struct VideoFrame<'f> {
    /// `width * height * 4` RGBA bytes, top row first.
    pub data: &'f [u8],
    /// Presentation timestamp in microseconds.
    pub timestamp_us: i64,
    /// Frame duration in microseconds.
    pub duration_us: i64,
}

/// Pluggable video encoder plus container writer.
///
/// Call order: `configure`, `encode` per frame, `flush`, `finalize`. Errors from any step are
/// fatal to the export, and `finalize` is not called after one.
///
/// [`VideoSink`] feeds frames at a constant rate: frame `k` carries
/// `timestamp_us(k, track.fps)` and `frame_duration_us(track.fps)`.
#[async_trait::async_trait]
pub trait VideoEncoder: Send {
    /// Open the encoder and container for `track`.
    async fn configure(&mut self, track: &VideoTrack) -> CaptureResult<()>;
    /// Encode one frame. May wait for encoder backpressure.
    async fn encode(&mut self, frame: VideoFrame<'_>) -> CaptureResult<()>;
    /// Drain frames still queued in the encoder.
    async fn flush(&mut self) -> CaptureResult<()>;
    /// Finish the container and release the encoder.
    async fn finalize(&mut self) -> CaptureResult<EncodedArtifact>;
}

/// Container, codec and bitrate for a [`VideoSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoSinkOpts {
    /// Output container.
    pub container: Container,
    /// Codec family.
    pub codec: VideoCodec,
    /// Target bitrate in bits per second.
    pub bitrate: u64,
}

/// Validate output geometry and rate for video encoding.
pub fn validate_video_output(
    width: u32,
    height: u32,
    fps: Fps,
    bitrate: u64,
) -> CaptureResult<()> {
    if width == 0 || height == 0 {
        return Err(CaptureError::validation(
            "video width/height must be non-zero",
        ));
    }
    if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
        return Err(CaptureError::validation(
            "video width/height must be even (required for yuv420p output)",
        ));
    }
    fps.validate()?;
    if bitrate == 0 {
        return Err(CaptureError::validation("video bitrate must be > 0"));
    }
    Ok(())
}

/// Sink that timestamps frames and streams them into a [`VideoEncoder`].
pub struct VideoSink<'e> {
    encoder: &'e mut dyn VideoEncoder,
    opts: VideoSinkOpts,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    last_ts: Option<i64>,
}

impl<'e> VideoSink<'e> {
    /// Feed `encoder` with `opts`.
    pub fn new(encoder: &'e mut dyn VideoEncoder, opts: VideoSinkOpts) -> Self {
        Self {
            encoder,
            opts,
            cfg: None,
            last_idx: None,
            last_ts: None,
        }
    }
}

#[async_trait::async_trait]
impl FrameSink for VideoSink<'_> {
    async fn begin(&mut self, cfg: SinkConfig) -> CaptureResult<()> {
        validate_video_output(cfg.width, cfg.height, cfg.fps, self.opts.bitrate)?;
        let codec = resolve_for(self.opts.container, self.opts.codec, cfg.height)?;
        let track = VideoTrack {
            width: cfg.width,
            height: cfg.height,
            fps: cfg.fps,
            bitrate: self.opts.bitrate,
            container: self.opts.container,
            codec,
            rotation: 0,
        };
        tracing::info!(
            codec = track.codec.identifier,
            container = track.container.extension(),
            width = track.width,
            height = track.height,
            fps = track.fps.as_f64(),
            bitrate = track.bitrate,
            "configuring video encoder"
        );
        self.encoder.configure(&track).await?;
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.last_ts = None;
        Ok(())
    }

    async fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> CaptureResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| CaptureError::encode("video sink not started"))?;
        check_frame(cfg, self.last_idx, idx, frame)?;

        let ts = timestamp_us(idx.0, cfg.fps);
        if let Some(last) = self.last_ts
            && ts <= last
        {
            return Err(CaptureError::encode(format!(
                "non-increasing video timestamp {ts}us after {last}us"
            )));
        }
        self.encoder
            .encode(VideoFrame {
                data: &frame.data,
                timestamp_us: ts,
                duration_us: frame_duration_us(cfg.fps),
            })
            .await?;
        self.last_idx = Some(idx);
        self.last_ts = Some(ts);
        Ok(())
    }

    async fn end(&mut self) -> CaptureResult<EncodedArtifact> {
        if self.cfg.take().is_none() {
            return Err(CaptureError::encode("video sink not started"));
        }
        self.encoder.flush().await?;
        self.encoder.finalize().await
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/video.rs"]
mod tests;
