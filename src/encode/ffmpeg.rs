use crate::encode::codec::{Container, VideoCodec};
use crate::encode::sink::EncodedArtifact;
use crate::encode::video::{VideoEncoder, VideoFrame, VideoTrack, timestamp_us};
use crate::foundation::core::Fps;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::host::storage::VideoOutput;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;

/// Fragmented MP4 flags: a moov up front and self-contained fragments, so bytes can stream.
const MP4_FRAGMENT_FLAGS: &str = "frag_keyframe+empty_moov+default_base_moof";

/// [`VideoEncoder`] that pipes raw RGBA frames into the system `ffmpeg`.
///
/// Container bytes are forwarded from `ffmpeg`'s stdout to the [`VideoOutput`] as they arrive.
/// MOV is the exception: fast-start needs a seekable file, so it is written to a temporary
/// directory and emitted whole at [`VideoEncoder::finalize`].
///
/// The raw input is constant frame rate (`-r`), so each frame's `timestamp_us` must equal
/// `round(1e6 * k / fps)` for its position `k`; anything else is rejected.
pub struct FfmpegEncoder {
    program: PathBuf,
    output: Option<VideoOutput>,
    fps: Option<Fps>,
    frames: u64,
    frame_len: usize,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    forward: Option<JoinHandle<CaptureResult<Forwarded>>>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    faststart: Option<FastStart>,
}

struct FastStart {
    _dir: tempfile::TempDir,
    path: PathBuf,
}

enum Forwarded {
    Buffered(Vec<u8>),
    Streamed {
        bytes_written: u64,
        writer: Box<dyn tokio::io::AsyncWrite + Send + Unpin>,
    },
}

impl FfmpegEncoder {
    /// Encode into `output` with the `ffmpeg` found on `PATH`.
    pub fn new(output: VideoOutput) -> Self {
        Self::with_program("ffmpeg", output)
    }

    /// Encode into `output` with the executable at `program`.
    pub fn with_program(program: impl Into<PathBuf>, output: VideoOutput) -> Self {
        Self {
            program: program.into(),
            output: Some(output),
            fps: None,
            frames: 0,
            frame_len: 0,
            child: None,
            stdin: None,
            forward: None,
            stderr_drain: None,
            faststart: None,
        }
    }

    /// Close stdin, reap the process and join the output and stderr tasks.
    async fn shut_down(&mut self) -> CaptureResult<Exit> {
        // Closing stdin ends the input stream; ffmpeg then writes the trailer and exits.
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| CaptureError::encode("ffmpeg encoder not started"))?;
        let status = child.wait().await.map_err(|e| {
            CaptureError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        let stderr = match self.stderr_drain.take() {
            Some(handle) => match handle.await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "ffmpeg stderr read failed");
                    Vec::new()
                }
                Err(_) => Vec::new(),
            },
            None => Vec::new(),
        };
        let forwarded = match self.forward.take() {
            Some(handle) => Some(
                handle
                    .await
                    .unwrap_or_else(|_| Err(CaptureError::encode("ffmpeg output task panicked"))),
            ),
            None => None,
        };
        Ok(Exit {
            status,
            stderr,
            forwarded,
        })
    }

    /// Turn a failed stdin write into the error that actually stopped the encode.
    async fn fail(&mut self, context: &str, err: std::io::Error) -> CaptureError {
        match self.shut_down().await {
            Ok(exit) => match exit.check() {
                Err(cause) => cause,
                Ok(_) => CaptureError::encode(format!("{context}: {err}")),
            },
            Err(e) => e,
        }
    }
}

struct Exit {
    status: ExitStatus,
    stderr: Vec<u8>,
    forwarded: Option<CaptureResult<Forwarded>>,
}

impl Exit {
    /// A failed output writer wins over the exit status it causes.
    fn check(self) -> CaptureResult<Option<Forwarded>> {
        let forwarded = self.forwarded.transpose()?;
        if !self.status.success() {
            let stderr = String::from_utf8_lossy(&self.stderr);
            return Err(CaptureError::encode(format!(
                "ffmpeg exited with status {}: {}",
                self.status,
                stderr.trim()
            )));
        }
        Ok(forwarded)
    }
}

/// Arguments for an `ffmpeg` invocation encoding `track` to `destination`.
pub fn ffmpeg_args(track: &VideoTrack, destination: &str) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
        "-s",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(format!("{}x{}", track.width, track.height));
    // Input rate goes before `-i` for rawvideo.
    args.push("-r".into());
    args.push(format!("{}/{}", track.fps.num, track.fps.den));
    args.extend(["-i", "pipe:0", "-an", "-c:v"].map(String::from));
    args.push(track.codec.ffmpeg_encoder.into());
    if let Some(profile) = track.codec.profile {
        args.push("-profile:v".into());
        args.push(profile.into());
    }
    if track.codec.family == VideoCodec::H265
        && matches!(track.container, Container::Mp4 | Container::Mov)
    {
        args.extend(["-tag:v", "hvc1"].map(String::from));
    }
    args.extend(["-pix_fmt", "yuv420p", "-b:v"].map(String::from));
    args.push(track.bitrate.to_string());
    args.push("-metadata:s:v:0".into());
    args.push(format!("rotate={}", track.rotation));
    match track.container {
        Container::Mp4 => args.extend(["-movflags", MP4_FRAGMENT_FLAGS].map(String::from)),
        Container::Mov => args.extend(["-movflags", "+faststart"].map(String::from)),
        Container::Webm | Container::Mkv => {}
    }
    args.push("-f".into());
    args.push(track.container.ffmpeg_muxer().into());
    args.push(destination.into());
    args
}

#[async_trait::async_trait]
impl VideoEncoder for FfmpegEncoder {
    #[tracing::instrument(skip_all, fields(codec = track.codec.identifier))]
    async fn configure(&mut self, track: &VideoTrack) -> CaptureResult<()> {
        if self.child.is_some() {
            return Err(CaptureError::encode("ffmpeg encoder is already configured"));
        }
        let output = self
            .output
            .take()
            .ok_or_else(|| CaptureError::encode("ffmpeg encoder output already consumed"))?;

        let (destination, faststart) = if track.container == Container::Mov {
            let dir = tempfile::tempdir()?;
            let path = dir.path().join("faststart.mov");
            let destination = path.to_string_lossy().into_owned();
            (destination, Some(FastStart { _dir: dir, path }))
        } else {
            ("pipe:1".to_string(), None)
        };

        let mut cmd = Command::new(&self.program);
        cmd.args(ffmpeg_args(track, &destination))
            .stdin(Stdio::piped())
            .stdout(if faststart.is_some() {
                Stdio::null()
            } else {
                Stdio::piped()
            })
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        tracing::debug!(program = %self.program.display(), ?destination, "spawning ffmpeg");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.output = Some(output);
                return Err(CaptureError::unsupported(format!(
                    "video encoding requires ffmpeg, but '{}' was not found",
                    self.program.display()
                )));
            }
            Err(e) => {
                self.output = Some(output);
                return Err(CaptureError::encode(format!("failed to spawn ffmpeg: {e}")));
            }
        };
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CaptureError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CaptureError::encode("failed to open ffmpeg stderr (unexpected)"))?;
        self.stderr_drain = Some(tokio::spawn(async move {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes).await?;
            Ok(bytes)
        }));

        if faststart.is_some() {
            self.output = Some(output);
        } else {
            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| CaptureError::encode("failed to open ffmpeg stdout (unexpected)"))?;
            self.forward = Some(tokio::spawn(forward_stdout(stdout, output)));
        }

        self.frame_len = (track.width as usize) * (track.height as usize) * 4;
        self.fps = Some(track.fps);
        self.frames = 0;
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.faststart = faststart;
        Ok(())
    }

    async fn encode(&mut self, frame: VideoFrame<'_>) -> CaptureResult<()> {
        let Some(fps) = self.fps.filter(|_| self.stdin.is_some()) else {
            return Err(CaptureError::encode("ffmpeg encoder is not open"));
        };
        if frame.data.len() != self.frame_len {
            return Err(CaptureError::validation(format!(
                "video frame is {} bytes, expected {}",
                frame.data.len(),
                self.frame_len
            )));
        }
        let expected = timestamp_us(self.frames, fps);
        if frame.timestamp_us != expected {
            return Err(CaptureError::unsupported(format!(
                "ffmpeg input is constant frame rate: frame {} has pts {}us, expected {expected}us",
                self.frames, frame.timestamp_us
            )));
        }

        let written = match self.stdin.as_mut() {
            Some(stdin) => stdin.write_all(frame.data).await,
            None => return Err(CaptureError::encode("ffmpeg encoder is not open")),
        };
        if let Err(e) = written {
            return Err(self.fail("failed to write frame to ffmpeg stdin", e).await);
        }
        self.frames += 1;
        Ok(())
    }

    async fn flush(&mut self) -> CaptureResult<()> {
        let flushed = match self.stdin.as_mut() {
            Some(stdin) => stdin.flush().await,
            None => return Ok(()),
        };
        if let Err(e) = flushed {
            return Err(self.fail("failed to flush ffmpeg stdin", e).await);
        }
        Ok(())
    }

    async fn finalize(&mut self) -> CaptureResult<EncodedArtifact> {
        let forwarded = self.shut_down().await?.check()?;

        match (forwarded, self.faststart.take()) {
            (Some(Forwarded::Buffered(bytes)), _) => Ok(EncodedArtifact::InMemory(bytes)),
            (Some(Forwarded::Streamed { bytes_written, mut writer }), _) => {
                writer.shutdown().await?;
                Ok(EncodedArtifact::Streamed { bytes_written })
            }
            (None, Some(faststart)) => {
                let bytes = tokio::fs::read(&faststart.path).await?;
                match self.output.take() {
                    Some(VideoOutput::Stream(mut writer)) => {
                        writer.write_all(&bytes).await?;
                        writer.shutdown().await?;
                        Ok(EncodedArtifact::Streamed {
                            bytes_written: bytes.len() as u64,
                        })
                    }
                    Some(VideoOutput::InMemory) | None => Ok(EncodedArtifact::InMemory(bytes)),
                }
            }
            (None, None) => Err(CaptureError::encode("ffmpeg produced no output")),
        }
    }
}

async fn forward_stdout(
    mut stdout: tokio::process::ChildStdout,
    output: VideoOutput,
) -> CaptureResult<Forwarded> {
    match output {
        VideoOutput::InMemory => {
            let mut bytes = Vec::new();
            stdout.read_to_end(&mut bytes).await?;
            Ok(Forwarded::Buffered(bytes))
        }
        VideoOutput::Stream(mut writer) => {
            let bytes_written = tokio::io::copy(&mut stdout, &mut writer).await?;
            Ok(Forwarded::Streamed {
                bytes_written,
                writer,
            })
        }
    }
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub async fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
