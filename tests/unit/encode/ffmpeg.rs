use super::*;
use crate::encode::codec::resolve;
use crate::encode::video::timestamp_us;
use crate::foundation::core::Fps;

fn track(container: Container, codec: VideoCodec) -> VideoTrack {
    VideoTrack {
        width: 640,
        height: 360,
        fps: Fps::new(30_000, 1_001).unwrap(),
        bitrate: 4_000_000,
        container,
        codec: resolve(codec, 360),
        rotation: 0,
    }
}

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

#[test]
fn mp4_streams_fragmented_to_stdout() {
    let args = ffmpeg_args(&track(Container::Mp4, VideoCodec::H264), "pipe:1");
    assert!(has_pair(&args, "-s", "640x360"));
    assert!(has_pair(&args, "-r", "30000/1001"));
    assert!(has_pair(&args, "-c:v", "libx264"));
    assert!(has_pair(&args, "-profile:v", "baseline"));
    assert!(has_pair(&args, "-b:v", "4000000"));
    assert!(has_pair(&args, "-metadata:s:v:0", "rotate=0"));
    assert!(has_pair(&args, "-movflags", MP4_FRAGMENT_FLAGS));
    assert!(has_pair(&args, "-f", "mp4"));
    assert_eq!(args.last().map(String::as_str), Some("pipe:1"));
}

#[test]
fn mov_is_faststart_and_hevc_is_tagged() {
    let args = ffmpeg_args(&track(Container::Mov, VideoCodec::H265), "/tmp/x.mov");
    assert!(has_pair(&args, "-movflags", "+faststart"));
    assert!(has_pair(&args, "-tag:v", "hvc1"));
    assert!(has_pair(&args, "-c:v", "libx265"));
}

#[test]
fn webm_and_mkv_use_native_muxers() {
    let webm = ffmpeg_args(&track(Container::Webm, VideoCodec::Vp9), "pipe:1");
    assert!(has_pair(&webm, "-f", "webm"));
    assert!(has_pair(&webm, "-c:v", "libvpx-vp9"));
    assert!(!webm.iter().any(|a| a == "-movflags" || a == "-profile:v"));

    let mkv = ffmpeg_args(&track(Container::Mkv, VideoCodec::Av1), "pipe:1");
    assert!(has_pair(&mkv, "-f", "matroska"));
    assert!(has_pair(&mkv, "-c:v", "libaom-av1"));
}

#[tokio::test]
async fn encode_before_configure_fails() {
    let mut enc = FfmpegEncoder::new(VideoOutput::InMemory);
    let err = enc
        .encode(VideoFrame {
            data: &[],
            timestamp_us: 0,
            duration_us: 1,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::Encode(_)));
    assert!(enc.finalize().await.is_err());
}

#[cfg(unix)]
fn fake_ffmpeg(dir: &std::path::Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Feed `frames` black frames, then finalize; return the first error.
#[cfg(unix)]
async fn encode_all(
    enc: &mut FfmpegEncoder,
    track: &VideoTrack,
    frames: u64,
) -> CaptureResult<()> {
    enc.configure(track).await?;
    let data = vec![0u8; (track.width * track.height * 4) as usize];
    for k in 0..frames {
        enc.encode(VideoFrame {
            data: &data,
            timestamp_us: timestamp_us(k, track.fps),
            duration_us: 33_367,
        })
        .await?;
    }
    enc.flush().await?;
    enc.finalize().await.map(|_| ())
}

#[cfg(unix)]
struct FullDisk;

#[cfg(unix)]
impl tokio::io::AsyncWrite for FullDisk {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
        _buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        std::task::Poll::Ready(Err(std::io::Error::other("disk full")))
    }

    fn poll_flush(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        std::task::Poll::Ready(Ok(()))
    }
}

#[cfg(unix)]
#[tokio::test]
async fn ffmpeg_stderr_explains_a_failed_encode() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_ffmpeg(
        dir.path(),
        "echo \"Unknown encoder 'libaom-av1'\" >&2\nexit 1",
    );
    let mut enc = FfmpegEncoder::with_program(program, VideoOutput::InMemory);

    let err = encode_all(&mut enc, &track(Container::Mkv, VideoCodec::Av1), 8)
        .await
        .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("Unknown encoder 'libaom-av1'"), "{msg}");
    assert!(msg.contains("ffmpeg exited with status"), "{msg}");
}

#[cfg(unix)]
#[tokio::test]
async fn output_writer_error_is_reported_instead_of_broken_pipe() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_ffmpeg(dir.path(), "exec cat");
    let mut enc = FfmpegEncoder::with_program(program, VideoOutput::Stream(Box::new(FullDisk)));

    let err = encode_all(&mut enc, &track(Container::Webm, VideoCodec::Vp9), 8)
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::Io(_)), "{err:?}");
    assert!(err.to_string().contains("disk full"), "{err}");
}

#[cfg(unix)]
#[tokio::test]
async fn successful_process_returns_its_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_ffmpeg(dir.path(), "cat >/dev/null\nprintf container");
    let mut enc = FfmpegEncoder::with_program(program, VideoOutput::InMemory);
    let t = track(Container::Mp4, VideoCodec::H264);

    enc.configure(&t).await.unwrap();
    let data = vec![0u8; (t.width * t.height * 4) as usize];
    enc.encode(VideoFrame {
        data: &data,
        timestamp_us: 0,
        duration_us: 33_367,
    })
    .await
    .unwrap();
    enc.flush().await.unwrap();

    assert_eq!(
        enc.finalize().await.unwrap(),
        EncodedArtifact::InMemory(b"container".to_vec())
    );
}

#[cfg(unix)]
#[tokio::test]
async fn variable_frame_timing_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let program = fake_ffmpeg(dir.path(), "exec cat >/dev/null");
    let mut enc = FfmpegEncoder::with_program(program, VideoOutput::InMemory);
    let t = track(Container::Mp4, VideoCodec::H264);
    enc.configure(&t).await.unwrap();
    let data = vec![0u8; (t.width * t.height * 4) as usize];

    let frame = |ts| VideoFrame {
        data: &data,
        timestamp_us: ts,
        duration_us: 33_367,
    };
    enc.encode(frame(0)).await.unwrap();
    let err = enc.encode(frame(40_000)).await.unwrap_err();
    assert!(matches!(err, CaptureError::Unsupported(_)), "{err:?}");
    // 30000/1001 fps: frame 1 sits at 33367us.
    enc.encode(frame(33_367)).await.unwrap();
}

#[tokio::test]
async fn missing_program_is_unsupported() {
    let mut enc = FfmpegEncoder::with_program(
        "/nonexistent/viewcap-test/ffmpeg",
        VideoOutput::InMemory,
    );
    let err = enc
        .configure(&track(Container::Mp4, VideoCodec::H264))
        .await
        .unwrap_err();
    assert!(err.is_setup(), "{err:?}");
}
