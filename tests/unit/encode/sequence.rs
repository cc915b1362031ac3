use super::*;
use crate::foundation::core::{Canvas, Fps};
use crate::host::storage::MemoryFiles;
use std::sync::{Arc, Mutex};

/// Canvas-style encoder: expects bottom-left rows and records what it was given.
struct CanvasEncoder {
    fail: bool,
    seen: Arc<Mutex<Vec<Vec<u8>>>>,
}

#[async_trait::async_trait]
impl StillEncoder for CanvasEncoder {
    fn name(&self) -> &str {
        "canvas"
    }
    fn row_origin(&self) -> RowOrigin {
        RowOrigin::BottomLeft
    }
    fn supports(&self, format: StillFormat) -> bool {
        matches!(format, StillFormat::Jpeg { .. })
    }
    async fn encode(
        &mut self,
        _canvas: Canvas,
        rgba: &[u8],
        _format: StillFormat,
    ) -> CaptureResult<Vec<u8>> {
        self.seen.lock().unwrap().push(rgba.to_vec());
        if self.fail {
            Err(CaptureError::encode("device lost"))
        } else {
            Ok(b"accelerated".to_vec())
        }
    }
}

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 1,
        height: 2,
        fps: Fps::whole(24).unwrap(),
        frame_count: 2,
        source_name: "seq".into(),
    }
}

fn two_rows() -> FrameRGBA {
    FrameRGBA::from_raw(1, 2, vec![1, 1, 1, 255, 2, 2, 2, 255], false).unwrap()
}

#[test]
fn file_names_are_zero_padded() {
    assert_eq!(
        frame_file_name(FrameIndex(10), StillFormat::Png),
        "frame_000010.png"
    );
    assert_eq!(
        frame_file_name(FrameIndex(1_234_567), StillFormat::Jpeg { quality: 90 }),
        "frame_1234567.jpg"
    );
}

#[tokio::test]
async fn writes_one_file_per_frame() {
    let mut files = MemoryFiles::new();
    let mut sink = SequenceSink::new(&mut files, StillFormat::Png);
    sink.begin(cfg()).await.unwrap();
    sink.push_frame(FrameIndex(10), &two_rows()).await.unwrap();
    sink.push_frame(FrameIndex(11), &two_rows()).await.unwrap();
    let artifact = sink.end().await.unwrap();
    drop(sink);
    assert_eq!(
        artifact,
        EncodedArtifact::Files(vec!["frame_000010.png".into(), "frame_000011.png".into()])
    );
    assert_eq!(files.names(), vec!["frame_000010.png", "frame_000011.png"]);
}

#[tokio::test]
async fn bottom_left_encoder_receives_reflipped_rows() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut files = MemoryFiles::new();
    let mut sink = SequenceSink::new(&mut files, StillFormat::Jpeg { quality: 90 }).with_accelerated(
        Box::new(CanvasEncoder {
            fail: false,
            seen: Arc::clone(&seen),
        }),
    );
    sink.begin(cfg()).await.unwrap();
    sink.push_frame(FrameIndex(0), &two_rows()).await.unwrap();
    sink.end().await.unwrap();
    assert_eq!(sink.fallbacks(), 0);
    drop(sink);

    assert_eq!(seen.lock().unwrap()[0], vec![2, 2, 2, 255, 1, 1, 1, 255]);
    assert_eq!(files.get("frame_000000.jpg").unwrap(), b"accelerated");
}

#[tokio::test]
async fn accelerated_failure_falls_back_to_software() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut files = MemoryFiles::new();
    let mut sink = SequenceSink::new(&mut files, StillFormat::Jpeg { quality: 90 }).with_accelerated(
        Box::new(CanvasEncoder {
            fail: true,
            seen: Arc::clone(&seen),
        }),
    );
    sink.begin(cfg()).await.unwrap();
    sink.push_frame(FrameIndex(0), &two_rows()).await.unwrap();
    assert_eq!(sink.fallbacks(), 1);
    drop(sink);

    let jpg = files.get("frame_000000.jpg").unwrap();
    assert_eq!(jpg[..2], [0xFF, 0xD8]);
}

#[tokio::test]
async fn unsupported_format_skips_accelerated_encoder() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut files = MemoryFiles::new();
    let mut sink = SequenceSink::new(&mut files, StillFormat::Png).with_accelerated(Box::new(
        CanvasEncoder {
            fail: false,
            seen: Arc::clone(&seen),
        },
    ));
    sink.begin(cfg()).await.unwrap();
    sink.push_frame(FrameIndex(0), &two_rows()).await.unwrap();
    drop(sink);
    assert!(seen.lock().unwrap().is_empty());
    assert!(files.get("frame_000000.png").is_some());
}
