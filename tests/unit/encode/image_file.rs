use super::*;
use crate::foundation::core::Fps;
use crate::host::storage::MemoryFiles;

fn cfg(frame_count: u64) -> SinkConfig {
    SinkConfig {
        width: 3,
        height: 2,
        fps: Fps::whole(30).unwrap(),
        frame_count,
        source_name: "garden".into(),
    }
}

#[tokio::test]
async fn saves_one_png_named_after_the_source() {
    let mut files = MemoryFiles::new();
    let mut sink = StillImageSink::new(&mut files);
    sink.begin(cfg(1)).await.unwrap();

    let frame = FrameRGBA::from_raw(3, 2, vec![255; 24], false).unwrap();
    sink.push_frame(FrameIndex(0), &frame).await.unwrap();
    let artifact = sink.end().await.unwrap();
    drop(sink);

    assert_eq!(
        artifact,
        EncodedArtifact::Files(vec!["garden-image.png".into()])
    );
    let png = files.get("garden-image.png").unwrap();
    let decoded = image::load_from_memory(png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (3, 2));
}

#[tokio::test]
async fn rejects_multi_frame_configs_and_empty_exports() {
    let mut files = MemoryFiles::new();
    let mut sink = StillImageSink::new(&mut files);
    assert!(sink.begin(cfg(2)).await.is_err());

    sink.begin(cfg(1)).await.unwrap();
    assert!(sink.end().await.is_err());
    drop(sink);
    assert!(files.is_empty());
}
