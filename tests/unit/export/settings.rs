use super::*;

fn video() -> VideoExportSettings {
    VideoExportSettings {
        capture: CaptureSettings::new(1280, 720),
        start_frame: 0,
        end_frame: 29,
        frame_rate: 30,
        bitrate: 8_000_000,
        container: Container::Mp4,
        codec: VideoCodec::H264,
    }
}

fn sequence() -> SequenceExportSettings {
    SequenceExportSettings {
        capture: CaptureSettings::new(64, 64),
        start_frame: 10,
        end_frame: 10,
        format: ImageFormat::Png,
        quality: None,
        motion_blur_samples: None,
    }
}

#[test]
fn capture_requires_positive_size() {
    assert!(CaptureSettings::new(1, 1).validate().is_ok());
    assert!(CaptureSettings::new(0, 1).validate().is_err());
}

#[test]
fn video_validation() {
    assert!(video().validate().is_ok());

    let mut v = video();
    v.start_frame = 30;
    assert!(v.validate().is_err());

    let mut v = video();
    v.frame_rate = 0;
    assert!(v.validate().is_err());

    let mut v = video();
    v.capture.width = 1279;
    assert!(v.validate().is_err());

    let mut v = video();
    v.container = Container::Webm;
    let err = v.validate().unwrap_err();
    assert!(matches!(err, CaptureError::Unsupported(_)));
}

#[test]
fn sequence_validation() {
    assert!(sequence().validate().is_ok());
    assert_eq!(sequence().blur_samples(), 1);

    let mut s = sequence();
    s.quality = Some(1.2);
    assert!(s.validate().is_err());

    let mut s = sequence();
    s.motion_blur_samples = Some(0);
    assert!(s.validate().is_err());

    let mut s = sequence();
    s.format = ImageFormat::Jpeg;
    s.quality = Some(0.5);
    assert_eq!(s.still_format(), StillFormat::Jpeg { quality: 50 });
}

#[test]
fn settings_parse_from_camel_case_json() {
    let v: VideoExportSettings = serde_json::from_str(
        r#"{"width":1920,"height":1080,"transparent":true,"startFrame":5,"endFrame":10,
            "frameRate":24,"bitrate":1000000,"container":"mkv","codec":"av1"}"#,
    )
    .unwrap();
    assert!(v.capture.transparent);
    assert!(!v.capture.show_overlays);
    assert_eq!(v.container, Container::Mkv);
    assert_eq!(v.codec, VideoCodec::Av1);
    assert_eq!(v.frame_range().unwrap().len_frames(), 6);

    let s: SequenceExportSettings = serde_json::from_str(
        r#"{"width":8,"height":8,"showOverlays":true,"startFrame":0,"endFrame":3,
            "format":"jpeg","motionBlurSamples":4}"#,
    )
    .unwrap();
    assert!(s.capture.show_overlays);
    assert_eq!(s.blur_samples(), 4);
    assert_eq!(s.still_format(), StillFormat::Jpeg { quality: 92 });
}
