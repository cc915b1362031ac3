use super::*;

#[test]
fn new_rejects_empty_frames() {
    assert!(FrameRGBA::new(0, 4).is_err());
    assert!(FrameRGBA::new(4, 0).is_err());
    let f = FrameRGBA::new(3, 2).unwrap();
    assert_eq!(f.data.len(), 24);
    assert!(f.premultiplied);
}

#[test]
fn from_raw_checks_length() {
    let err = FrameRGBA::from_raw(2, 2, vec![0; 15], false).unwrap_err();
    assert!(matches!(err, CaptureError::Validation(_)));
}

#[test]
fn rows_and_pixels_are_row_major() {
    let data: Vec<u8> = (0..24).collect();
    let f = FrameRGBA::from_raw(3, 2, data, false).unwrap();
    assert_eq!(f.stride(), 12);
    assert_eq!(f.row(1)[..4], [12, 13, 14, 15]);
    assert_eq!(f.pixel(2, 1), [20, 21, 22, 23]);
    assert_eq!(f.canvas(), Canvas { width: 3, height: 2 });
}
