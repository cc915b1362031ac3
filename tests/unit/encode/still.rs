use super::*;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn canvas() -> Canvas {
    Canvas {
        width: 4,
        height: 2,
    }
}

#[test]
fn quality_factor_maps_to_percent() {
    assert_eq!(jpeg_quality_percent(0.92), 92);
    assert_eq!(jpeg_quality_percent(0.0), 1);
    assert_eq!(jpeg_quality_percent(1.5), 100);
    assert_eq!(jpeg_quality_percent(f32::NAN), 92);
    assert_eq!(
        StillFormat::from_settings(ImageFormat::Jpeg, None),
        StillFormat::Jpeg { quality: 92 }
    );
    assert_eq!(
        StillFormat::from_settings(ImageFormat::Png, Some(0.1)),
        StillFormat::Png
    );
}

#[test]
fn extensions() {
    assert_eq!(StillFormat::Png.extension(), "png");
    assert_eq!(StillFormat::Jpeg { quality: 50 }.extension(), "jpg");
    assert_eq!("JPEG".parse::<ImageFormat>().unwrap(), ImageFormat::Jpeg);
}

#[tokio::test]
async fn software_encoder_writes_png_that_decodes_back() {
    let rgba: Vec<u8> = (0..canvas().rgba8_len()).map(|i| (i * 7) as u8).collect();
    let bytes = SoftwareStillEncoder
        .encode(canvas(), &rgba, StillFormat::Png)
        .await
        .unwrap();
    assert_eq!(bytes[..8], PNG_MAGIC);

    let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (4, 2));
    assert_eq!(decoded.as_raw(), &rgba);
}

#[tokio::test]
async fn software_encoder_writes_jpeg() {
    let rgba = vec![200u8; canvas().rgba8_len()];
    let bytes = SoftwareStillEncoder
        .encode(canvas(), &rgba, StillFormat::Jpeg { quality: 80 })
        .await
        .unwrap();
    assert_eq!(bytes[..3], [0xFF, 0xD8, 0xFF]);
}

#[test]
fn size_mismatch_is_rejected() {
    assert!(encode_png(canvas(), &[0u8; 4]).is_err());
}
