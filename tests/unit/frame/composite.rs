use super::*;

const BG: Rgba8 = Rgba8::opaque(10, 20, 30);

#[test]
fn alpha_0_returns_bg() {
    let mut px = vec![0u8, 0, 0, 0];
    flatten_premul_over_bg_in_place(&mut px, BG).unwrap();
    assert_eq!(px, vec![10, 20, 30, 255]);
}

#[test]
fn alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255, 250, 128, 7, 255];
    let mut px = src.clone();
    flatten_premul_over_bg_in_place(&mut px, BG).unwrap();
    assert_eq!(px, src);
}

#[test]
fn premul_half_red_over_black() {
    // Premultiplied red @ 50% alpha => rgb is 128,0,0 when premul.
    let mut px = vec![128u8, 0, 0, 128];
    flatten_premul_over_bg_in_place(&mut px, Rgba8::opaque(0, 0, 0)).unwrap();
    assert_eq!(px, vec![128, 0, 0, 255]);
}

#[test]
fn premul_half_red_over_white() {
    // 128 + 255 * 127 / 255 = 255
    let mut px = vec![128u8, 0, 0, 128];
    flatten_premul_over_bg_in_place(&mut px, Rgba8::opaque(255, 255, 255)).unwrap();
    assert_eq!(px, vec![255, 127, 127, 255]);
}

#[test]
fn output_alpha_is_always_opaque() {
    let mut px: Vec<u8> = (0..=255u8)
        .flat_map(|a| [a / 2, a / 3, a, a])
        .collect();
    flatten_premul_over_bg_in_place(&mut px, BG).unwrap();
    assert!(px.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn rejects_partial_pixels() {
    let mut px = vec![0u8; 6];
    assert!(flatten_premul_over_bg_in_place(&mut px, BG).is_err());
}
