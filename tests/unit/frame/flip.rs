use super::*;

fn numbered_rows(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[y as u8, x as u8, (y * 7) as u8, 255]);
        }
    }
    data
}

#[test]
fn first_and_last_rows_swap() {
    let (w, h) = (3u32, 5u32);
    let raw = numbered_rows(w, h);
    let mut flipped = raw.clone();
    flip_rows_in_place(&mut flipped, w, h).unwrap();

    let stride = (w * 4) as usize;
    for y in 0..h as usize {
        let src = &raw[(h as usize - 1 - y) * stride..(h as usize - y) * stride];
        assert_eq!(&flipped[y * stride..(y + 1) * stride], src, "row {y}");
    }
}

#[test]
fn middle_row_of_odd_height_stays_put() {
    let (w, h) = (2u32, 3u32);
    let raw = numbered_rows(w, h);
    let mut flipped = raw.clone();
    flip_rows_in_place(&mut flipped, w, h).unwrap();
    let stride = (w * 4) as usize;
    assert_eq!(&flipped[stride..2 * stride], &raw[stride..2 * stride]);
}

#[test]
fn flip_is_an_involution() {
    for (w, h) in [(1u32, 1u32), (4, 4), (3, 7), (8, 2)] {
        let raw = numbered_rows(w, h);
        let mut buf = raw.clone();
        flip_rows_in_place(&mut buf, w, h).unwrap();
        flip_rows_in_place(&mut buf, w, h).unwrap();
        assert_eq!(buf, raw, "{w}x{h}");
    }
}

#[test]
fn size_mismatch_is_rejected() {
    let mut data = vec![0u8; 10];
    assert!(flip_rows_in_place(&mut data, 2, 2).is_err());
}
