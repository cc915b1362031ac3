use crate::foundation::core::Rgba8;
use crate::foundation::error::{CaptureError, CaptureResult};
use crate::foundation::math::mul_div255_u16;

/// Flatten premultiplied RGBA8 over an opaque background, in place.
///
/// Each channel becomes `src + bg * (255 - src_alpha) / 255` (rounded, saturated) and alpha is
/// forced to 255. Fully opaque pixels are left untouched apart from the alpha write. Row order
/// does not matter, so this may run before or after the vertical flip.
pub fn flatten_premul_over_bg_in_place(data: &mut [u8], bg: Rgba8) -> CaptureResult<()> {
    if !data.len().is_multiple_of(4) {
        return Err(CaptureError::validation(
            "flatten_premul_over_bg_in_place expects rgba8 data",
        ));
    }

    let bg_r = u16::from(bg.r);
    let bg_g = u16::from(bg.g);
    let bg_b = u16::from(bg.b);

    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }

        let inv = 255u16 - a;
        let r = u16::from(px[0]) + mul_div255_u16(bg_r, inv);
        let g = u16::from(px[1]) + mul_div255_u16(bg_g, inv);
        let b = u16::from(px[2]) + mul_div255_u16(bg_b, inv);

        px[0] = r.min(255) as u8;
        px[1] = g.min(255) as u8;
        px[2] = b.min(255) as u8;
        px[3] = 255;
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/frame/composite.rs"]
mod tests;
