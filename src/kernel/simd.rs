//! SIMD-accelerated SSD kernel using the `wide` crate.
//!
//! The inner template loop processes 8 pixels at a time in `i32x8` lanes.
//! Integer lanes keep the sum exact, so the result equals [`SsdScalar`]
//! bit for bit, tie-breaks included.
//!
//! [`SsdScalar`]: crate::kernel::scalar::SsdScalar

use crate::kernel::{clamp_window, Kernel, Peak, ScanWindow};
use crate::util::PuttrackResult;
use crate::ImageView;
use wide::i32x8;

const LANES: usize = 8;

/// Load 8 u8 values and widen to i32x8.
#[inline]
fn load_u8x8(slice: &[u8]) -> i32x8 {
    i32x8::from([
        slice[0] as i32,
        slice[1] as i32,
        slice[2] as i32,
        slice[3] as i32,
        slice[4] as i32,
        slice[5] as i32,
        slice[6] as i32,
        slice[7] as i32,
    ])
}

/// Horizontal sum of i32x8 lanes.
#[inline]
fn hsum(v: i32x8) -> u64 {
    v.to_array().iter().map(|&lane| lane as u64).sum()
}

/// SIMD SSD kernel.
pub struct SsdSimd;

impl SsdSimd {
    fn ssd_bounded(
        image: ImageView<'_, u8>,
        tpl: ImageView<'_, u8>,
        x: usize,
        y: usize,
        bound: Option<u64>,
    ) -> Option<u64> {
        let tpl_width = tpl.width();
        let simd_end = tpl_width / LANES * LANES;
        let mut sse = 0u64;

        for ty in 0..tpl.height() {
            let img_row = image.row(y + ty)?.get(x..x + tpl_width)?;
            let tpl_row = tpl.row(ty)?;

            let mut acc = i32x8::splat(0);
            let mut tx = 0;
            while tx < simd_end {
                let diff = load_u8x8(&img_row[tx..]) - load_u8x8(&tpl_row[tx..]);
                acc = acc + diff * diff;
                tx += LANES;
            }
            let mut row_sse = hsum(acc);
            while tx < tpl_width {
                let diff = i32::from(img_row[tx]) - i32::from(tpl_row[tx]);
                row_sse += (diff * diff) as u64;
                tx += 1;
            }

            sse += row_sse;
            if let Some(bound) = bound {
                if sse >= bound {
                    return None;
                }
            }
        }
        Some(sse)
    }
}

impl Kernel for SsdSimd {
    fn score_at(
        image: ImageView<'_, u8>,
        tpl: ImageView<'_, u8>,
        x: usize,
        y: usize,
    ) -> Option<u64> {
        if image.width() < tpl.width() || image.height() < tpl.height() {
            return None;
        }
        if x > image.width() - tpl.width() || y > image.height() - tpl.height() {
            return None;
        }
        Self::ssd_bounded(image, tpl, x, y, None)
    }

    fn scan(
        image: ImageView<'_, u8>,
        tpl: ImageView<'_, u8>,
        window: ScanWindow,
    ) -> PuttrackResult<Option<Peak>> {
        let Some(window) = clamp_window(image, tpl, window)? else {
            return Ok(None);
        };
        let mut best: Option<Peak> = None;
        for y in window.y0..=window.y1 {
            for x in window.x0..=window.x1 {
                let bound = best.map(|p| p.score);
                if let Some(score) = Self::ssd_bounded(image, tpl, x, y, bound) {
                    best = Peak::keep_first(best, Some(Peak { x, y, score }));
                }
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::SsdSimd;
    use crate::kernel::scalar::SsdScalar;
    use crate::kernel::{Kernel, ScanWindow};
    use crate::ImageView;

    #[test]
    fn simd_matches_scalar_with_remainder_columns() {
        let img_width = 64;
        let img_height = 40;
        let image: Vec<u8> = (0..img_width * img_height)
            .map(|i| ((i * 29) ^ (i / img_width * 7)) as u8)
            .collect();
        let tpl_width = 13;
        let tpl_height = 9;
        let mut tpl = Vec::with_capacity(tpl_width * tpl_height);
        for y in 0..tpl_height {
            for x in 0..tpl_width {
                tpl.push(image[(y + 17) * img_width + x + 21]);
            }
        }
        let image_view = ImageView::from_slice(&image, img_width, img_height).unwrap();
        let tpl_view = ImageView::from_slice(&tpl, tpl_width, tpl_height).unwrap();
        let window = ScanWindow {
            x0: 5,
            y0: 3,
            x1: 40,
            y1: 30,
        };
        let simd = SsdSimd::scan(image_view, tpl_view, window).unwrap();
        let scalar = SsdScalar::scan(image_view, tpl_view, window).unwrap();
        assert_eq!(simd, scalar);
        assert_eq!(
            SsdSimd::score_at(image_view, tpl_view, 2, 2),
            SsdScalar::score_at(image_view, tpl_view, 2, 2)
        );
    }
}
