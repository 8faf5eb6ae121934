//! Scalar reference kernel for SSD evaluation.

use crate::kernel::{clamp_window, Kernel, Peak, ScanWindow};
use crate::util::PuttrackResult;
use crate::ImageView;

/// Scalar SSD kernel with row-granular early exit.
pub struct SsdScalar;

/// SSD at `(x, y)`, abandoning the sum once it reaches `bound`.
///
/// A placement whose partial sum already equals the best score can never
/// replace it, so pruning at `>=` keeps the first-found tie-break intact.
#[inline]
pub(crate) fn ssd_bounded(
    image: ImageView<'_, u8>,
    tpl: ImageView<'_, u8>,
    x: usize,
    y: usize,
    bound: Option<u64>,
) -> Option<u64> {
    let tpl_width = tpl.width();
    let mut sse = 0u64;
    for ty in 0..tpl.height() {
        let img_row = image.row(y + ty)?;
        let tpl_row = tpl.row(ty)?;
        let window = img_row.get(x..x + tpl_width)?;
        let mut row_sse = 0u32;
        for (&a, &b) in window.iter().zip(tpl_row) {
            let diff = i32::from(a) - i32::from(b);
            row_sse += (diff * diff) as u32;
        }
        sse += u64::from(row_sse);
        if let Some(bound) = bound {
            if sse >= bound {
                return None;
            }
        }
    }
    Some(sse)
}

/// Scans a single row of placements, returning its first minimum.
#[inline]
pub(crate) fn scan_row(
    image: ImageView<'_, u8>,
    tpl: ImageView<'_, u8>,
    y: usize,
    x0: usize,
    x1: usize,
    mut best: Option<Peak>,
) -> Option<Peak> {
    for x in x0..=x1 {
        let bound = best.map(|p| p.score);
        if let Some(score) = ssd_bounded(image, tpl, x, y, bound) {
            best = Peak::keep_first(best, Some(Peak { x, y, score }));
        }
    }
    best
}

impl Kernel for SsdScalar {
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
        ssd_bounded(image, tpl, x, y, None)
    }

    fn scan(
        image: ImageView<'_, u8>,
        tpl: ImageView<'_, u8>,
        window: ScanWindow,
    ) -> PuttrackResult<Option<Peak>> {
        let Some(window) = clamp_window(image, tpl, window)? else {
            return Ok(None);
        };
        let mut best = None;
        for y in window.y0..=window.y1 {
            best = scan_row(image, tpl, y, window.x0, window.x1, best);
        }
        Ok(best)
    }
}
