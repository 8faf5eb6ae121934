//! Rayon-parallel SSD scan (feature-gated).
//!
//! Rows of placements are scanned in parallel and merged in row order, so the
//! first-found tie-break of the sequential scan is preserved.

use crate::kernel::scalar::scan_row;
use crate::kernel::{clamp_window, Peak, ScanWindow};
use crate::util::PuttrackResult;
use crate::ImageView;
use rayon::prelude::*;

/// Row-parallel SSD scan over `window`.
///
/// Each row prunes against its own best only; the merge then picks the first
/// strictly smaller row minimum, which reproduces the sequential result.
pub fn ssd_scan_par(
    image: ImageView<'_, u8>,
    tpl: ImageView<'_, u8>,
    window: ScanWindow,
) -> PuttrackResult<Option<Peak>> {
    let Some(window) = clamp_window(image, tpl, window)? else {
        return Ok(None);
    };

    let row_results: Vec<Option<Peak>> = (window.y0..=window.y1)
        .into_par_iter()
        .map(|y| scan_row(image, tpl, y, window.x0, window.x1, None))
        .collect();

    Ok(row_results.into_iter().fold(None, Peak::keep_first))
}
