//! SSD kernel implementations.
//!
//! Every kernel returns the placement with the smallest sum of squared
//! differences. Ties resolve to the first placement in row-major order
//! (`y` outer, `x` inner, both ascending), so all kernels agree exactly.

use crate::util::{PuttrackError, PuttrackResult};
use crate::ImageView;

/// Best placement found by a scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Peak {
    /// Top-left column of the template window.
    pub x: usize,
    /// Top-left row of the template window.
    pub y: usize,
    /// Sum of squared differences at the placement.
    pub score: u64,
}

impl Peak {
    /// Keeps `self` unless `other` scores strictly lower.
    #[inline]
    pub(crate) fn keep_first(current: Option<Peak>, other: Option<Peak>) -> Option<Peak> {
        match (current, other) {
            (Some(a), Some(b)) if b.score < a.score => Some(b),
            (None, b) => b,
            (a, _) => a,
        }
    }
}

/// Inclusive range of template top-left placements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanWindow {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl ScanWindow {
    /// Intersects two windows.
    pub fn intersect(&self, other: &ScanWindow) -> Option<ScanWindow> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 > x1 || y0 > y1 {
            return None;
        }
        Some(ScanWindow { x0, y0, x1, y1 })
    }

    /// Number of placements in the window.
    pub fn len(&self) -> usize {
        (self.x1 - self.x0 + 1) * (self.y1 - self.y0 + 1)
    }

    /// Windows are never empty once constructed through `intersect`.
    pub fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }
}

/// Kernel trait for scoring and scan operations.
pub trait Kernel {
    /// Computes the SSD at a single placement (top-left coordinates).
    ///
    /// Returns `None` when the window leaves the image.
    fn score_at(image: ImageView<'_, u8>, tpl: ImageView<'_, u8>, x: usize, y: usize)
        -> Option<u64>;

    /// Scans `window` and returns the minimum-SSD placement.
    fn scan(
        image: ImageView<'_, u8>,
        tpl: ImageView<'_, u8>,
        window: ScanWindow,
    ) -> PuttrackResult<Option<Peak>>;
}

/// Clamps `window` to the placements where the template fits inside `image`.
pub(crate) fn clamp_window(
    image: ImageView<'_, u8>,
    tpl: ImageView<'_, u8>,
    window: ScanWindow,
) -> PuttrackResult<Option<ScanWindow>> {
    let img_width = image.width();
    let img_height = image.height();
    let tpl_width = tpl.width();
    let tpl_height = tpl.height();
    if img_width < tpl_width || img_height < tpl_height {
        return Err(PuttrackError::RoiOutOfBounds {
            x: 0,
            y: 0,
            width: tpl_width,
            height: tpl_height,
            img_width,
            img_height,
        });
    }
    let full = ScanWindow {
        x0: 0,
        y0: 0,
        x1: img_width - tpl_width,
        y1: img_height - tpl_height,
    };
    Ok(full.intersect(&window))
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;
