//! Pixel-difference detection against a reference region.

use crate::util::{PuttrackError, PuttrackResult};
use crate::ImageView;

/// Mean absolute grayscale difference between two equally sized regions.
pub fn mean_abs_diff(current: ImageView<'_, u8>, reference: ImageView<'_, u8>) -> PuttrackResult<f32> {
    if !current.same_size(&reference) {
        return Err(PuttrackError::RegionSizeMismatch {
            width: current.width(),
            height: current.height(),
            other_width: reference.width(),
            other_height: reference.height(),
        });
    }

    let mut total = 0u64;
    for y in 0..current.height() {
        let (Some(a), Some(b)) = (current.row(y), reference.row(y)) else {
            return Err(PuttrackError::BufferTooSmall {
                needed: (y + 1) * current.stride(),
                got: current.as_slice().len(),
            });
        };
        total += a
            .iter()
            .zip(b)
            .map(|(&p, &q)| u64::from(p.abs_diff(q)))
            .sum::<u64>();
    }
    let count = (current.width() * current.height()) as f64;
    Ok((total as f64 / count) as f32)
}

/// Returns true when the mean absolute difference exceeds `threshold`.
pub fn region_differs(
    current: ImageView<'_, u8>,
    reference: ImageView<'_, u8>,
    threshold: f32,
) -> PuttrackResult<bool> {
    Ok(mean_abs_diff(current, reference)? > threshold)
}

#[cfg(test)]
mod tests {
    use super::{mean_abs_diff, region_differs};
    use crate::util::PuttrackError;
    use crate::ImageView;

    #[test]
    fn identical_regions_have_zero_difference() {
        let a = [10u8, 20, 30, 40];
        let view = ImageView::from_slice(&a, 2, 2).unwrap();
        assert_eq!(mean_abs_diff(view, view).unwrap(), 0.0);
        assert!(!region_differs(view, view, 0.0).unwrap());
    }

    #[test]
    fn mean_is_symmetric_absolute() {
        let a = [0u8, 100, 50, 50];
        let b = [100u8, 0, 50, 90];
        let va = ImageView::from_slice(&a, 2, 2).unwrap();
        let vb = ImageView::from_slice(&b, 2, 2).unwrap();
        assert_eq!(mean_abs_diff(va, vb).unwrap(), 60.0);
        assert_eq!(mean_abs_diff(vb, va).unwrap(), 60.0);
        assert!(region_differs(va, vb, 59.0).unwrap());
        assert!(!region_differs(va, vb, 60.0).unwrap());
    }

    #[test]
    fn strided_views_compare_visible_pixels_only() {
        let padded = [1u8, 2, 99, 3, 4, 99];
        let tight = [1u8, 2, 3, 4];
        let va = ImageView::new(&padded, 2, 2, 3).unwrap();
        let vb = ImageView::from_slice(&tight, 2, 2).unwrap();
        assert_eq!(mean_abs_diff(va, vb).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let a = [0u8; 6];
        let va = ImageView::from_slice(&a, 3, 2).unwrap();
        let vb = ImageView::from_slice(&a, 2, 3).unwrap();
        assert_eq!(
            mean_abs_diff(va, vb).unwrap_err(),
            PuttrackError::RegionSizeMismatch {
                width: 3,
                height: 2,
                other_width: 2,
                other_height: 3,
            }
        );
    }
}
