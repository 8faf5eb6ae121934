//! Template search around a predicted ball position.
//!
//! The matcher evaluates every integer top-left placement inside a square
//! window around the search center, optionally intersected with an ROI, and
//! returns the window center of the minimum-SSD placement. The search is
//! exhaustive and deterministic; ties go to the first placement in row-major
//! order.

use crate::geom::Point;
use crate::kernel::{Kernel, Peak, ScanWindow};
use crate::roi::Roi;
use crate::template::Template;
use crate::util::PuttrackResult;
use crate::ImageView;

#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::SsdScalar as Ssd;
#[cfg(feature = "simd")]
use crate::kernel::simd::SsdSimd as Ssd;

/// Best placement of a template in a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Match {
    /// Center of the matched window in frame coordinates.
    pub center: Point,
    /// Top-left column of the matched window.
    pub x: usize,
    /// Top-left row of the matched window.
    pub y: usize,
    /// Sum of squared grayscale differences (0 is a perfect match).
    pub score: u64,
}

impl Match {
    fn from_peak(peak: Peak, template: &Template) -> Self {
        let (cx, cy) = template.center_offset();
        Self {
            center: Point::new((peak.x + cx) as f32, (peak.y + cy) as f32),
            x: peak.x,
            y: peak.y,
            score: peak.score,
        }
    }
}

/// Search radius grown by the ball's last observed displacement.
///
/// `base + ceil(speed)` pixels, capped at `max`.
pub fn search_radius(base: usize, speed_px: f32, max: usize) -> usize {
    let extra = if speed_px.is_finite() && speed_px > 0.0 {
        speed_px.ceil() as usize
    } else {
        0
    };
    base.saturating_add(extra).min(max.max(base))
}

/// Placement window for a template centered within `radius` of `center`.
///
/// Returns `None` when the window lies entirely outside the frame or `roi`.
pub fn search_window(
    frame_width: usize,
    frame_height: usize,
    template: &Template,
    center: Point,
    radius: usize,
    roi: Option<&Roi>,
) -> Option<ScanWindow> {
    if !center.is_finite() || frame_width < template.width() || frame_height < template.height()
    {
        return None;
    }
    let (half_w, half_h) = template.center_offset();
    let axis = |c: f32, half: usize| -> Option<(usize, usize)> {
        // `as` saturates, so the arithmetic below must saturate too.
        let radius = i64::try_from(radius).unwrap_or(i64::MAX);
        let origin = (c.round() as i64).saturating_sub(half as i64);
        let lo = origin.saturating_sub(radius);
        let hi = origin.saturating_add(radius);
        if hi < 0 {
            return None;
        }
        let lo = usize::try_from(lo.max(0)).unwrap_or(usize::MAX);
        let hi = usize::try_from(hi).unwrap_or(usize::MAX);
        Some((lo, hi))
    };
    let (x0, x1) = axis(center.x, half_w)?;
    let (y0, y1) = axis(center.y, half_h)?;
    let frame = ScanWindow {
        x0: 0,
        y0: 0,
        x1: frame_width - template.width(),
        y1: frame_height - template.height(),
    };
    let mut window = ScanWindow { x0, y0, x1, y1 }.intersect(&frame)?;
    if let Some(roi) = roi {
        let (rx0, ry0, rx1, ry1) = roi.placement_range(template.width(), template.height())?;
        window = window.intersect(&ScanWindow {
            x0: rx0,
            y0: ry0,
            x1: rx1,
            y1: ry1,
        })?;
    }
    Some(window)
}

/// Exhaustive SSD matcher.
#[derive(Clone, Copy, Debug, Default)]
pub struct Matcher {
    #[cfg_attr(not(feature = "rayon"), allow(dead_code))]
    parallel: bool,
}

impl Matcher {
    /// Creates a sequential matcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables row-parallel scanning when the `rayon` feature is compiled in.
    ///
    /// Without the feature the flag is ignored and the scan stays sequential.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Finds the best match of `template` within `radius` of `center`.
    pub fn find_best_match(
        &self,
        frame: ImageView<'_, u8>,
        template: &Template,
        center: Point,
        radius: usize,
        roi: Option<&Roi>,
    ) -> PuttrackResult<Option<Match>> {
        let window = search_window(
            frame.width(),
            frame.height(),
            template,
            center,
            radius,
            roi,
        );
        match window {
            Some(window) => self.find_best_match_in_window(frame, template, window),
            None => Ok(None),
        }
    }

    /// Finds the best match of `template` anywhere inside `roi`.
    pub fn find_best_match_in_roi(
        &self,
        frame: ImageView<'_, u8>,
        template: &Template,
        roi: &Roi,
    ) -> PuttrackResult<Option<Match>> {
        let Some(fitted) =
            roi.fit_template(template.width(), template.height(), frame.width(), frame.height())
        else {
            return Ok(None);
        };
        let Some((x0, y0, x1, y1)) = fitted.placement_range(template.width(), template.height())
        else {
            return Ok(None);
        };
        self.find_best_match_in_window(frame, template, ScanWindow { x0, y0, x1, y1 })
    }

    /// Scans every placement of an already computed [`search_window`].
    pub fn find_best_match_in_window(
        &self,
        frame: ImageView<'_, u8>,
        template: &Template,
        window: ScanWindow,
    ) -> PuttrackResult<Option<Match>> {
        #[cfg(feature = "rayon")]
        if self.parallel {
            let peak = crate::kernel::rayon::ssd_scan_par(frame, template.view(), window)?;
            return Ok(peak.map(|p| Match::from_peak(p, template)));
        }
        let peak = Ssd::scan(frame, template.view(), window)?;
        Ok(peak.map(|p| Match::from_peak(p, template)))
    }
}

/// Finds the best match with a sequential [`Matcher`].
pub fn find_best_match(
    frame: ImageView<'_, u8>,
    template: &Template,
    center: Point,
    radius: usize,
    roi: Option<&Roi>,
) -> PuttrackResult<Option<Match>> {
    Matcher::new().find_best_match(frame, template, center, radius, roi)
}

#[cfg(test)]
mod tests {
    use super::{search_radius, search_window};
    use crate::geom::Point;
    use crate::roi::Roi;
    use crate::template::Template;

    #[test]
    fn radius_grows_with_speed_and_caps() {
        assert_eq!(search_radius(8, 0.0, 64), 8);
        assert_eq!(search_radius(8, 5.2, 64), 14);
        assert_eq!(search_radius(8, 500.0, 64), 64);
        assert_eq!(search_radius(8, f32::NAN, 64), 8);
    }

    #[test]
    fn window_is_centered_on_template_origin() {
        let tpl = Template::new(vec![0; 100], 10, 10).unwrap();
        let window = search_window(100, 100, &tpl, Point::new(50.0, 40.0), 3, None).unwrap();
        assert_eq!((window.x0, window.x1), (42, 48));
        assert_eq!((window.y0, window.y1), (32, 38));
    }

    #[test]
    fn window_clamps_to_frame_and_roi() {
        let tpl = Template::new(vec![0; 100], 10, 10).unwrap();
        let window = search_window(60, 60, &tpl, Point::new(3.0, 58.0), 6, None).unwrap();
        assert_eq!((window.x0, window.y1), (0, 50));

        let roi = Roi {
            min_x: 40.0,
            min_y: 0.0,
            max_x: 60.0,
            max_y: 60.0,
        };
        let window = search_window(60, 60, &tpl, Point::new(45.0, 30.0), 8, Some(&roi)).unwrap();
        assert_eq!((window.x0, window.x1), (40, 48));
        assert!(search_window(60, 60, &tpl, Point::new(10.0, 30.0), 4, Some(&roi)).is_none());
    }
}
