//! Tracker configuration.

use crate::detect::CrossingDetector;

/// Tuning parameters shared by live tracking and forensic analysis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackerConfig {
    /// Side of the square ball template, in pixels.
    pub ball_template_size: usize,
    /// Side of the square marker templates used for drift checks.
    pub marker_template_size: usize,
    /// Search radius when the ball is at rest.
    pub base_radius: usize,
    /// Upper bound on the speed-grown search radius.
    pub max_radius: usize,
    /// Center the search on a constant-velocity prediction instead of the
    /// last position.
    pub predict_motion: bool,
    /// Tracking ROI growth along a calibration line.
    pub roi_margin_along: f32,
    /// Tracking ROI growth perpendicular to a calibration line.
    pub roi_margin_across: f32,
    /// Margin of the reference regions captured around each line.
    pub reference_margin: f32,
    /// Restrict the search to the pending line's ROI once the predicted
    /// ball position falls inside it.
    pub restrict_to_line_roi: bool,
    /// Delay between ball placement and arming, in seconds.
    pub settle_delay_s: f64,
    /// Row-parallel matching (requires the `rayon` feature).
    pub parallel: bool,
    /// Crossing policy used by the live detector.
    pub crossing: CrossingDetector,
    /// Radius searched around each marker by the drift check.
    pub drift_radius: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ball_template_size: 30,
            marker_template_size: 30,
            base_radius: 10,
            max_radius: 96,
            predict_motion: true,
            roi_margin_along: 20.0,
            roi_margin_across: 48.0,
            reference_margin: 20.0,
            restrict_to_line_roi: false,
            settle_delay_s: 0.5,
            parallel: false,
            crossing: CrossingDetector::PathIntersection,
            drift_radius: 12,
        }
    }
}

impl TrackerConfig {
    /// Checks field ranges.
    pub fn validate(&self) -> crate::PuttrackResult<()> {
        use crate::PuttrackError;
        if self.ball_template_size == 0 || self.marker_template_size == 0 {
            return Err(PuttrackError::InvalidInput("template sizes must be positive"));
        }
        if !(self.settle_delay_s.is_finite() && self.settle_delay_s >= 0.0) {
            return Err(PuttrackError::InvalidInput("settle delay must be a non-negative number"));
        }
        let margins = [
            self.roi_margin_along,
            self.roi_margin_across,
            self.reference_margin,
        ];
        if margins.iter().any(|m| !(m.is_finite() && *m >= 0.0)) {
            return Err(PuttrackError::InvalidInput("roi margins must be non-negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::TrackerConfig;
    use crate::detect::CrossingDetector;

    #[test]
    fn defaults_validate() {
        let cfg = TrackerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.crossing, CrossingDetector::PathIntersection);
        assert!(cfg.max_radius >= cfg.base_radius);
    }

    #[test]
    fn negative_settle_delay_is_rejected() {
        let cfg = TrackerConfig {
            settle_delay_s: -1.0,
            ..TrackerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
