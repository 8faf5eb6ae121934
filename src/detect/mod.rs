//! Line-crossing policies and the live per-frame detector.

use crate::diff::region_differs;
use crate::geom::Line;
use crate::search::Matcher;
use crate::template::{ReferenceRegion, Template};
use crate::util::PuttrackResult;
use crate::ImageView;

pub mod live;

/// Which calibration line an event refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineKind {
    Start,
    End,
}

impl LineKind {
    /// Lowercase name used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Start => "start",
            LineKind::End => "end",
        }
    }
}

/// A recorded line crossing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossingEvent {
    pub line: LineKind,
    /// Seconds on the clock of the frame that produced the crossing.
    pub timestamp: f64,
    /// Index of that frame since arming, when known.
    pub frame_index: Option<u64>,
}

/// Everything a crossing policy may look at for one frame.
#[derive(Clone, Copy, Debug)]
pub struct LineProbe<'a> {
    pub frame: ImageView<'a, u8>,
    /// The calibration line being watched.
    pub line: Line,
    /// Ball displacement over the last frame, previous to current.
    pub path: Line,
    pub ball_template: &'a Template,
    /// Baseline patch around `line`.
    pub reference: &'a ReferenceRegion,
}

/// Decides whether the ball crossed a line during the last frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CrossingDetector {
    /// The ball's path segment intersects the line segment.
    PathIntersection,
    /// The ball matches inside the line's reference region and that region
    /// differs from its calibration baseline.
    DualSignalRoi {
        /// Maximum SSD for the template to count as present.
        match_threshold: u64,
        /// Mean absolute difference above which the region has changed.
        diff_threshold: f32,
    },
}

impl CrossingDetector {
    /// Dual-signal policy with the default thresholds.
    pub fn dual_signal() -> Self {
        CrossingDetector::DualSignalRoi {
            match_threshold: 1_000_000,
            diff_threshold: 25.0,
        }
    }

    /// Evaluates the policy.
    pub fn is_crossing(&self, probe: &LineProbe<'_>, matcher: &Matcher) -> PuttrackResult<bool> {
        match *self {
            CrossingDetector::PathIntersection => Ok(probe.path.intersects(&probe.line)),
            CrossingDetector::DualSignalRoi {
                match_threshold,
                diff_threshold,
            } => {
                let found = matcher.find_best_match_in_roi(
                    probe.frame,
                    probe.ball_template,
                    probe.reference.roi(),
                )?;
                let present = found.is_some_and(|m| m.score < match_threshold);
                if !present {
                    return Ok(false);
                }
                let current = probe.reference.current(probe.frame)?;
                region_differs(current, probe.reference.view(), diff_threshold)
            }
        }
    }
}
