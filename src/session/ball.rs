use crate::config::TrackerConfig;
use crate::geom::{distance, Line, Point};
use crate::kernel::ScanWindow;
use crate::roi::Roi;
use crate::search::{search_radius, search_window, Match, Matcher};
use crate::template::Template;
use crate::util::PuttrackResult;
use crate::ImageView;

/// Ball position over the last two tracked frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallState {
    pub current: Point,
    pub previous: Point,
}

/// Outcome of one tracking step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BallStep {
    /// Segment from the previous to the new position.
    pub path: Line,
    pub found: Option<Match>,
    /// Center the search window was placed on.
    pub predicted: Point,
    pub radius: usize,
    pub window: Option<ScanWindow>,
    /// The search was restricted to a line ROI.
    pub gated: bool,
}

impl BallState {
    /// A ball at rest at `p`.
    pub fn at(p: Point) -> Self {
        Self {
            current: p,
            previous: p,
        }
    }

    /// Displacement over the last frame, in pixels.
    pub fn speed_px(&self) -> f32 {
        distance(self.previous, self.current)
    }

    pub fn path(&self) -> Line {
        Line::new(self.previous, self.current)
    }

    /// Where the next search is centered.
    pub fn predicted(&self, predict_motion: bool) -> Point {
        if predict_motion {
            self.current.extrapolate_from(self.previous)
        } else {
            self.current
        }
    }

    /// Locates the ball in `frame` and shifts the position history.
    ///
    /// `gate` is only applied when it admits the predicted window. Without a
    /// match the ball is treated as stationary.
    pub(crate) fn advance(
        &mut self,
        frame: ImageView<'_, u8>,
        template: &Template,
        matcher: &Matcher,
        cfg: &TrackerConfig,
        gate: Option<&Roi>,
    ) -> PuttrackResult<BallStep> {
        let predicted = self.predicted(cfg.predict_motion);
        let radius = search_radius(cfg.base_radius, self.speed_px(), cfg.max_radius);
        let gate =
            gate.filter(|roi| roi.admits_center(predicted, template.width(), template.height()));
        let window = search_window(
            frame.width(),
            frame.height(),
            template,
            predicted,
            radius,
            gate,
        );
        let found = match window {
            Some(window) => matcher.find_best_match_in_window(frame, template, window)?,
            None => None,
        };

        self.previous = self.current;
        if let Some(m) = found {
            self.current = m.center;
        }
        Ok(BallStep {
            path: self.path(),
            found,
            predicted,
            radius,
            window,
            gated: gate.is_some(),
        })
    }
}
