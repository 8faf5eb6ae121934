//! Calibration state machine and tracking session.
//!
//! A session walks through `Idle → AwaitingMarkers → AwaitingBall → Armed`
//! and ends in `Finished` once both lines have been crossed. Every setup
//! bumps the session epoch; work started under an older epoch is rejected.
//!
//! Captured templates and reference regions are immutable. Re-running setup
//! replaces them wholesale.

use crate::config::TrackerConfig;
use crate::detect::{CrossingEvent, LineKind};
use crate::geom::{Line, Point};
use crate::roi::Roi;
use crate::search::Matcher;
use crate::speed::{compute_speed, SpeedResult};
use crate::template::{ReferenceRegion, Template};
use crate::trace::{trace_event, trace_warn};
use crate::util::{PuttrackError, PuttrackResult};
use crate::ImageView;

mod ball;
mod epoch;
mod markers;
mod state;

pub use ball::{BallState, BallStep};
pub use epoch::EpochHandle;
pub use markers::MarkerSet;
pub use state::{MarkerDrift, PointerEvent, SessionSnapshot, TrackingState};

/// Receives a snapshot after every state-relevant change.
pub trait ProgressSink {
    fn on_progress(&mut self, snapshot: &SessionSnapshot);
}

impl<F> ProgressSink for F
where
    F: FnMut(&SessionSnapshot),
{
    fn on_progress(&mut self, snapshot: &SessionSnapshot) {
        self(snapshot)
    }
}

/// Immutable copy of a completed calibration, bound to its epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    pub epoch: u64,
    pub markers: MarkerSet,
    pub ball_template: Template,
    /// Ball center at placement time.
    pub ball_origin: Point,
    pub config: TrackerConfig,
}

impl Calibration {
    /// Tracking ROI around `line`, fitted to a frame of the given size.
    pub fn tracking_roi(&self, line: LineKind, frame_width: usize, frame_height: usize) -> Option<Roi> {
        tracking_roi(
            &self.config,
            &self.markers.line(line),
            &self.ball_template,
            frame_width,
            frame_height,
        )
    }
}

fn tracking_roi(
    cfg: &TrackerConfig,
    line: &Line,
    template: &Template,
    frame_width: usize,
    frame_height: usize,
) -> Option<Roi> {
    Roi::around_line_anisotropic(line, cfg.roi_margin_along, cfg.roi_margin_across).fit_template(
        template.width(),
        template.height(),
        frame_width,
        frame_height,
    )
}

/// A single putt measurement from calibration to the end-line crossing.
pub struct TrackingSession {
    cfg: TrackerConfig,
    state: TrackingState,
    epoch: EpochHandle,
    markers: Vec<Point>,
    marker_templates: Vec<Option<Template>>,
    start_reference: Option<ReferenceRegion>,
    end_reference: Option<ReferenceRegion>,
    ball: Option<BallState>,
    ball_template: Option<Template>,
    ball_origin: Option<Point>,
    arm_at: Option<f64>,
    cursor: Option<Point>,
    start: Option<CrossingEvent>,
    end: Option<CrossingEvent>,
    progress: Option<Box<dyn ProgressSink>>,
}

impl TrackingSession {
    /// Creates an idle session with no calibration.
    pub fn new(cfg: TrackerConfig) -> Self {
        Self {
            cfg,
            state: TrackingState::Idle,
            epoch: EpochHandle::default(),
            markers: Vec::new(),
            marker_templates: Vec::new(),
            start_reference: None,
            end_reference: None,
            ball: None,
            ball_template: None,
            ball_origin: None,
            arm_at: None,
            cursor: None,
            start: None,
            end: None,
            progress: None,
        }
    }

    /// Installs a sink that is called once per state-relevant change.
    pub fn with_progress<P: ProgressSink + 'static>(mut self, sink: P) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    /// Returns the tracker configuration.
    pub fn config(&self) -> &TrackerConfig {
        &self.cfg
    }

    /// Returns the current state.
    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Returns the current setup generation.
    pub fn epoch(&self) -> u64 {
        self.epoch.current()
    }

    /// Shared handle for work that must stop when this session is re-set-up.
    pub fn epoch_handle(&self) -> EpochHandle {
        self.epoch.clone()
    }

    /// Markers placed so far, in placement order.
    pub fn markers(&self) -> &[Point] {
        &self.markers
    }

    /// The full marker set, once four markers are in.
    pub fn marker_set(&self) -> PuttrackResult<MarkerSet> {
        MarkerSet::from_slice(&self.markers)
    }

    /// Ball position history, once the ball is placed.
    pub fn ball(&self) -> Option<BallState> {
        self.ball
    }

    /// Template captured at ball placement.
    pub fn ball_template(&self) -> Option<&Template> {
        self.ball_template.as_ref()
    }

    /// Calibration patch of the region around `line`.
    pub fn reference(&self, line: LineKind) -> Option<&ReferenceRegion> {
        match line {
            LineKind::Start => self.start_reference.as_ref(),
            LineKind::End => self.end_reference.as_ref(),
        }
    }

    /// Recorded crossing of `line`, if any.
    pub fn crossing(&self, line: LineKind) -> Option<CrossingEvent> {
        match line {
            LineKind::Start => self.start,
            LineKind::End => self.end,
        }
    }

    /// The line the ball is expected to cross next, while armed.
    pub fn next_line(&self) -> Option<LineKind> {
        state::pending_line(self.state, self.start.is_some(), self.end.is_some())
    }

    /// Calibration line segment, once its markers exist.
    pub fn line(&self, line: LineKind) -> Option<Line> {
        let (a, b) = match line {
            LineKind::Start => (0, 1),
            LineKind::End => (2, 3),
        };
        Some(Line::new(*self.markers.get(a)?, *self.markers.get(b)?))
    }

    /// Tracking ROI around `line` for a frame of the given size.
    pub fn tracking_roi(&self, line: LineKind, frame_width: usize, frame_height: usize) -> Option<Roi> {
        let template = self.ball_template.as_ref()?;
        tracking_roi(&self.cfg, &self.line(line)?, template, frame_width, frame_height)
    }

    /// Discards all calibration data and starts a new epoch.
    pub fn start_setup(&mut self) -> u64 {
        let epoch = self.epoch.advance();
        self.state = TrackingState::AwaitingMarkers;
        self.markers.clear();
        self.marker_templates.clear();
        self.start_reference = None;
        self.end_reference = None;
        self.ball = None;
        self.ball_template = None;
        self.ball_origin = None;
        self.arm_at = None;
        self.cursor = None;
        self.start = None;
        self.end = None;
        trace_event!("setup_started", epoch = epoch);
        self.notify();
        epoch
    }

    /// Records a marker and returns the number placed so far.
    ///
    /// The fourth marker captures both line reference regions from `frame`
    /// and moves the session to `AwaitingBall`.
    pub fn submit_marker(&mut self, frame: ImageView<'_, u8>, point: Point) -> PuttrackResult<usize> {
        self.require(TrackingState::AwaitingMarkers)?;
        if !point.is_finite() {
            return Err(PuttrackError::InvalidInput("marker coordinates must be finite"));
        }
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        if point.x < 0.0 || point.y < 0.0 || point.x > w || point.y > h {
            return Err(PuttrackError::InvalidInput("marker lies outside the frame"));
        }

        let template = match Template::capture(frame, point, self.cfg.marker_template_size) {
            Ok(template) => Some(template),
            Err(_) => {
                trace_warn!(
                    "marker_template_skipped",
                    index = self.markers.len(),
                    x = point.x,
                    y = point.y
                );
                None
            }
        };

        if self.markers.len() == 3 {
            let markers = MarkerSet::new([self.markers[0], self.markers[1], self.markers[2], point]);
            let margin = self.cfg.reference_margin;
            let start = ReferenceRegion::capture(frame, &markers.start_line(), margin)?;
            let end = ReferenceRegion::capture(frame, &markers.end_line(), margin)?;
            self.start_reference = Some(start);
            self.end_reference = Some(end);
            self.state = TrackingState::AwaitingBall;
        }
        self.markers.push(point);
        self.marker_templates.push(template);
        trace_event!("marker_placed", index = self.markers.len() - 1, x = point.x, y = point.y);
        self.notify();
        Ok(self.markers.len())
    }

    /// Captures the ball template centered at `point`.
    ///
    /// With a zero settle delay the session arms immediately; otherwise it
    /// arms on the first [`poll`](Self::poll) at or after `now + delay`.
    pub fn place_ball(&mut self, frame: ImageView<'_, u8>, point: Point, now: f64) -> PuttrackResult<()> {
        self.require(TrackingState::AwaitingBall)?;
        if self.ball.is_some() {
            return Err(PuttrackError::InvalidInput("ball already placed"));
        }
        let template = Template::capture(frame, point, self.cfg.ball_template_size)?;
        self.ball_template = Some(template);
        self.ball = Some(BallState::at(point));
        self.ball_origin = Some(point);
        trace_event!("ball_placed", x = point.x, y = point.y);
        if self.cfg.settle_delay_s <= 0.0 {
            self.arm();
        } else {
            self.arm_at = Some(now + self.cfg.settle_delay_s);
            self.notify();
        }
        Ok(())
    }

    /// Arms the session once the settle delay has elapsed.
    pub fn poll(&mut self, now: f64) -> TrackingState {
        if self.state == TrackingState::AwaitingBall {
            if let Some(at) = self.arm_at {
                if now >= at {
                    self.arm();
                }
            }
        }
        self.state
    }

    fn arm(&mut self) {
        self.arm_at = None;
        self.state = TrackingState::Armed;
        trace_event!("armed", epoch = self.epoch());
        self.notify();
    }

    /// Routes operator pointer input.
    ///
    /// Release submits a marker or places the ball depending on the state;
    /// it is ignored while idle, armed or finished.
    pub fn handle_pointer(
        &mut self,
        event: PointerEvent,
        frame: ImageView<'_, u8>,
        now: f64,
    ) -> PuttrackResult<()> {
        match event {
            PointerEvent::Down(p) | PointerEvent::Move(p) => {
                self.cursor = Some(p);
                Ok(())
            }
            PointerEvent::Up(p) => {
                self.cursor = None;
                match self.state {
                    TrackingState::AwaitingMarkers => self.submit_marker(frame, p).map(|_| ()),
                    TrackingState::AwaitingBall => self.place_ball(frame, p, now),
                    _ => Ok(()),
                }
            }
        }
    }

    /// Runs one tracking step against `frame`.
    pub fn track_ball(
        &mut self,
        frame: ImageView<'_, u8>,
        matcher: &Matcher,
        gate: Option<&Roi>,
    ) -> PuttrackResult<BallStep> {
        self.require(TrackingState::Armed)?;
        let (Some(ball), Some(template)) = (self.ball.as_mut(), self.ball_template.as_ref()) else {
            return Err(PuttrackError::InvalidInput("armed session without a ball"));
        };
        ball.advance(frame, template, matcher, &self.cfg, gate)
    }

    /// Records a crossing of `line`.
    ///
    /// Returns `Ok(false)` if that line was already recorded. The end line
    /// can only be recorded after the start line.
    pub fn record_crossing(
        &mut self,
        line: LineKind,
        timestamp: f64,
        frame_index: Option<u64>,
    ) -> PuttrackResult<bool> {
        if self.state == TrackingState::Finished {
            return Ok(false);
        }
        self.require(TrackingState::Armed)?;
        let event = CrossingEvent {
            line,
            timestamp,
            frame_index,
        };
        match line {
            LineKind::Start => {
                if self.start.is_some() {
                    return Ok(false);
                }
                self.start = Some(event);
            }
            LineKind::End => {
                if self.start.is_none() {
                    return Err(PuttrackError::InvalidInput(
                        "end line crossed before the start line",
                    ));
                }
                self.end = Some(event);
                self.state = TrackingState::Finished;
            }
        }
        trace_event!("line_crossed", line = line.as_str(), timestamp = timestamp);
        self.notify();
        Ok(true)
    }

    /// Copies the state reported to progress sinks.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            epoch: self.epoch(),
            state: self.state,
            markers: self.markers.clone(),
            ball: self.ball,
            cursor: self.cursor,
            start: self.start,
            end: self.end,
        }
    }

    /// Copies the calibration for analysis outside the session.
    pub fn calibration(&self) -> PuttrackResult<Calibration> {
        let (Some(template), Some(origin)) = (self.ball_template.as_ref(), self.ball_origin) else {
            return Err(PuttrackError::InvalidState {
                expected: TrackingState::Armed.as_str(),
                actual: self.state.as_str(),
            });
        };
        Ok(Calibration {
            epoch: self.epoch(),
            markers: self.marker_set()?,
            ball_template: template.clone(),
            ball_origin: origin,
            config: self.cfg,
        })
    }

    /// Re-locates each marker in `frame` within `radius` of its recorded
    /// position. The recorded markers are left as they are.
    pub fn check_marker_drift(
        &self,
        frame: ImageView<'_, u8>,
        radius: usize,
    ) -> PuttrackResult<Vec<MarkerDrift>> {
        let matcher = Matcher::new().with_parallel(self.cfg.parallel);
        let mut drifts = Vec::with_capacity(self.markers.len());
        for (index, (&expected, template)) in
            self.markers.iter().zip(&self.marker_templates).enumerate()
        {
            let found = match template {
                Some(template) => {
                    matcher.find_best_match(frame, template, expected, radius, None)?
                }
                None => None,
            };
            drifts.push(MarkerDrift {
                index,
                expected,
                observed: found.map(|m| m.center),
                score: found.map(|m| m.score),
            });
        }
        Ok(drifts)
    }

    /// Speed between the recorded crossings.
    pub fn speed(&self, known_length: f64) -> PuttrackResult<SpeedResult> {
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(PuttrackError::InvalidState {
                expected: TrackingState::Finished.as_str(),
                actual: self.state.as_str(),
            });
        };
        compute_speed(start.timestamp, end.timestamp, &self.marker_set()?, known_length)
    }

    fn require(&self, expected: TrackingState) -> PuttrackResult<()> {
        if self.state != expected {
            return Err(PuttrackError::InvalidState {
                expected: expected.as_str(),
                actual: self.state.as_str(),
            });
        }
        Ok(())
    }

    fn notify(&mut self) {
        if self.progress.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(sink) = self.progress.as_mut() {
            sink.on_progress(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PointerEvent, TrackingSession, TrackingState};
    use crate::config::TrackerConfig;
    use crate::detect::LineKind;
    use crate::geom::Point;
    use crate::image::OwnedImage;
    use crate::util::PuttrackError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn frame() -> OwnedImage {
        let mut rng = StdRng::seed_from_u64(11);
        let data = (0..120 * 120).map(|_| rng.random_range(0..=255)).collect();
        OwnedImage::new(data, 120, 120).unwrap()
    }

    fn cfg() -> TrackerConfig {
        TrackerConfig {
            ball_template_size: 10,
            marker_template_size: 10,
            settle_delay_s: 0.0,
            ..TrackerConfig::default()
        }
    }

    fn calibrated(cfg: TrackerConfig) -> (TrackingSession, OwnedImage) {
        let img = frame();
        let mut session = TrackingSession::new(cfg);
        session.start_setup();
        for p in [(20.0, 30.0), (100.0, 30.0), (20.0, 90.0), (100.0, 90.0)] {
            session.submit_marker(img.view(), Point::new(p.0, p.1)).unwrap();
        }
        (session, img)
    }

    #[test]
    fn fourth_marker_captures_references() {
        let (session, _) = calibrated(cfg());
        assert_eq!(session.state(), TrackingState::AwaitingBall);
        assert!(session.reference(LineKind::Start).is_some());
        assert!(session.reference(LineKind::End).is_some());
        assert_eq!(session.marker_set().unwrap().end_line().p1, Point::new(20.0, 90.0));
    }

    #[test]
    fn fifth_marker_is_rejected_without_change() {
        let (mut session, img) = calibrated(cfg());
        let before = session.snapshot();
        let err = session.submit_marker(img.view(), Point::new(5.0, 5.0)).unwrap_err();
        assert_eq!(
            err,
            PuttrackError::InvalidState {
                expected: "awaiting_markers",
                actual: "awaiting_ball"
            }
        );
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn settle_delay_arms_on_poll() {
        let (mut session, img) = calibrated(TrackerConfig {
            settle_delay_s: 0.5,
            ..cfg()
        });
        session.place_ball(img.view(), Point::new(60.0, 10.0), 1.0).unwrap();
        assert_eq!(session.poll(1.2), TrackingState::AwaitingBall);
        assert_eq!(session.poll(1.5), TrackingState::Armed);
    }

    #[test]
    fn ball_near_edge_leaves_session_unchanged() {
        let (mut session, img) = calibrated(cfg());
        assert!(session.place_ball(img.view(), Point::new(1.0, 1.0), 0.0).is_err());
        assert_eq!(session.state(), TrackingState::AwaitingBall);
        assert!(session.ball().is_none());
    }

    #[test]
    fn pointer_release_drives_setup() {
        let img = frame();
        let mut session = TrackingSession::new(cfg());
        session.start_setup();
        for p in [(20.0, 30.0), (100.0, 30.0), (20.0, 90.0), (100.0, 90.0), (60.0, 10.0)] {
            let p = Point::new(p.0, p.1);
            session.handle_pointer(PointerEvent::Down(p), img.view(), 0.0).unwrap();
            assert_eq!(session.snapshot().cursor, Some(p));
            session.handle_pointer(PointerEvent::Up(p), img.view(), 0.0).unwrap();
        }
        assert_eq!(session.state(), TrackingState::Armed);
        assert_eq!(session.snapshot().cursor, None);
    }

    #[test]
    fn end_before_start_is_rejected() {
        let (mut session, img) = calibrated(cfg());
        session.place_ball(img.view(), Point::new(60.0, 10.0), 0.0).unwrap();
        assert!(session.record_crossing(LineKind::End, 1.0, None).is_err());
        assert!(session.record_crossing(LineKind::Start, 1.0, None).unwrap());
        assert!(!session.record_crossing(LineKind::Start, 1.1, None).unwrap());
        assert!(session.record_crossing(LineKind::End, 2.0, None).unwrap());
        assert_eq!(session.state(), TrackingState::Finished);
        assert!(!session.record_crossing(LineKind::End, 3.0, None).unwrap());
        assert_eq!(session.crossing(LineKind::End).map(|e| e.timestamp), Some(2.0));
    }

    #[test]
    fn new_setup_supersedes_epoch() {
        let (mut session, _) = calibrated(cfg());
        let handle = session.epoch_handle();
        let epoch = session.epoch();
        session.start_setup();
        assert!(handle.ensure_current(epoch).is_err());
        assert!(session.markers().is_empty());
        assert_eq!(session.state(), TrackingState::AwaitingMarkers);
    }

    #[test]
    fn drift_check_finds_static_markers() {
        let (session, img) = calibrated(cfg());
        let drifts = session
            .check_marker_drift(img.view(), 12)
            .unwrap();
        assert_eq!(drifts.len(), 4);
        for drift in drifts {
            assert_eq!(drift.score, Some(0));
            assert_eq!(drift.displacement(), Some(0.0));
        }
    }
}
