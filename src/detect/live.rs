//! Per-frame crossing detection for a live stream.

use crate::detect::{CrossingDetector, CrossingEvent, LineKind, LineProbe};
use crate::geom::Line;
use crate::kernel::ScanWindow;
use crate::roi::Roi;
use crate::search::Matcher;
use crate::session::{SessionSnapshot, TrackingSession};
use crate::trace::{trace_event, trace_span};
use crate::util::PuttrackResult;
use crate::ImageView;

/// Receives recording signals keyed to line crossings.
pub trait RecordingSink {
    /// The start line was crossed.
    fn start(&mut self);
    /// The end line was crossed, or the session was superseded mid-recording.
    fn stop(&mut self);
}

/// Sink that ignores recording signals.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRecorder;

impl RecordingSink for NullRecorder {
    fn start(&mut self) {}
    fn stop(&mut self) {}
}

/// Debug geometry for the render sink.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DebugOverlay {
    pub search_window: Option<ScanWindow>,
    pub path: Option<Line>,
    pub active_roi: Option<Roi>,
    pub match_score: Option<u64>,
}

/// Outcome of one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TickReport {
    pub snapshot: SessionSnapshot,
    /// Crossing recorded during this tick.
    pub crossing: Option<CrossingEvent>,
    pub overlay: DebugOverlay,
}

/// Drives tracking and crossing detection once per rendered frame.
#[derive(Clone, Debug)]
pub struct LiveEventDetector {
    detector: CrossingDetector,
    matcher: Matcher,
    restrict_to_line_roi: bool,
    bound_epoch: Option<u64>,
    frames: u64,
    recording: bool,
}

impl LiveEventDetector {
    pub fn new(detector: CrossingDetector) -> Self {
        Self {
            detector,
            matcher: Matcher::new(),
            restrict_to_line_roi: false,
            bound_epoch: None,
            frames: 0,
            recording: false,
        }
    }

    /// Detector configured from a session's tracker settings.
    pub fn for_session(session: &TrackingSession) -> Self {
        let cfg = session.config();
        Self::new(cfg.crossing)
            .with_matcher(Matcher::new().with_parallel(cfg.parallel))
            .with_line_roi_restriction(cfg.restrict_to_line_roi)
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn with_line_roi_restriction(mut self, restrict: bool) -> Self {
        self.restrict_to_line_roi = restrict;
        self
    }

    /// Frames tracked since the session armed.
    pub fn frames_tracked(&self) -> u64 {
        self.frames
    }

    /// Processes one frame captured at `timestamp` seconds.
    pub fn tick(
        &mut self,
        session: &mut TrackingSession,
        frame: ImageView<'_, u8>,
        timestamp: f64,
        recorder: &mut dyn RecordingSink,
    ) -> PuttrackResult<TickReport> {
        self.bind(session.epoch(), recorder);
        session.poll(timestamp);

        let mut overlay = DebugOverlay::default();
        let Some(target) = session.next_line() else {
            return Ok(self.report(session, None, overlay));
        };
        let _span = trace_span!("live_tick", frame = self.frames).entered();

        let gate = if self.restrict_to_line_roi {
            session.tracking_roi(target, frame.width(), frame.height())
        } else {
            None
        };
        let step = session.track_ball(frame, &self.matcher, gate.as_ref())?;
        let frame_index = self.frames;
        self.frames += 1;
        overlay.search_window = step.window;
        overlay.path = Some(step.path);
        overlay.active_roi = if step.gated { gate } else { None };
        overlay.match_score = step.found.map(|m| m.score);

        let line = session.line(target);
        let crossed = match (line, session.ball_template(), session.reference(target)) {
            (Some(line), Some(ball_template), Some(reference)) => {
                let probe = LineProbe {
                    frame,
                    line,
                    path: step.path,
                    ball_template,
                    reference,
                };
                self.detector.is_crossing(&probe, &self.matcher)?
            }
            _ => false,
        };
        if !crossed || !session.record_crossing(target, timestamp, Some(frame_index))? {
            return Ok(self.report(session, None, overlay));
        }

        trace_event!("live_crossing", line = target.as_str(), frame = frame_index);
        match target {
            LineKind::Start => {
                recorder.start();
                self.recording = true;
            }
            LineKind::End => {
                recorder.stop();
                self.recording = false;
            }
        }
        let crossing = session.crossing(target);
        Ok(self.report(session, crossing, overlay))
    }

    fn bind(&mut self, epoch: u64, recorder: &mut dyn RecordingSink) {
        if self.bound_epoch == Some(epoch) {
            return;
        }
        if self.recording {
            recorder.stop();
            self.recording = false;
        }
        self.bound_epoch = Some(epoch);
        self.frames = 0;
    }

    fn report(
        &self,
        session: &TrackingSession,
        crossing: Option<CrossingEvent>,
        overlay: DebugOverlay,
    ) -> TickReport {
        TickReport {
            snapshot: session.snapshot(),
            crossing,
            overlay,
        }
    }
}

impl Default for LiveEventDetector {
    fn default() -> Self {
        Self::new(CrossingDetector::PathIntersection)
    }
}

