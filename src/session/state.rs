use crate::detect::{CrossingEvent, LineKind};
use crate::geom::{distance, Point};
use crate::session::BallState;

/// Calibration and tracking lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackingState {
    Idle,
    AwaitingMarkers,
    AwaitingBall,
    Armed,
    /// Both crossings recorded.
    Finished,
}

impl TrackingState {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingState::Idle => "idle",
            TrackingState::AwaitingMarkers => "awaiting_markers",
            TrackingState::AwaitingBall => "awaiting_ball",
            TrackingState::Armed => "armed",
            TrackingState::Finished => "finished",
        }
    }
}

/// Pointer input from the operator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    /// Release; this is what submits a marker or places the ball.
    Up(Point),
}

/// Read-only copy of the session handed to progress sinks and renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub state: TrackingState,
    pub markers: Vec<Point>,
    pub ball: Option<BallState>,
    /// Last pointer position while a press is in progress.
    pub cursor: Option<Point>,
    pub start: Option<CrossingEvent>,
    pub end: Option<CrossingEvent>,
}

impl SessionSnapshot {
    /// Index of the marker the operator should place next.
    pub fn next_marker_index(&self) -> Option<usize> {
        match self.state {
            TrackingState::AwaitingMarkers if self.markers.len() < 4 => Some(self.markers.len()),
            _ => None,
        }
    }

    /// The line the ball is expected to cross next.
    pub fn pending_line(&self) -> Option<LineKind> {
        pending_line(self.state, self.start.is_some(), self.end.is_some())
    }
}

pub(super) fn pending_line(state: TrackingState, started: bool, ended: bool) -> Option<LineKind> {
    match (state, started, ended) {
        (TrackingState::Armed, false, _) => Some(LineKind::Start),
        (TrackingState::Armed, true, false) => Some(LineKind::End),
        _ => None,
    }
}

/// Result of re-locating one marker in a later frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerDrift {
    pub index: usize,
    pub expected: Point,
    /// Matched position, `None` when the marker had no template or no
    /// placement fit the frame.
    pub observed: Option<Point>,
    pub score: Option<u64>,
}

impl MarkerDrift {
    /// Pixels between the recorded and observed positions.
    pub fn displacement(&self) -> Option<f32> {
        self.observed.map(|p| distance(self.expected, p))
    }
}
