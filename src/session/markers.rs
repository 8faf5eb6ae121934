use crate::detect::LineKind;
use crate::geom::{Line, Point};
use crate::util::{PuttrackError, PuttrackResult};

/// The four calibration markers in submission order.
///
/// Markers 0 and 1 define the start line, markers 2 and 3 the end line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerSet {
    points: [Point; 4],
}

impl MarkerSet {
    pub fn new(points: [Point; 4]) -> Self {
        Self { points }
    }

    /// Builds a set from exactly four points.
    pub fn from_slice(points: &[Point]) -> PuttrackResult<Self> {
        let points: [Point; 4] = points
            .try_into()
            .map_err(|_| PuttrackError::InsufficientMarkers { got: points.len() })?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.points
    }

    pub fn start_line(&self) -> Line {
        Line::new(self.points[0], self.points[1])
    }

    pub fn end_line(&self) -> Line {
        Line::new(self.points[2], self.points[3])
    }

    pub fn line(&self, kind: LineKind) -> Line {
        match kind {
            LineKind::Start => self.start_line(),
            LineKind::End => self.end_line(),
        }
    }
}

impl TryFrom<&[Point]> for MarkerSet {
    type Error = PuttrackError;

    fn try_from(points: &[Point]) -> PuttrackResult<Self> {
        Self::from_slice(points)
    }
}
