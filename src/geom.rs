//! Planar geometry in frame-buffer pixel coordinates.

/// A point in frame-buffer pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// Column coordinate.
    pub x: f32,
    /// Row coordinate.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns `self + (self - origin)`, the constant-velocity extrapolation.
    pub fn extrapolate_from(self, origin: Point) -> Point {
        Point::new(2.0 * self.x - origin.x, 2.0 * self.y - origin.y)
    }

    pub(crate) fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A line segment between two calibration markers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub p1: Point,
    pub p2: Point,
}

impl Line {
    /// Creates a segment from `p1` to `p2`.
    pub const fn new(p1: Point, p2: Point) -> Self {
        Self { p1, p2 }
    }

    /// Segment length in pixels.
    pub fn length(&self) -> f32 {
        distance(self.p1, self.p2)
    }

    /// Midpoint of the segment.
    pub fn midpoint(&self) -> Point {
        midpoint(self.p1, self.p2)
    }

    /// Returns true when this segment and `other` share at least one point.
    pub fn intersects(&self, other: &Line) -> bool {
        segments_intersect(self.p1, self.p2, other.p1, other.p2)
    }
}

/// Euclidean distance between two points.
pub fn distance(p: Point, q: Point) -> f32 {
    let dx = q.x - p.x;
    let dy = q.y - p.y;
    (dx * dx + dy * dy).sqrt()
}

/// Midpoint between two points.
pub fn midpoint(p: Point, q: Point) -> Point {
    Point::new((p.x + q.x) * 0.5, (p.y + q.y) * 0.5)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val == 0.0 {
        Orientation::Collinear
    } else if val > 0.0 {
        Orientation::Clockwise
    } else {
        Orientation::CounterClockwise
    }
}

/// Returns true when `q` lies inside the bounding box of segment `p`-`r`.
fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Tests whether segment `p1`-`p2` intersects segment `p3`-`p4`.
///
/// Touching at an endpoint and collinear overlap both count as intersecting.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    let o1 = orientation(p1, p2, p3);
    let o2 = orientation(p1, p2, p4);
    let o3 = orientation(p3, p4, p1);
    let o4 = orientation(p3, p4, p2);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == Orientation::Collinear && on_segment(p1, p3, p2))
        || (o2 == Orientation::Collinear && on_segment(p1, p4, p2))
        || (o3 == Orientation::Collinear && on_segment(p3, p1, p4))
        || (o4 == Orientation::Collinear && on_segment(p3, p2, p4))
}
