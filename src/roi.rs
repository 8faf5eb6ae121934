//! Axis-aligned regions of interest around calibration lines.
//!
//! An [`Roi`] is expressed in continuous pixel coordinates with inclusive
//! `min` and exclusive `max` edges. Before use it is clamped to the frame and
//! fitted to the template so that every candidate window lies inside both.

use crate::geom::{Line, Point};
use crate::image::PixelRect;

/// Axis-aligned bounding box in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Roi {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Roi {
    /// Bounding box of the endpoints expanded by `margin` on every side.
    pub fn around_line(line: &Line, margin: f32) -> Self {
        Self {
            min_x: line.p1.x.min(line.p2.x) - margin,
            min_y: line.p1.y.min(line.p2.y) - margin,
            max_x: line.p1.x.max(line.p2.x) + margin,
            max_y: line.p1.y.max(line.p2.y) + margin,
        }
    }

    /// Bounding box of the line grown by `margin_along` in the line direction
    /// and `margin_across` perpendicular to it.
    ///
    /// A degenerate (zero-length) line falls back to `margin_across` on all sides.
    pub fn around_line_anisotropic(line: &Line, margin_along: f32, margin_across: f32) -> Self {
        let len = line.length();
        if len <= f32::EPSILON {
            return Self::around_line(line, margin_across);
        }
        let ux = ((line.p2.x - line.p1.x) / len).abs();
        let uy = ((line.p2.y - line.p1.y) / len).abs();
        let grow_x = margin_along * ux + margin_across * uy;
        let grow_y = margin_along * uy + margin_across * ux;
        Self {
            min_x: line.p1.x.min(line.p2.x) - grow_x,
            min_y: line.p1.y.min(line.p2.y) - grow_y,
            max_x: line.p1.x.max(line.p2.x) + grow_x,
            max_y: line.p1.y.max(line.p2.y) + grow_y,
        }
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Clamps the bounds to `[0, width] × [0, height]`.
    pub fn clamped(&self, width: usize, height: usize) -> Self {
        let w = width as f32;
        let h = height as f32;
        let min_x = self.min_x.clamp(0.0, w);
        let min_y = self.min_y.clamp(0.0, h);
        Self {
            min_x,
            min_y,
            max_x: self.max_x.clamp(min_x, w),
            max_y: self.max_y.clamp(min_y, h),
        }
    }

    /// Clamps to the frame and makes room for a `tpl_width × tpl_height` window.
    ///
    /// A box narrower than the template is grown symmetrically, staying inside
    /// the frame. Returns `None` when the frame itself is smaller than the
    /// template.
    pub fn fit_template(
        &self,
        tpl_width: usize,
        tpl_height: usize,
        frame_width: usize,
        frame_height: usize,
    ) -> Option<Self> {
        if tpl_width > frame_width || tpl_height > frame_height {
            return None;
        }
        let clamped = self.clamped(frame_width, frame_height);
        let (min_x, max_x) = grow_axis(
            clamped.min_x,
            clamped.max_x,
            tpl_width as f32,
            frame_width as f32,
        );
        let (min_y, max_y) = grow_axis(
            clamped.min_y,
            clamped.max_y,
            tpl_height as f32,
            frame_height as f32,
        );
        Some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Inclusive range of template top-left placements inside the box.
    ///
    /// Returns `(x0, y0, x1, y1)` or `None` when no window fits.
    pub fn placement_range(
        &self,
        tpl_width: usize,
        tpl_height: usize,
    ) -> Option<(usize, usize, usize, usize)> {
        let x0 = self.min_x.max(0.0).ceil();
        let y0 = self.min_y.max(0.0).ceil();
        let x1 = self.max_x.floor() - tpl_width as f32;
        let y1 = self.max_y.floor() - tpl_height as f32;
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    /// Returns true when a window centered at `p` fits inside the box.
    pub fn admits_center(&self, p: Point, tpl_width: usize, tpl_height: usize) -> bool {
        let half_w = (tpl_width / 2) as f32;
        let half_h = (tpl_height / 2) as f32;
        match self.placement_range(tpl_width, tpl_height) {
            Some((x0, y0, x1, y1)) => {
                let x = p.x.round() - half_w;
                let y = p.y.round() - half_h;
                x >= x0 as f32 && x <= x1 as f32 && y >= y0 as f32 && y <= y1 as f32
            }
            None => false,
        }
    }

    /// Integer rectangle covering the box (floor of min, ceil of max).
    ///
    /// Callers clamp first; negative bounds saturate to zero.
    pub fn pixel_rect(&self) -> PixelRect {
        let x = self.min_x.max(0.0).floor() as usize;
        let y = self.min_y.max(0.0).floor() as usize;
        let right = self.max_x.max(0.0).ceil() as usize;
        let bottom = self.max_y.max(0.0).ceil() as usize;
        PixelRect {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }
}

fn grow_axis(min: f32, max: f32, needed: f32, limit: f32) -> (f32, f32) {
    // Whole pixels, so a wide enough span always holds an integer placement.
    let (min, max) = (min.floor(), max.ceil().min(limit));
    let span = max - min;
    if span >= needed {
        return (min, max);
    }
    let deficit = needed - span;
    let mut lo = min - deficit * 0.5;
    let mut hi = max + deficit * 0.5;
    if lo < 0.0 {
        hi -= lo;
        lo = 0.0;
    }
    if hi > limit {
        lo -= hi - limit;
        hi = limit;
    }
    (lo.max(0.0).floor(), hi.min(limit).ceil())
}
