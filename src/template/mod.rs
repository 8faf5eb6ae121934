//! Fixed-size reference patches captured from a frame.

use crate::geom::Point;
use crate::image::{ImageView, OwnedImage, PixelRect};
use crate::util::{PuttrackError, PuttrackResult};

mod reference;

pub use reference::ReferenceRegion;

/// Owned square template in contiguous grayscale format.
///
/// A template is captured once and never modified; re-calibration replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    img: OwnedImage,
}

impl Template {
    /// Creates a template from a contiguous grayscale buffer.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> PuttrackResult<Self> {
        let img = OwnedImage::new(data, width, height)?;
        Ok(Self { img })
    }

    /// Extracts the `size × size` window centered at `center`.
    ///
    /// The window's top-left corner is `round(center) - size / 2`. A window
    /// that would read outside `frame` is rejected rather than clipped.
    pub fn capture(frame: ImageView<'_, u8>, center: Point, size: usize) -> PuttrackResult<Self> {
        let rect = capture_rect(frame.width(), frame.height(), center, size)?;
        let img = OwnedImage::crop_from(frame, rect)?;
        Ok(Self { img })
    }

    /// Returns a borrowed view of the template data.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.img.view()
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.img.width()
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.img.height()
    }

    /// Offset from a window's top-left corner to its center.
    pub fn center_offset(&self) -> (usize, usize) {
        (self.width() / 2, self.height() / 2)
    }
}

/// Computes the crop rectangle for a template centered at `center`.
pub(crate) fn capture_rect(
    img_width: usize,
    img_height: usize,
    center: Point,
    size: usize,
) -> PuttrackResult<PixelRect> {
    if size == 0 {
        return Err(PuttrackError::InvalidDimensions {
            width: size,
            height: size,
        });
    }
    let out_of_bounds = PuttrackError::TemplateOutOfBounds {
        x: center.x,
        y: center.y,
        size,
        img_width,
        img_height,
    };
    if !center.is_finite() {
        return Err(out_of_bounds);
    }
    let half = (size / 2) as f32;
    let x0 = center.x.round() - half;
    let y0 = center.y.round() - half;
    // Bounds are checked in f32 so huge coordinates never reach the casts.
    let extent = size as f32;
    if x0 < 0.0
        || y0 < 0.0
        || x0 + extent > img_width as f32
        || y0 + extent > img_height as f32
    {
        return Err(out_of_bounds);
    }
    let x0 = x0 as usize;
    let y0 = y0 as usize;
    if x0.saturating_add(size) > img_width || y0.saturating_add(size) > img_height {
        return Err(out_of_bounds);
    }
    Ok(PixelRect {
        x: x0,
        y: y0,
        width: size,
        height: size,
    })
}
