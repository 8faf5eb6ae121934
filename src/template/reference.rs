//! Baseline patches of the region around a calibration line.

use crate::geom::Line;
use crate::image::{ImageView, OwnedImage, PixelRect};
use crate::roi::Roi;
use crate::util::{PuttrackError, PuttrackResult};

/// Pixel patch of a line's ROI captured during calibration.
///
/// Serves as the difference baseline for that line: later frames are cropped
/// to the same `rect` and compared against `image`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceRegion {
    roi: Roi,
    rect: PixelRect,
    image: OwnedImage,
}

impl ReferenceRegion {
    /// Captures the region around `line` expanded by `margin`.
    pub fn capture(frame: ImageView<'_, u8>, line: &Line, margin: f32) -> PuttrackResult<Self> {
        let roi = Roi::around_line(line, margin).clamped(frame.width(), frame.height());
        let rect = roi.pixel_rect();
        if rect.width == 0 || rect.height == 0 {
            return Err(PuttrackError::InvalidInput("line region lies outside the frame"));
        }
        let image = OwnedImage::crop_from(frame, rect)?;
        Ok(Self { roi, rect, image })
    }

    /// Clamped ROI the patch was taken from.
    pub fn roi(&self) -> &Roi {
        &self.roi
    }

    /// Integer crop rectangle in frame coordinates.
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    /// Borrowed view of the baseline pixels.
    pub fn view(&self) -> ImageView<'_, u8> {
        self.image.view()
    }

    /// Crops the same rectangle out of a later frame.
    pub fn current<'a>(&self, frame: ImageView<'a, u8>) -> PuttrackResult<ImageView<'a, u8>> {
        frame.crop(self.rect)
    }
}
