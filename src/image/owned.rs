//! Owned contiguous grayscale buffers.

use crate::image::{ImageView, PixelRect};
use crate::util::{PuttrackError, PuttrackResult};

/// Integer BT.601 luma, `(77 r + 150 g + 29 b + 128) >> 8`.
#[inline]
pub fn luma_from_rgb(r: u8, g: u8, b: u8) -> u8 {
    let sum = 77 * u32::from(r) + 150 * u32::from(g) + 29 * u32::from(b) + 128;
    (sum >> 8) as u8
}

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a contiguous buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> PuttrackResult<Self> {
        if width == 0 || height == 0 {
            return Err(PuttrackError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(PuttrackError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(PuttrackError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(PuttrackError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Creates an image filled with `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> PuttrackResult<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(PuttrackError::InvalidDimensions { width, height })?;
        Self::new(vec![value; len], width, height)
    }

    /// Converts an interleaved RGBA buffer (as read back from a canvas) to gray.
    pub fn from_rgba8(rgba: &[u8], width: usize, height: usize) -> PuttrackResult<Self> {
        let count = width
            .checked_mul(height)
            .ok_or(PuttrackError::InvalidDimensions { width, height })?;
        let needed = count
            .checked_mul(4)
            .ok_or(PuttrackError::InvalidDimensions { width, height })?;
        if rgba.len() != needed {
            return Err(PuttrackError::BufferTooSmall {
                needed,
                got: rgba.len(),
            });
        }
        let data = rgba
            .chunks_exact(4)
            .map(|px| luma_from_rgb(px[0], px[1], px[2]))
            .collect();
        Self::new(data, width, height)
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> PuttrackResult<Self> {
        let width = view.width();
        let height = view.height();
        let needed = width
            .checked_mul(height)
            .ok_or(PuttrackError::InvalidDimensions { width, height })?;
        let mut data = Vec::with_capacity(needed);
        for y in 0..height {
            let row = view.row(y).ok_or(PuttrackError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Copies `rect` out of `view`.
    pub fn crop_from(view: ImageView<'_, u8>, rect: PixelRect) -> PuttrackResult<Self> {
        Self::from_view(view.crop(rect)?)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the contiguous pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Returns mutable pixel data, used to draw synthetic frames.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}
