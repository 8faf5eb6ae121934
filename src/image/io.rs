//! Convenience helpers for loading frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::OwnedImage;
use crate::util::{PuttrackError, PuttrackResult};
use std::path::{Path, PathBuf};

/// Creates an owned image from a grayscale image buffer.
pub fn owned_from_gray_image(img: &image::GrayImage) -> PuttrackResult<OwnedImage> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    OwnedImage::new(img.as_raw().clone(), width, height)
}

/// Creates an owned grayscale image from a dynamic image.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> PuttrackResult<OwnedImage> {
    let gray = img.to_luma8();
    owned_from_gray_image(&gray)
}

/// Loads an image from disk and converts it to a grayscale owned image.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> PuttrackResult<OwnedImage> {
    let img = image::open(path).map_err(|err| PuttrackError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}

/// Lists the PNG/JPEG files of a frame directory in file-name order.
pub fn frame_paths<P: AsRef<Path>>(dir: P) -> PuttrackResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|err| PuttrackError::ImageIo {
        reason: err.to_string(),
    })?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| PuttrackError::ImageIo {
                reason: err.to_string(),
            })?
            .path();
        let is_frame = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
            .unwrap_or(false);
        if is_frame {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads every frame of a directory as grayscale, in file-name order.
pub fn load_frame_sequence<P: AsRef<Path>>(dir: P) -> PuttrackResult<Vec<OwnedImage>> {
    frame_paths(dir)?.iter().map(load_gray_image).collect()
}
