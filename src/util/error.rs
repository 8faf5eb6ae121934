//! Error types for puttrack.

use thiserror::Error;

/// Result alias for puttrack operations.
pub type PuttrackResult<T> = std::result::Result<T, PuttrackError>;

/// Coarse classification of [`PuttrackError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller broke an operation's precondition. Session state is unchanged.
    PreconditionViolation,
    /// Two crossings share a timestamp, so no speed exists.
    DivisionDegenerate,
    /// The session was re-calibrated while the operation was in flight.
    Superseded,
    /// A frame could not be loaded or delivered.
    Io,
}

/// Errors that can occur while calibrating, tracking or measuring.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PuttrackError {
    /// Image or template dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The stride is smaller than the width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is too short for the requested view.
    #[error("buffer too small: needed {needed} elements, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A crop rectangle leaves the image.
    #[error("roi ({x}, {y}, {width}x{height}) out of bounds for {img_width}x{img_height} image")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A template window centered at the requested point would be clipped.
    #[error("template of size {size} at ({x}, {y}) leaves the {img_width}x{img_height} frame")]
    TemplateOutOfBounds {
        x: f32,
        y: f32,
        size: usize,
        img_width: usize,
        img_height: usize,
    },
    /// Two regions that must be compared pixel by pixel differ in size.
    #[error("region size mismatch: {width}x{height} vs {other_width}x{other_height}")]
    RegionSizeMismatch {
        width: usize,
        height: usize,
        other_width: usize,
        other_height: usize,
    },
    /// The operation needs a complete set of four markers.
    #[error("expected 4 markers, got {got}")]
    InsufficientMarkers { got: usize },
    /// The session is in the wrong state for the operation.
    #[error("operation requires state {expected}, session is {actual}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Start and end crossings share a timestamp.
    #[error("elapsed time between crossings is zero")]
    DegenerateElapsedTime,
    /// A newer calibration replaced the session this work belongs to.
    #[error("session epoch {epoch} was superseded by epoch {current}")]
    SessionSuperseded { epoch: u64, current: u64 },
    /// Loading an image failed.
    #[error("image io failed: {reason}")]
    ImageIo { reason: String },
    /// A clip source could not deliver a frame.
    #[error("clip source failed: {reason}")]
    ClipSource { reason: String },
}

impl PuttrackError {
    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PuttrackError::DegenerateElapsedTime => ErrorKind::DivisionDegenerate,
            PuttrackError::SessionSuperseded { .. } => ErrorKind::Superseded,
            PuttrackError::ImageIo { .. } | PuttrackError::ClipSource { .. } => ErrorKind::Io,
            _ => ErrorKind::PreconditionViolation,
        }
    }
}
