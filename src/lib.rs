//! puttrack measures golf putt speed by tracking a ball across two
//! calibrated lines in a frame stream.
//!
//! A [`TrackingSession`] captures four line markers and a ball template.
//! Frames are then fed either live through a [`LiveEventDetector`] or from a
//! recorded clip through the [`ForensicAnalyzer`]. Matching is exhaustive SSD
//! with motion-predicted search windows; optional `rayon` and `simd` features
//! accelerate the scan without changing its results.

pub mod config;
pub mod detect;
pub mod diff;
pub mod forensic;
pub mod geom;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod roi;
pub mod search;
pub mod session;
pub mod speed;
pub mod template;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use config::TrackerConfig;
pub use detect::live::{DebugOverlay, LiveEventDetector, NullRecorder, RecordingSink, TickReport};
pub use detect::{CrossingDetector, CrossingEvent, LineKind, LineProbe};
pub use diff::{mean_abs_diff, region_differs};
pub use forensic::{ClipSource, ForensicAnalyzer, ForensicConfig, ForensicReport, FrameSequence};
pub use geom::{distance, midpoint, segments_intersect, Line, Point};
pub use crate::image::{ImageView, OwnedImage, PixelRect};
pub use roi::Roi;
pub use search::{find_best_match, search_radius, Match, Matcher};
pub use session::{
    BallState, BallStep, Calibration, EpochHandle, MarkerDrift, MarkerSet, PointerEvent,
    ProgressSink, SessionSnapshot, TrackingSession, TrackingState,
};
pub use speed::{compute_speed, SpeedResult, SpeedUnit};
pub use template::{ReferenceRegion, Template};
pub use util::{ErrorKind, PuttrackError, PuttrackResult};
