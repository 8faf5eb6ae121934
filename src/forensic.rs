//! Frame-stepped replay of a recorded clip.
//!
//! The analyzer seeks a [`ClipSource`] at a fixed time step, awaiting each
//! frame before matching it, and reports the timestamps at which the ball's
//! path crossed the start and end lines. It works on a [`Calibration`] copy
//! and checks the session epoch around every seek, so a re-calibration aborts
//! the run with [`PuttrackError::SessionSuperseded`].

use crate::detect::LineKind;
use crate::image::OwnedImage;
use crate::search::Matcher;
use crate::session::{BallState, Calibration, EpochHandle, MarkerSet};
use crate::speed::{compute_speed, SpeedResult};
use crate::trace::trace_event;
use crate::util::{PuttrackError, PuttrackResult};

/// Tolerance when comparing step times against the clip duration.
const TIME_EPS: f64 = 1e-9;

/// A finite clip addressable by time.
#[allow(async_fn_in_trait)]
pub trait ClipSource {
    /// Clip length in seconds.
    fn duration(&self) -> f64;

    /// Decodes the frame shown at `time` seconds into an owned buffer.
    async fn seek(&mut self, time: f64) -> PuttrackResult<OwnedImage>;

    /// Frees decoder resources. Called exactly once when analysis ends.
    fn release(&mut self) {}
}

/// Forensic stepping parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForensicConfig {
    /// Frames per second to step at.
    pub frame_rate: f64,
    /// Restrict the search to the uncrossed line's ROI.
    pub restrict_to_line_roi: bool,
    /// Row-parallel matching (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for ForensicConfig {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            restrict_to_line_roi: true,
            parallel: false,
        }
    }
}

/// Crossing times found in a clip.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForensicReport {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub start_frame: Option<u64>,
    pub end_frame: Option<u64>,
    pub frames_processed: u64,
}

impl ForensicReport {
    /// True when both lines were crossed.
    pub fn is_complete(&self) -> bool {
        self.start_time.is_some() && self.end_time.is_some()
    }

    /// Speed from the reported crossings, `None` if either is missing.
    pub fn speed(&self, markers: &MarkerSet, known_length: f64) -> PuttrackResult<Option<SpeedResult>> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => compute_speed(start, end, markers, known_length).map(Some),
            _ => Ok(None),
        }
    }
}

/// Releases the wrapped source when dropped.
struct ReleaseGuard<'a, S: ClipSource> {
    source: &'a mut S,
}

impl<S: ClipSource> Drop for ReleaseGuard<'_, S> {
    fn drop(&mut self) {
        self.source.release();
    }
}

/// Sequential, deterministic crossing search over a clip.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForensicAnalyzer {
    cfg: ForensicConfig,
}

impl ForensicAnalyzer {
    /// Creates an analyzer, rejecting a non-positive or non-finite frame rate.
    pub fn new(cfg: ForensicConfig) -> PuttrackResult<Self> {
        if !(cfg.frame_rate.is_finite() && cfg.frame_rate > 0.0) {
            return Err(PuttrackError::InvalidInput("frame rate must be positive"));
        }
        Ok(Self { cfg })
    }

    /// Returns the stepping configuration.
    pub fn config(&self) -> &ForensicConfig {
        &self.cfg
    }

    /// Steps through `source` from time zero.
    ///
    /// Step `k` seeks to `k / frame_rate`. The run stops when both crossings
    /// are found or the next step would pass the clip's end. The source is
    /// released on every exit path.
    pub async fn analyze<S: ClipSource>(
        &self,
        calibration: &Calibration,
        source: &mut S,
        epoch: &EpochHandle,
    ) -> PuttrackResult<ForensicReport> {
        let mut guard = ReleaseGuard { source };
        trace_event!("forensic_started", epoch = calibration.epoch);

        let fps = self.cfg.frame_rate;
        let duration = guard.source.duration();
        let matcher = Matcher::new().with_parallel(self.cfg.parallel);
        let template = &calibration.ball_template;
        let mut ball = BallState::at(calibration.ball_origin);
        let mut report = ForensicReport::default();

        let mut k = 0u64;
        while duration.is_finite() && k as f64 / fps <= duration + TIME_EPS {
            let t = k as f64 / fps;
            epoch.ensure_current(calibration.epoch)?;
            let frame = guard.source.seek(t).await?;
            epoch.ensure_current(calibration.epoch)?;

            let target = if report.start_time.is_none() {
                LineKind::Start
            } else {
                LineKind::End
            };
            let gate = if self.cfg.restrict_to_line_roi {
                calibration.tracking_roi(target, frame.width(), frame.height())
            } else {
                None
            };
            let moved =
                ball.advance(frame.view(), template, &matcher, &calibration.config, gate.as_ref())?;
            report.frames_processed += 1;

            if moved.path.intersects(&calibration.markers.line(target)) {
                trace_event!("forensic_crossing", line = target.as_str(), time = t);
                match target {
                    LineKind::Start => {
                        report.start_time = Some(t);
                        report.start_frame = Some(k);
                    }
                    LineKind::End => {
                        report.end_time = Some(t);
                        report.end_frame = Some(k);
                    }
                }
            }

            if report.is_complete() || (k + 1) as f64 / fps > duration - TIME_EPS {
                break;
            }
            k += 1;
        }
        trace_event!(
            "forensic_finished",
            frames = report.frames_processed,
            complete = report.is_complete()
        );
        Ok(report)
    }
}

/// In-memory clip of equally spaced frames.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    frames: Vec<OwnedImage>,
    frame_rate: f64,
    seeks: usize,
    released: bool,
}

impl FrameSequence {
    /// Wraps `frames` shown at `frame_rate` frames per second.
    pub fn new(frames: Vec<OwnedImage>, frame_rate: f64) -> PuttrackResult<Self> {
        if frames.is_empty() {
            return Err(PuttrackError::InvalidInput("frame sequence is empty"));
        }
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(PuttrackError::InvalidInput("frame rate must be positive"));
        }
        Ok(Self {
            frames,
            frame_rate,
            seeks: 0,
            released: false,
        })
    }

    /// Number of frames in the clip.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Number of seeks served so far.
    pub fn seek_count(&self) -> usize {
        self.seeks
    }

    /// True once the analyzer has released the clip.
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn index_at(&self, time: f64) -> usize {
        let index = (time * self.frame_rate + 1e-6).floor() as usize;
        index.min(self.frames.len() - 1)
    }
}

impl ClipSource for FrameSequence {
    fn duration(&self) -> f64 {
        self.frames.len() as f64 / self.frame_rate
    }

    async fn seek(&mut self, time: f64) -> PuttrackResult<OwnedImage> {
        if !(time.is_finite() && time >= 0.0) {
            return Err(PuttrackError::ClipSource {
                reason: format!("cannot seek to {time}"),
            });
        }
        self.seeks += 1;
        Ok(self.frames[self.index_at(time)].clone())
    }

    fn release(&mut self) {
        self.released = true;
    }
}
