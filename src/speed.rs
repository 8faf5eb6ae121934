//! Speed from two crossing times and the calibrated start-line length.

use crate::geom::{distance, midpoint};
use crate::session::MarkerSet;
use crate::util::{PuttrackError, PuttrackResult};

/// Unit the known start-line length is expressed in, per second.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpeedUnit {
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
    FeetPerSecond,
}

impl SpeedUnit {
    /// Multiplier from meters per second.
    pub fn factor(self) -> f64 {
        match self {
            SpeedUnit::MetersPerSecond => 1.0,
            SpeedUnit::KilometersPerHour => 3.6,
            SpeedUnit::MilesPerHour => 2.236936,
            SpeedUnit::FeetPerSecond => 3.28084,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            SpeedUnit::MetersPerSecond => "m/s",
            SpeedUnit::KilometersPerHour => "km/h",
            SpeedUnit::MilesPerHour => "mph",
            SpeedUnit::FeetPerSecond => "ft/s",
        }
    }
}

/// Measured putt speed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpeedResult {
    /// Real-world units per second, in the unit of the known length.
    pub speed_in_real_units: f64,
    /// Seconds between the start and end crossings.
    pub elapsed_time: f64,
    /// Pixels between the start-line and end-line midpoints.
    pub pixel_distance: f64,
    /// Start-line pixels per real-world unit.
    pub calibration_factor: f64,
}

impl SpeedResult {
    /// Converts a speed measured with a known length in meters.
    pub fn in_unit(&self, unit: SpeedUnit) -> f64 {
        self.speed_in_real_units * unit.factor()
    }
}

/// Computes the ball speed between two crossings.
///
/// The start line (markers 0 and 1) spans `known_length` real units. The
/// putt distance runs between the midpoints of the start and end lines.
pub fn compute_speed(
    start_time: f64,
    end_time: f64,
    markers: &MarkerSet,
    known_length: f64,
) -> PuttrackResult<SpeedResult> {
    if !(start_time.is_finite() && end_time.is_finite()) {
        return Err(PuttrackError::InvalidInput("crossing times must be finite"));
    }
    if !(known_length.is_finite() && known_length > 0.0) {
        return Err(PuttrackError::InvalidInput("known length must be positive"));
    }
    let elapsed_time = end_time - start_time;
    if elapsed_time == 0.0 {
        return Err(PuttrackError::DegenerateElapsedTime);
    }
    if elapsed_time < 0.0 {
        return Err(PuttrackError::InvalidInput("end crossing precedes start crossing"));
    }
    let [m0, m1, m2, m3] = *markers.points();
    let start_width = f64::from(distance(m0, m1));
    if start_width == 0.0 {
        return Err(PuttrackError::InvalidInput("start markers coincide"));
    }
    let calibration_factor = start_width / known_length;
    let pixel_distance = f64::from(distance(midpoint(m0, m1), midpoint(m2, m3)));
    let real_distance = pixel_distance / calibration_factor;
    Ok(SpeedResult {
        speed_in_real_units: real_distance / elapsed_time,
        elapsed_time,
        pixel_distance,
        calibration_factor,
    })
}
