use clap::Parser;
use puttrack::io::load_frame_sequence;
use puttrack::{
    CrossingDetector, ForensicAnalyzer, ForensicConfig, ForensicReport, FrameSequence,
    MarkerDrift, Point, SpeedResult, SpeedUnit, TrackerConfig, TrackingSession, TrackingState,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Putt speed from a recorded frame sequence (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UnitConfig {
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
    FeetPerSecond,
}

impl From<UnitConfig> for SpeedUnit {
    fn from(value: UnitConfig) -> Self {
        match value {
            UnitConfig::MetersPerSecond => SpeedUnit::MetersPerSecond,
            UnitConfig::KilometersPerHour => SpeedUnit::KilometersPerHour,
            UnitConfig::MilesPerHour => SpeedUnit::MilesPerHour,
            UnitConfig::FeetPerSecond => SpeedUnit::FeetPerSecond,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
enum CrossingConfig {
    PathIntersection,
    DualSignalRoi {
        match_threshold: u64,
        diff_threshold: f32,
    },
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrackerConfigJson {
    ball_template_size: usize,
    marker_template_size: usize,
    base_radius: usize,
    max_radius: usize,
    predict_motion: bool,
    roi_margin_along: f32,
    roi_margin_across: f32,
    reference_margin: f32,
    parallel: bool,
    drift_radius: usize,
}

impl Default for TrackerConfigJson {
    fn default() -> Self {
        let cfg = TrackerConfig::default();
        Self {
            ball_template_size: cfg.ball_template_size,
            marker_template_size: cfg.marker_template_size,
            base_radius: cfg.base_radius,
            max_radius: cfg.max_radius,
            predict_motion: cfg.predict_motion,
            roi_margin_along: cfg.roi_margin_along,
            roi_margin_across: cfg.roi_margin_across,
            reference_margin: cfg.reference_margin,
            parallel: cfg.parallel,
            drift_radius: cfg.drift_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    frames_dir: String,
    frame_rate: f64,
    markers: Vec<[f32; 2]>,
    ball: Option<[f32; 2]>,
    known_length: f64,
    unit: UnitConfig,
    restrict_to_line_roi: bool,
    check_drift: bool,
    output_path: Option<String>,
    crossing: CrossingConfig,
    tracker: TrackerConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        let forensic = ForensicConfig::default();
        Self {
            frames_dir: String::new(),
            frame_rate: forensic.frame_rate,
            markers: Vec::new(),
            ball: None,
            known_length: 1.0,
            unit: UnitConfig::MetersPerSecond,
            restrict_to_line_roi: forensic.restrict_to_line_roi,
            check_drift: false,
            output_path: None,
            crossing: CrossingConfig::PathIntersection,
            tracker: TrackerConfigJson::default(),
        }
    }
}

impl Config {
    fn tracker_config(&self) -> TrackerConfig {
        let t = &self.tracker;
        TrackerConfig {
            ball_template_size: t.ball_template_size,
            marker_template_size: t.marker_template_size,
            base_radius: t.base_radius,
            max_radius: t.max_radius,
            predict_motion: t.predict_motion,
            roi_margin_along: t.roi_margin_along,
            roi_margin_across: t.roi_margin_across,
            reference_margin: t.reference_margin,
            restrict_to_line_roi: self.restrict_to_line_roi,
            // Frames are already recorded; there is nothing to wait for.
            settle_delay_s: 0.0,
            parallel: t.parallel,
            crossing: self.crossing.detector(),
            drift_radius: t.drift_radius,
        }
    }

    fn forensic_config(&self) -> ForensicConfig {
        ForensicConfig {
            frame_rate: self.frame_rate,
            restrict_to_line_roi: self.restrict_to_line_roi,
            parallel: self.tracker.parallel,
        }
    }
}

impl CrossingConfig {
    fn detector(&self) -> CrossingDetector {
        match *self {
            CrossingConfig::PathIntersection => CrossingDetector::PathIntersection,
            CrossingConfig::DualSignalRoi {
                match_threshold,
                diff_threshold,
            } => CrossingDetector::DualSignalRoi {
                match_threshold,
                diff_threshold,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeedRecord {
    value: f64,
    unit: &'static str,
    speed_in_real_units: f64,
    elapsed_time: f64,
    pixel_distance: f64,
    calibration_factor: f64,
}

impl SpeedRecord {
    fn new(result: SpeedResult, unit: SpeedUnit) -> Self {
        Self {
            value: result.in_unit(unit),
            unit: unit.symbol(),
            speed_in_real_units: result.speed_in_real_units,
            elapsed_time: result.elapsed_time,
            pixel_distance: result.pixel_distance,
            calibration_factor: result.calibration_factor,
        }
    }
}

#[derive(Debug, Serialize)]
struct DriftRecord {
    index: usize,
    expected: [f32; 2],
    observed: Option<[f32; 2]>,
    displacement: Option<f32>,
}

impl From<MarkerDrift> for DriftRecord {
    fn from(value: MarkerDrift) -> Self {
        Self {
            index: value.index,
            expected: [value.expected.x, value.expected.y],
            observed: value.observed.map(|p| [p.x, p.y]),
            displacement: value.displacement(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    start_time: Option<f64>,
    end_time: Option<f64>,
    start_frame: Option<u64>,
    end_frame: Option<u64>,
    frames_processed: u64,
    speed: Option<SpeedRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    drift: Vec<DriftRecord>,
}

impl Output {
    fn new(report: &ForensicReport, speed: Option<SpeedRecord>, drift: Vec<DriftRecord>) -> Self {
        Self {
            start_time: report.start_time,
            end_time: report.end_time,
            start_frame: report.start_frame,
            end_frame: report.end_frame,
            frames_processed: report.frames_processed,
            speed,
            drift,
        }
    }
}

fn point(p: [f32; 2]) -> Point {
    Point::new(p[0], p[1])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("puttrack=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames_dir.is_empty() {
        return Err("frames_dir must be set in the config".into());
    }
    if config.markers.len() != 4 {
        return Err("markers must list exactly four points".into());
    }
    let Some(ball) = config.ball else {
        return Err("ball must be set in the config".into());
    };

    let tracker_cfg = config.tracker_config();
    tracker_cfg.validate()?;
    let analyzer = ForensicAnalyzer::new(config.forensic_config())?;

    let frames = load_frame_sequence(&config.frames_dir)?;
    tracing::info!(count = frames.len(), dir = %config.frames_dir, "loaded frames");
    let (Some(first), Some(last)) = (frames.first(), frames.last()) else {
        return Err("frames_dir contains no PNG or JPEG frames".into());
    };

    let mut session = TrackingSession::new(tracker_cfg);
    session.start_setup();
    for &marker in &config.markers {
        session.submit_marker(first.view(), point(marker))?;
    }
    session.place_ball(first.view(), point(ball), 0.0)?;
    if session.state() != TrackingState::Armed {
        return Err("session did not arm after ball placement".into());
    }

    let drift = if config.check_drift {
        session
            .check_marker_drift(last.view(), tracker_cfg.drift_radius)?
            .into_iter()
            .map(DriftRecord::from)
            .collect()
    } else {
        Vec::new()
    };

    let calibration = session.calibration()?;
    let epoch = session.epoch_handle();
    let mut source = FrameSequence::new(frames, config.frame_rate)?;
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let report = runtime.block_on(analyzer.analyze(&calibration, &mut source, &epoch))?;

    let unit = SpeedUnit::from(config.unit);
    let speed = report
        .speed(&calibration.markers, config.known_length)?
        .map(|result| SpeedRecord::new(result, unit));
    let output = Output::new(&report, speed, drift);
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_config_parses() {
        let config: Config = serde_json::from_str(EXAMPLE_JSON).unwrap();
        assert_eq!(config.markers.len(), 4);
        assert!(config.ball.is_some());
        assert!(config.tracker_config().validate().is_ok());
        assert!(ForensicAnalyzer::new(config.forensic_config()).is_ok());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{ "frames_dir": "clip" }"#).unwrap();
        assert_eq!(config.frame_rate, ForensicConfig::default().frame_rate);
        let cfg = config.tracker_config();
        assert_eq!(cfg.crossing, CrossingDetector::PathIntersection);
        assert_eq!(cfg.settle_delay_s, 0.0);
        assert_eq!(cfg.base_radius, TrackerConfig::default().base_radius);
    }

    #[test]
    fn dual_signal_policy_is_tagged() {
        let config: Config = serde_json::from_str(
            r#"{ "crossing": { "policy": "dual_signal_roi", "match_threshold": 5000, "diff_threshold": 12.5 } }"#,
        )
        .unwrap();
        assert_eq!(
            config.tracker_config().crossing,
            CrossingDetector::DualSignalRoi {
                match_threshold: 5000,
                diff_threshold: 12.5,
            }
        );
    }

    #[test]
    fn schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(SCHEMA_JSON).unwrap();
        assert_eq!(schema["type"], "object");
    }
}
