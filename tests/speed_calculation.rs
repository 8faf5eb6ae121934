use puttrack::{
    compute_speed, ErrorKind, LineKind, MarkerSet, OwnedImage, Point, PuttrackError, SpeedUnit,
    TrackerConfig, TrackingSession,
};

fn square_markers() -> [Point; 4] {
    [
        Point::new(0.0, 100.0),
        Point::new(100.0, 100.0),
        Point::new(0.0, 200.0),
        Point::new(100.0, 200.0),
    ]
}

#[test]
fn reference_scenario_is_two_units_per_second() {
    let markers = MarkerSet::new(square_markers());
    let result = compute_speed(1.0, 1.5, &markers, 1.0).unwrap();
    assert_eq!(result.pixel_distance, 100.0);
    assert_eq!(result.calibration_factor, 100.0);
    assert_eq!(result.elapsed_time, 0.5);
    assert!((result.speed_in_real_units - 2.0).abs() < 1e-12);
}

#[test]
fn unit_conversions_scale_meters_per_second() {
    let markers = MarkerSet::new(square_markers());
    let result = compute_speed(0.0, 1.0, &markers, 1.0).unwrap();
    assert!((result.in_unit(SpeedUnit::MetersPerSecond) - 1.0).abs() < 1e-12);
    assert!((result.in_unit(SpeedUnit::KilometersPerHour) - 3.6).abs() < 1e-12);
    assert!((result.in_unit(SpeedUnit::MilesPerHour) - 2.236936).abs() < 1e-12);
    assert!((result.in_unit(SpeedUnit::FeetPerSecond) - 3.28084).abs() < 1e-12);
    assert_eq!(SpeedUnit::MilesPerHour.symbol(), "mph");
}

#[test]
fn equal_timestamps_are_a_degenerate_division() {
    let markers = MarkerSet::new(square_markers());
    let err = compute_speed(1.25, 1.25, &markers, 1.0).unwrap_err();
    assert_eq!(err, PuttrackError::DegenerateElapsedTime);
    assert_eq!(err.kind(), ErrorKind::DivisionDegenerate);
}

#[test]
fn reversed_or_invalid_inputs_are_rejected() {
    let markers = MarkerSet::new(square_markers());
    for (start, end, length) in [(2.0, 1.0, 1.0), (0.0, 1.0, -1.0), (0.0, f64::NAN, 1.0)] {
        let err = compute_speed(start, end, &markers, length).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    }

    let coincident = MarkerSet::new([
        Point::new(5.0, 5.0),
        Point::new(5.0, 5.0),
        Point::new(0.0, 50.0),
        Point::new(10.0, 50.0),
    ]);
    assert!(matches!(
        compute_speed(0.0, 1.0, &coincident, 1.0),
        Err(PuttrackError::InvalidInput(_))
    ));
}

#[test]
fn too_few_markers_are_rejected() {
    let err = MarkerSet::from_slice(&square_markers()[..3]).unwrap_err();
    assert_eq!(err, PuttrackError::InsufficientMarkers { got: 3 });
}

#[test]
fn session_speed_uses_recorded_crossings() {
    let frame = OwnedImage::filled(200, 300, 50).unwrap();
    let mut session = TrackingSession::new(TrackerConfig {
        settle_delay_s: 0.0,
        ..TrackerConfig::default()
    });
    session.start_setup();
    for p in square_markers() {
        session.submit_marker(frame.view(), p).unwrap();
    }
    session
        .place_ball(frame.view(), Point::new(50.0, 50.0), 0.0)
        .unwrap();
    session.record_crossing(LineKind::Start, 1.0, None).unwrap();
    session.record_crossing(LineKind::End, 1.5, None).unwrap();

    let result = session.speed(1.0).unwrap();
    assert!((result.speed_in_real_units - 2.0).abs() < 1e-12);
}
