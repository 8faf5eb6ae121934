use std::cell::RefCell;
use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use puttrack::{
    ErrorKind, LineKind, OwnedImage, Point, PointerEvent, PuttrackError, SessionSnapshot,
    TrackerConfig, TrackingSession, TrackingState,
};

const MARKERS: [(f32, f32); 4] = [(20.0, 100.0), (140.0, 100.0), (20.0, 200.0), (140.0, 200.0)];

fn frame() -> OwnedImage {
    let mut rng = StdRng::seed_from_u64(42);
    let data = (0..160 * 320).map(|_| rng.random_range(0..=255)).collect();
    OwnedImage::new(data, 160, 320).unwrap()
}

fn cfg() -> TrackerConfig {
    TrackerConfig {
        settle_delay_s: 0.0,
        ..TrackerConfig::default()
    }
}

#[test]
fn four_markers_then_ball_arms_the_session() {
    let img = frame();
    let mut session = TrackingSession::new(cfg());
    assert_eq!(session.state(), TrackingState::Idle);
    session.start_setup();

    for (i, (x, y)) in MARKERS.into_iter().enumerate() {
        assert_eq!(session.snapshot().next_marker_index(), Some(i));
        let count = session.submit_marker(img.view(), Point::new(x, y)).unwrap();
        assert_eq!(count, i + 1);
    }
    assert_eq!(session.state(), TrackingState::AwaitingBall);
    assert_eq!(session.snapshot().next_marker_index(), None);

    let err = session
        .submit_marker(img.view(), Point::new(80.0, 150.0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
    assert_eq!(session.markers().len(), 4);

    session.place_ball(img.view(), Point::new(80.0, 60.0), 0.0).unwrap();
    assert_eq!(session.state(), TrackingState::Armed);
    assert_eq!(session.next_line(), Some(LineKind::Start));
    let ball = session.ball().unwrap();
    assert_eq!(ball.current, ball.previous);
}

#[test]
fn progress_fires_once_per_change() {
    let log: Rc<RefCell<Vec<TrackingState>>> = Rc::default();
    let sink = Rc::clone(&log);
    let img = frame();
    let mut session = TrackingSession::new(cfg())
        .with_progress(move |snapshot: &SessionSnapshot| sink.borrow_mut().push(snapshot.state));

    session.start_setup();
    for (x, y) in MARKERS {
        session.submit_marker(img.view(), Point::new(x, y)).unwrap();
    }
    session.place_ball(img.view(), Point::new(80.0, 60.0), 0.0).unwrap();
    session.record_crossing(LineKind::Start, 1.0, Some(7)).unwrap();
    session.record_crossing(LineKind::End, 1.5, Some(22)).unwrap();
    // Re-firing a recorded line is not a change.
    session.record_crossing(LineKind::End, 1.8, Some(30)).unwrap();

    use TrackingState::*;
    assert_eq!(
        *log.borrow(),
        vec![
            AwaitingMarkers,
            AwaitingMarkers,
            AwaitingMarkers,
            AwaitingMarkers,
            AwaitingBall,
            Armed,
            Armed,
            Finished,
        ]
    );
}

#[test]
fn operations_outside_their_state_are_rejected() {
    let img = frame();
    let mut session = TrackingSession::new(cfg());
    assert_eq!(
        session.submit_marker(img.view(), Point::new(50.0, 50.0)),
        Err(PuttrackError::InvalidState {
            expected: "awaiting_markers",
            actual: "idle",
        })
    );
    assert!(session
        .place_ball(img.view(), Point::new(50.0, 50.0), 0.0)
        .is_err());
    assert!(session.track_ball(img.view(), &Default::default(), None).is_err());
    assert!(session.calibration().is_err());
    assert!(matches!(
        session.speed(1.0),
        Err(PuttrackError::InvalidState { .. })
    ));
}

#[test]
fn markers_near_the_edge_have_no_template_but_count() {
    let img = frame();
    let mut session = TrackingSession::new(cfg());
    session.start_setup();
    let edge = [(0.0, 100.0), (100.0, 100.0), (0.0, 200.0), (100.0, 200.0)];
    for (x, y) in edge {
        session.submit_marker(img.view(), Point::new(x, y)).unwrap();
    }
    assert_eq!(session.state(), TrackingState::AwaitingBall);

    let drifts = session.check_marker_drift(img.view(), 4).unwrap();
    assert_eq!(drifts[0].observed, None);
    assert_eq!(drifts[1].observed, Some(Point::new(100.0, 100.0)));
    assert_eq!(drifts[1].displacement(), Some(0.0));
}

#[test]
fn pointer_gestures_confirm_on_release_only() {
    let img = frame();
    let mut session = TrackingSession::new(TrackerConfig {
        settle_delay_s: 0.25,
        ..cfg()
    });
    session.start_setup();

    let p = Point::new(20.0, 100.0);
    session
        .handle_pointer(PointerEvent::Down(Point::new(10.0, 90.0)), img.view(), 0.0)
        .unwrap();
    session
        .handle_pointer(PointerEvent::Move(p), img.view(), 0.0)
        .unwrap();
    assert!(session.markers().is_empty());
    assert_eq!(session.snapshot().cursor, Some(p));
    session
        .handle_pointer(PointerEvent::Up(p), img.view(), 0.0)
        .unwrap();
    assert_eq!(session.markers(), &[p]);

    for (x, y) in &MARKERS[1..] {
        let q = Point::new(*x, *y);
        session
            .handle_pointer(PointerEvent::Up(q), img.view(), 0.0)
            .unwrap();
    }
    session
        .handle_pointer(PointerEvent::Up(Point::new(80.0, 60.0)), img.view(), 2.0)
        .unwrap();
    assert_eq!(session.state(), TrackingState::AwaitingBall);
    assert_eq!(session.poll(2.1), TrackingState::AwaitingBall);
    assert_eq!(session.poll(2.25), TrackingState::Armed);

    // Releases while armed are ignored.
    session
        .handle_pointer(PointerEvent::Up(Point::new(5.0, 5.0)), img.view(), 3.0)
        .unwrap();
    assert_eq!(session.markers().len(), 4);
}

#[test]
fn re_setup_discards_everything_and_bumps_epoch() {
    let img = frame();
    let mut session = TrackingSession::new(cfg());
    let first = session.start_setup();
    for (x, y) in MARKERS {
        session.submit_marker(img.view(), Point::new(x, y)).unwrap();
    }
    session.place_ball(img.view(), Point::new(80.0, 60.0), 0.0).unwrap();
    session.record_crossing(LineKind::Start, 0.5, None).unwrap();
    let calibration = session.calibration().unwrap();
    assert_eq!(calibration.epoch, first);

    let handle = session.epoch_handle();
    let second = session.start_setup();
    assert_eq!(second, first + 1);
    assert_eq!(
        handle.ensure_current(first),
        Err(PuttrackError::SessionSuperseded {
            epoch: first,
            current: second,
        })
    );
    let snapshot = session.snapshot();
    assert!(snapshot.markers.is_empty());
    assert!(snapshot.ball.is_none());
    assert!(snapshot.start.is_none());
    assert!(session.ball_template().is_none());
    assert!(session.reference(LineKind::Start).is_none());
}

#[test]
fn off_frame_points_are_rejected_without_changing_the_session() {
    let img = frame();
    let mut session = TrackingSession::new(cfg());
    session.start_setup();
    session
        .submit_marker(img.view(), Point::new(20.0, 100.0))
        .unwrap();

    for p in [Point::new(1.0e20, 50.0), Point::new(50.0, -1.0e20)] {
        let err = session.submit_marker(img.view(), p).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionViolation);
        assert_eq!(session.markers().len(), 1);
    }

    for (x, y) in &MARKERS[1..] {
        session.submit_marker(img.view(), Point::new(*x, *y)).unwrap();
    }
    let err = session
        .place_ball(img.view(), Point::new(1.0e20, 60.0), 0.0)
        .unwrap_err();
    assert!(matches!(err, PuttrackError::TemplateOutOfBounds { .. }));
    assert_eq!(session.state(), TrackingState::AwaitingBall);
    assert!(session.ball().is_none());
}
