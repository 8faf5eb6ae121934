use criterion::{criterion_group, criterion_main, Criterion};
use puttrack::{
    compute_speed, ImageView, LiveEventDetector, MarkerSet, Matcher, NullRecorder, OwnedImage,
    Point, Roi, Template, TrackerConfig, TrackingSession,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn bench_matcher(c: &mut Criterion) {
    let width = 512;
    let height = 512;
    let data = make_image(width, height);
    let frame = ImageView::from_slice(&data, width, height).unwrap();
    let center = Point::new(256.0, 256.0);
    let template = Template::capture(frame, center, 30).unwrap();
    let start = Point::new(240.0, 270.0);

    let matcher = Matcher::new();
    c.bench_function("ssd_radius_10", |b| {
        b.iter(|| black_box(matcher.find_best_match(frame, &template, start, 10, None).unwrap()));
    });
    c.bench_function("ssd_radius_40", |b| {
        b.iter(|| black_box(matcher.find_best_match(frame, &template, start, 40, None).unwrap()));
    });

    let roi = Roi {
        min_x: 160.0,
        min_y: 200.0,
        max_x: 360.0,
        max_y: 320.0,
    };
    c.bench_function("ssd_line_roi", |b| {
        b.iter(|| black_box(matcher.find_best_match_in_roi(frame, &template, &roi).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let matcher_par = Matcher::new().with_parallel(true);
        c.bench_function("ssd_radius_40_parallel", |b| {
            b.iter(|| {
                black_box(
                    matcher_par
                        .find_best_match(frame, &template, start, 40, None)
                        .unwrap(),
                )
            });
        });
    }
}

fn bench_tracking(c: &mut Criterion) {
    let width = 320;
    let height = 480;
    let frame = OwnedImage::new(make_image(width, height), width, height).unwrap();
    let markers = [
        Point::new(40.0, 200.0),
        Point::new(280.0, 200.0),
        Point::new(40.0, 400.0),
        Point::new(280.0, 400.0),
    ];

    let mut session = TrackingSession::new(TrackerConfig {
        settle_delay_s: 0.0,
        ..TrackerConfig::default()
    });
    session.start_setup();
    for p in markers {
        session.submit_marker(frame.view(), p).unwrap();
    }
    session
        .place_ball(frame.view(), Point::new(160.0, 100.0), 0.0)
        .unwrap();
    let mut detector = LiveEventDetector::for_session(&session);

    // A static ball never crosses, so every iteration is a full tracking tick.
    c.bench_function("live_tick_static_ball", |b| {
        b.iter(|| {
            black_box(
                detector
                    .tick(&mut session, frame.view(), 0.0, &mut NullRecorder)
                    .unwrap(),
            )
        });
    });

    let set = MarkerSet::new(markers);
    c.bench_function("compute_speed", |b| {
        b.iter(|| black_box(compute_speed(black_box(1.0), black_box(1.6), &set, 1.2).unwrap()));
    });
}

criterion_group!(benches, bench_tracking, bench_matcher);
criterion_main!(benches);
