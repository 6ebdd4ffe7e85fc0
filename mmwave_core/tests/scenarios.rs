mod common;

use common::{at, pts, tracker};
use mmwave_core::{LimitMode, LimitsCfg, TargetCfg, TrackerCfg, ZoneCfg, ZoneStatus};
use mmwave_traits::{RawFrame, RawReading};
use rstest::rstest;

fn triangle_cfg() -> TrackerCfg {
    TrackerCfg {
        zones: vec![ZoneCfg {
            margin: 0.0,
            target_timeout_ms: 5000,
            ..ZoneCfg::new("Tri", pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]))
        }],
        targets: vec![TargetCfg::default()],
        ..TrackerCfg::default()
    }
}

#[rstest]
fn triangle_zone_holds_for_timeout_then_clears() {
    let (mut t, clock, _) = tracker(triangle_cfg());

    let r = t.tick(Some(&at(0.2, 0.2)));
    assert_eq!(
        r.zone(0),
        Some(ZoneStatus {
            occupied: true,
            target_count: 1
        })
    );

    clock.advance_ms(100);
    let r = t.tick(Some(&at(5.0, 5.0)));
    assert_eq!(
        r.zone(0),
        Some(ZoneStatus {
            occupied: true,
            target_count: 0
        })
    );

    // exactly 5 s after leaving: still in grace
    clock.advance_ms(5000);
    let r = t.tick(Some(&at(5.0, 5.0)));
    assert!(r.zones[0].occupied);

    clock.advance_ms(1);
    let r = t.tick(Some(&at(5.0, 5.0)));
    assert_eq!(r.zone(0), Some(ZoneStatus::default()));
}

#[rstest]
fn reading_beyond_max_distance_is_inactive() {
    let cfg = TrackerCfg {
        limits: LimitsCfg {
            max_distance: LimitMode::Fixed(3.0),
            ..LimitsCfg::default()
        },
        ..TrackerCfg::default()
    };
    let (mut t, _, _) = tracker(cfg);
    let r = t.tick(Some(&at(0.0, 3.5)));
    assert!(r.targets[0].is_none());
    assert!(!t.occupied());
    assert_eq!(t.target_count(), 0);

    let r = t.tick(Some(&at(0.0, 2.5)));
    assert!(r.targets[0].is_some());
}

#[rstest]
fn reading_outside_tilt_window_is_inactive() {
    let cfg = TrackerCfg {
        limits: LimitsCfg {
            min_tilt_angle: LimitMode::Fixed(-10.0),
            max_tilt_angle: LimitMode::Fixed(10.0),
            ..LimitsCfg::default()
        },
        ..TrackerCfg::default()
    };
    let (mut t, _, _) = tracker(cfg);
    // (1, 1) sits at 45 degrees
    t.tick(Some(&at(1.0, 1.0)));
    assert!(!t.target(0).unwrap().is_active());
    t.tick(Some(&at(0.1, 2.0)));
    assert!(t.target(0).unwrap().is_active());
}

#[rstest]
fn repeated_frames_are_idempotent() {
    let (mut t, clock, _) = tracker(triangle_cfg());
    let frame = RawFrame::new([
        RawReading::present(0.2, 0.2, 0.3, 0.36),
        RawReading::present(-1.0, 2.0, 0.0, 0.36),
        RawReading::absent(),
    ]);
    let first = t.tick(Some(&frame));
    let targets = t.targets().clone();
    for _ in 0..5 {
        clock.advance_ms(100);
        let again = t.tick(Some(&frame));
        assert_eq!(again, first);
        assert_eq!(t.targets(), &targets);
    }
}

#[rstest]
fn global_aggregates_count_every_active_slot() {
    // Only slot 0 is configured, but all three are tracked.
    let (mut t, _, _) = tracker(triangle_cfg());
    let frame = RawFrame::new([
        RawReading::present(0.2, 0.2, 0.0, 0.36),
        RawReading::present(1.0, 2.0, 0.0, 0.36),
        RawReading::present(-1.0, 2.0, 0.0, 0.36),
    ]);
    let r = t.tick(Some(&frame));
    assert!(r.occupied);
    assert_eq!(r.target_count, 3);
    assert!(!t.target(1).unwrap().is_published());
    assert_eq!(t.target(2).unwrap().name(), "Target 3");
}

#[rstest]
fn no_frame_carries_state_forward() {
    let (mut t, clock, rec) = tracker(triangle_cfg());
    t.tick(Some(&at(0.2, 0.2)));
    rec.take();
    clock.advance_ms(10_000);
    let r = t.tick(None);
    assert!(!r.frame);
    assert!(r.occupied);
    assert!(r.zones[0].occupied);
    assert!(rec.take().is_empty(), "no-frame ticks publish nothing");
}

#[rstest]
fn flip_mirrors_angle() {
    let cfg = TrackerCfg {
        tracking: mmwave_core::TrackingCfg {
            flip_x_axis: true,
            ..Default::default()
        },
        ..TrackerCfg::default()
    };
    let (mut t, _, _) = tracker(cfg);
    let r = t.tick(Some(&at(1.0, 1.0)));
    let v = r.targets[0].unwrap();
    assert_eq!(v.x, -1.0);
    assert!((v.angle + 45.0).abs() < 1e-4);
    assert!((v.distance - 2f32.sqrt()).abs() < 1e-6);
}
