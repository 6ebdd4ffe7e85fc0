mod common;

use common::{Recorder, at};
use mmwave_core::mocks::NoFrames;
use mmwave_core::{LimitKind, LimitMode, LimitsCfg, Tracker, TrackerCfg, TrackerError};
use mmwave_hardware::MemoryStore;
use mmwave_traits::clock::test_clock::TestClock;
use rstest::rstest;

fn adjustable(initial: f32, restore: bool) -> LimitMode {
    LimitMode::Adjustable {
        initial,
        step: 0.1,
        restore,
    }
}

fn build(limits: LimitsCfg, store: MemoryStore) -> Tracker {
    Tracker::builder()
        .with_source(NoFrames)
        .with_publisher(Recorder::default())
        .with_limits(limits)
        .with_store(store)
        .with_clock(Box::new(TestClock::new()))
        .build()
        .expect("tracker build")
}

#[rstest]
fn handle_adjustments_apply_on_next_tick() {
    let store = MemoryStore::new();
    let mut t = build(LimitsCfg::default(), store.clone());
    let handle = t.limit_handle();

    std::thread::spawn(move || handle.set(LimitKind::MaxDistance, 2.0).unwrap())
        .join()
        .unwrap();
    assert_eq!(t.limits().max_distance(), 6.0, "queued until the next tick");

    t.tick(Some(&at(0.0, 2.5)));
    assert_eq!(t.limits().max_distance(), 2.0);
    assert!(!t.target(0).unwrap().is_active());
    assert_eq!(store.get("max_distance"), Some(2.0));
}

#[rstest]
fn out_of_range_set_is_clamped_and_persisted_clamped() {
    let store = MemoryStore::new();
    let mut t = build(LimitsCfg::default(), store.clone());
    assert_eq!(t.set_limit(LimitKind::MaxDistance, 42.0).unwrap(), 6.0);
    assert_eq!(t.set_limit(LimitKind::MinTiltAngle, -120.0).unwrap(), -90.0);
    assert_eq!(store.get("max_distance"), Some(6.0));
    assert_eq!(store.get("min_tilt_angle"), Some(-90.0));
}

#[rstest]
fn restore_prefers_stored_values() {
    let store = MemoryStore::new()
        .with_value("max_distance", 1.5)
        .with_value("max_tilt_angle", 20.0);
    let t = build(LimitsCfg::default(), store);
    assert_eq!(t.limits().max_distance(), 1.5);
    assert_eq!(t.limits().max_tilt_angle(), 20.0);
    assert_eq!(t.limits().min_tilt_angle(), -90.0);
}

#[rstest]
fn restore_flag_off_ignores_and_never_writes_store() {
    let store = MemoryStore::new().with_value("max_distance", 1.5);
    let limits = LimitsCfg {
        max_distance: adjustable(4.0, false),
        ..LimitsCfg::default()
    };
    let mut t = build(limits, store.clone());
    assert_eq!(t.limits().max_distance(), 4.0);
    t.set_limit(LimitKind::MaxDistance, 3.0).unwrap();
    assert_eq!(store.get("max_distance"), Some(1.5));
}

#[rstest]
fn fixed_limit_refuses_live_set() {
    let limits = LimitsCfg {
        max_distance: LimitMode::Fixed(3.0),
        ..LimitsCfg::default()
    };
    let mut t = build(limits, MemoryStore::new());
    let err = t.set_limit(LimitKind::MaxDistance, 2.0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TrackerError>(),
        Some(TrackerError::State(_))
    ));
    assert_eq!(t.limits().max_distance(), 3.0);
}

#[rstest]
fn live_tilt_cannot_cross_its_sibling() {
    let mut t = build(LimitsCfg::default(), MemoryStore::new());
    t.set_limit(LimitKind::MaxTiltAngle, 10.0).unwrap();
    assert_eq!(t.set_limit(LimitKind::MinTiltAngle, 30.0).unwrap(), 10.0);
    assert!(t.limits().min_tilt_angle() <= t.limits().max_tilt_angle());
}

#[rstest]
fn active_target_keeps_distance_margin() {
    let limits = LimitsCfg {
        max_distance: LimitMode::Fixed(3.0),
        max_distance_margin: 0.25,
        ..LimitsCfg::default()
    };
    let mut t = build(limits, MemoryStore::new());
    // fresh target just beyond the limit is rejected
    t.tick(Some(&at(0.0, 3.1)));
    assert!(!t.target(0).unwrap().is_active());
    // once active, it may drift into the margin
    t.tick(Some(&at(0.0, 2.9)));
    t.tick(Some(&at(0.0, 3.1)));
    assert!(t.target(0).unwrap().is_active());
    t.tick(Some(&at(0.0, 3.3)));
    assert!(!t.target(0).unwrap().is_active());
}

#[rstest]
fn config_is_reachable_from_tracker_cfg() {
    // the default runtime config publishes no slots
    let t = Tracker::builder()
        .with_source(NoFrames)
        .with_publisher(Recorder::default())
        .with_config(TrackerCfg::default())
        .build()
        .unwrap();
    assert!(t.targets().iter().all(|s| !s.is_published()));
    assert_eq!(t.name(), "LD2450");
}
