mod common;

use common::{at, tracker};
use mmwave_core::{TrackerCfg, TrackingCfg};
use mmwave_traits::RawFrame;
use rstest::rstest;

fn cfg(window: Option<u8>) -> TrackerCfg {
    TrackerCfg {
        tracking: TrackingCfg {
            flip_x_axis: false,
            fast_off_detection: window.is_some(),
            fast_off_window: window.unwrap_or(2),
        },
        ..TrackerCfg::default()
    }
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn short_gap_never_deactivates(#[case] window: u8) {
    let (mut t, _, _) = tracker(cfg(Some(window)));
    t.tick(Some(&at(0.0, 1.0)));
    for _ in 0..window - 1 {
        t.tick(Some(&RawFrame::empty()));
        assert!(t.target(0).unwrap().is_active());
    }
    t.tick(Some(&at(0.0, 1.1)));
    assert!(t.target(0).unwrap().is_active());
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
fn long_gap_deactivates(#[case] window: u8) {
    let (mut t, _, _) = tracker(cfg(Some(window)));
    t.tick(Some(&at(0.0, 1.0)));
    for _ in 0..=window {
        t.tick(Some(&RawFrame::empty()));
    }
    assert!(!t.target(0).unwrap().is_active());
}

#[rstest]
fn held_slot_reports_last_values() {
    let (mut t, _, _) = tracker(cfg(Some(3)));
    t.tick(Some(&at(0.5, 1.0)));
    let r = t.tick(Some(&RawFrame::empty()));
    assert_eq!(r.targets[0].map(|v| v.x), Some(0.5));
    assert_eq!(r.target_count, 1);
}

#[rstest]
fn disabled_filter_deactivates_on_first_gap() {
    let (mut t, _, _) = tracker(cfg(None));
    t.tick(Some(&at(0.0, 1.0)));
    t.tick(Some(&RawFrame::empty()));
    assert!(!t.target(0).unwrap().is_active());
}
