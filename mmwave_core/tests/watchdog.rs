mod common;

use common::{Event, Recorder, at};
use mmwave_core::mocks::NullPublisher;
use mmwave_core::{TargetCfg, Timing, Tracker, TrackerCfg, ZoneCfg};
use mmwave_hardware::ScriptedSource;
use mmwave_hardware::error::HwError;
use mmwave_traits::clock::test_clock::TestClock;
use mmwave_traits::{RawFrame, RawReading};
use rstest::rstest;

fn cfg() -> TrackerCfg {
    TrackerCfg {
        targets: vec![TargetCfg::default()],
        zones: vec![ZoneCfg::new(
            "Desk",
            common::pts(&[(-0.5, 0.5), (0.5, 0.5), (0.5, 1.5), (-0.5, 1.5)]),
        )],
        timing: Timing {
            unavailable_timeout_ms: 5000,
            publish_interval_ms: 1000,
            frame_timeout_ms: 50,
        },
        ..TrackerCfg::default()
    }
}

fn build(source: ScriptedSource, clock: &TestClock) -> (Tracker, Recorder) {
    let rec = Recorder::default();
    let t = Tracker::builder()
        .with_source(source)
        .with_publisher(rec.clone())
        .with_config(cfg())
        .with_clock(Box::new(clock.clone()))
        .build()
        .unwrap();
    (t, rec)
}

#[rstest]
fn silence_marks_unavailable_once_and_clears_state() {
    let clock = TestClock::new();
    let (mut t, rec) = build(ScriptedSource::new(), &clock);
    assert!(!t.is_available());

    t.tick(Some(&at(0.0, 1.0)));
    assert!(t.is_available());
    assert!(t.zones()[0].is_occupied());

    clock.advance_ms(4999);
    t.poll();
    assert!(t.is_available());
    rec.take();

    clock.advance_ms(1);
    t.poll();
    assert!(!t.is_available());
    assert!(!t.occupied());
    assert!(!t.zones()[0].is_occupied(), "zone tables reset");
    let events = rec.take();
    assert!(events.contains(&Event::Presence {
        occupied: false,
        count: None
    }));
    assert!(events.contains(&Event::ZoneCount {
        zone: "Desk".into(),
        count: None
    }));
    assert!(events.contains(&Event::Target {
        slot: 0,
        name: "Target 1".into(),
        values: None
    }));

    clock.advance_ms(10_000);
    t.poll();
    assert!(rec.take().is_empty(), "fires once per outage");

    t.tick(Some(&at(0.0, 1.0)));
    assert!(t.is_available());
}

#[rstest]
fn changed_values_republish_on_interval() {
    let clock = TestClock::new();
    let (mut t, rec) = build(ScriptedSource::new(), &clock);

    t.tick(Some(&at(0.0, 1.0)));
    let first: Vec<_> = rec
        .take()
        .into_iter()
        .filter(|e| matches!(e, Event::Target { .. }))
        .collect();
    assert_eq!(first.len(), 1, "activation edge publishes immediately");

    clock.advance_ms(100);
    t.tick(Some(&at(0.1, 1.0)));
    assert!(
        !rec.take().iter().any(|e| matches!(e, Event::Target { .. })),
        "value changes wait for the timer"
    );

    clock.advance_ms(900);
    t.poll();
    match rec.take().as_slice() {
        [Event::Target { values: Some(v), .. }] => assert_eq!(v.x, 0.1),
        other => panic!("expected one target update, got {other:?}"),
    }

    clock.advance_ms(1000);
    t.poll();
    assert!(rec.take().is_empty(), "unchanged values are not republished");
}

#[rstest]
fn step_survives_source_errors() {
    let clock = TestClock::new();
    let mut source = ScriptedSource::new();
    source
        .push_frame(RawFrame::single(0, RawReading::present(0.0, 1.0, 0.0, 0.36)))
        .push_error(HwError::Timeout)
        .push_error(HwError::Disconnected)
        .push_gap();
    let (mut t, _) = build(source, &clock);

    assert!(t.step().frame);
    for _ in 0..3 {
        let r = t.step();
        assert!(!r.frame);
        assert!(r.occupied, "state carried forward");
    }
}

#[rstest]
fn publisher_failures_do_not_stop_ticks() {
    struct Failing;
    impl mmwave_traits::Publisher for Failing {
        fn publish_target(
            &mut self,
            _: usize,
            _: &str,
            _: Option<&mmwave_traits::TargetValues>,
        ) -> Result<(), mmwave_traits::BoxError> {
            Err("offline".into())
        }
        fn publish_zone_occupancy(&mut self, _: &str, _: bool) -> Result<(), mmwave_traits::BoxError> {
            Err("offline".into())
        }
        fn publish_zone_target_count(
            &mut self,
            _: &str,
            _: Option<u8>,
        ) -> Result<(), mmwave_traits::BoxError> {
            Err("offline".into())
        }
        fn publish_presence(&mut self, _: bool, _: Option<u8>) -> Result<(), mmwave_traits::BoxError> {
            Err("offline".into())
        }
    }

    let mut t = Tracker::builder()
        .with_source(ScriptedSource::new())
        .with_publisher(Failing)
        .with_config(cfg())
        .build()
        .unwrap();
    let r = t.tick(Some(&at(0.0, 1.0)));
    assert!(r.zones[0].occupied);

    // and the null publisher accepts everything
    let mut quiet = Tracker::builder()
        .with_source(ScriptedSource::new())
        .with_publisher(NullPublisher)
        .build()
        .unwrap();
    assert_eq!(quiet.tick(Some(&at(0.0, 1.0))).target_count, 1);
}
