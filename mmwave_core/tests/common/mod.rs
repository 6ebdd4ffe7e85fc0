#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use mmwave_core::{Point, Timing, Tracker, TrackerCfg};
use mmwave_core::mocks::NoFrames;
use mmwave_traits::clock::test_clock::TestClock;
use mmwave_traits::{BoxError, Publisher, RawFrame, RawReading, TargetValues};

/// Everything a `Publisher` was asked to publish, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Target {
        slot: usize,
        name: String,
        values: Option<TargetValues>,
    },
    ZoneOccupancy {
        zone: String,
        occupied: bool,
    },
    ZoneCount {
        zone: String,
        count: Option<u8>,
    },
    Presence {
        occupied: bool,
        count: Option<u8>,
    },
}

#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    fn push(&self, e: Event) {
        self.events.lock().unwrap().push(e);
    }
}

impl Publisher for Recorder {
    fn publish_target(
        &mut self,
        slot: usize,
        name: &str,
        values: Option<&TargetValues>,
    ) -> Result<(), BoxError> {
        self.push(Event::Target {
            slot,
            name: name.to_string(),
            values: values.copied(),
        });
        Ok(())
    }

    fn publish_zone_occupancy(&mut self, zone: &str, occupied: bool) -> Result<(), BoxError> {
        self.push(Event::ZoneOccupancy {
            zone: zone.to_string(),
            occupied,
        });
        Ok(())
    }

    fn publish_zone_target_count(&mut self, zone: &str, count: Option<u8>) -> Result<(), BoxError> {
        self.push(Event::ZoneCount {
            zone: zone.to_string(),
            count,
        });
        Ok(())
    }

    fn publish_presence(&mut self, occupied: bool, count: Option<u8>) -> Result<(), BoxError> {
        self.push(Event::Presence { occupied, count });
        Ok(())
    }
}

pub fn at(x: f32, y: f32) -> RawFrame {
    RawFrame::single(0, RawReading::present(x, y, 0.0, 0.36))
}

pub fn pts(raw: &[(f32, f32)]) -> Vec<Point> {
    raw.iter().copied().map(Point::from).collect()
}

/// Tracker driven by `tick`, on a manual clock, with the watchdog off.
pub fn tracker(cfg: TrackerCfg) -> (Tracker, TestClock, Recorder) {
    let clock = TestClock::new();
    let rec = Recorder::default();
    let cfg = TrackerCfg {
        timing: Timing {
            unavailable_timeout_ms: 0,
            ..cfg.timing.clone()
        },
        ..cfg
    };
    let t = Tracker::builder()
        .with_source(NoFrames)
        .with_publisher(rec.clone())
        .with_config(cfg)
        .with_clock(Box::new(clock.clone()))
        .build()
        .expect("tracker build");
    (t, clock, rec)
}
