#![no_main]
use libfuzzer_sys::fuzz_target;
use mmwave_core::mocks::{NoFrames, NullPublisher};
use mmwave_core::{Tracker, TrackerCfg};

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not. A config that
    // passes validation must also build or fail with a typed error.
    let Ok(cfg) = mmwave_config::load_toml(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    let built = Tracker::builder()
        .with_source(NoFrames)
        .with_publisher(NullPublisher)
        .with_config(TrackerCfg::from(&cfg))
        .build();
    if let Ok(mut tracker) = built {
        let _ = tracker.step();
        tracker.poll();
    }
});
