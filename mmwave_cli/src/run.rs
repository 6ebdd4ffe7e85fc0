//! Command bodies: config loading, store selection, replay and simulation loops.

use crate::output::StdoutPublisher;
use eyre::{Result, WrapErr};
use mmwave_config::Config;
use mmwave_core::mocks::{NoFrames, NullPublisher};
use mmwave_core::{LimitKind, TickReport, Tracker, TrackerCfg};
use mmwave_hardware::{FileLimitStore, MemoryStore, ReplayClock, ScriptedSource, SimulatedRadar};
use mmwave_traits::{FrameSource, LimitStore, Publisher};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Read, parse and validate the TOML config.
pub fn load_config(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config file {}", path.display()))?;
    let cfg = mmwave_config::load_toml(&text)
        .wrap_err_with(|| format!("failed to parse TOML in {}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(cfg)
}

/// File-backed when `storage.limits_file` is set, otherwise in-memory.
pub fn open_store(cfg: &Config) -> Result<Box<dyn LimitStore>> {
    match cfg.storage.limits_file.as_deref() {
        Some(path) => {
            let store = FileLimitStore::open(path)
                .wrap_err_with(|| format!("failed to open limits file {path}"))?;
            Ok(Box::new(store))
        }
        None => Ok(Box::new(MemoryStore::new())),
    }
}

fn build(
    cfg: &Config,
    source: impl FrameSource + 'static,
    publisher: impl Publisher + 'static,
    clock: &ReplayClock,
) -> Result<Tracker> {
    let store = open_store(cfg)?;
    Tracker::builder()
        .with_source(source)
        .with_publisher(publisher)
        .with_config(TrackerCfg::from(cfg))
        .with_store(store)
        .with_clock(Box::new(clock.clone()))
        .build()
}

fn apply_limits(tracker: &mut Tracker, limits: &[(LimitKind, f32)]) -> Result<()> {
    for &(kind, value) in limits {
        tracker.set_limit(kind, value)?;
    }
    Ok(())
}

/// Outcome of a replay or simulation run.
#[derive(Debug, Clone)]
pub struct Summary {
    pub frames: u64,
    pub elapsed_ms: u64,
    pub last: TickReport,
}

impl Summary {
    pub fn print(&self, json: bool) {
        if json {
            println!(
                "{}",
                json!({
                    "event": "summary",
                    "frames": self.frames,
                    "elapsed_ms": self.elapsed_ms,
                    "available": self.last.available,
                    "occupied": self.last.occupied,
                    "target_count": self.last.target_count,
                })
            );
        } else {
            println!(
                "processed {} frames over {} ms: occupied={} targets={}",
                self.frames, self.elapsed_ms, self.last.occupied, self.last.target_count
            );
        }
    }
}

pub fn run_replay(
    cfg: &Config,
    frames: &Path,
    limits: &[(LimitKind, f32)],
    json: bool,
) -> Result<Summary> {
    let recorded = mmwave_config::load_frames_csv(frames)?;
    let t0 = recorded.first().map_or(0, |r| r.t_ms);
    let clock = ReplayClock::new();
    let source = ScriptedSource::from_frames(recorded.iter().map(|r| r.frame));
    let mut tracker = build(cfg, source, StdoutPublisher::new(json), &clock)?;
    apply_limits(&mut tracker, limits)?;
    tracing::info!(frames = recorded.len(), path = %frames.display(), "replay start");

    let mut last = tracker.report();
    for rec in &recorded {
        clock.set_ms(rec.t_ms - t0);
        tracker.poll();
        last = tracker.step();
    }
    let summary = Summary {
        frames: recorded.len() as u64,
        elapsed_ms: clock.elapsed_ms(),
        last,
    };
    tracing::info!(frames = summary.frames, elapsed_ms = summary.elapsed_ms, "replay done");
    Ok(summary)
}

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub people: usize,
    pub seed: u64,
    pub period_ms: u64,
    pub dropout: f32,
    pub duration_ms: u64,
    pub realtime: bool,
}

pub fn run_simulate(
    cfg: &Config,
    opts: &SimOptions,
    limits: &[(LimitKind, f32)],
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> Result<Summary> {
    let radar = SimulatedRadar::new(opts.seed)
        .with_people(opts.people)
        .with_period(Duration::from_millis(opts.period_ms))
        .with_dropout(opts.dropout);
    let period = radar.period();
    let clock = ReplayClock::new();
    let mut tracker = build(cfg, radar, StdoutPublisher::new(json), &clock)?;
    apply_limits(&mut tracker, limits)?;
    tracing::info!(
        people = opts.people,
        seed = opts.seed,
        period_ms = opts.period_ms,
        duration_ms = opts.duration_ms,
        "simulation start"
    );

    let mut frames = 0u64;
    let mut last = tracker.report();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(frames, "interrupted");
            break;
        }
        if opts.duration_ms > 0 && clock.elapsed_ms() >= opts.duration_ms {
            break;
        }
        // ReplayClock::sleep advances simulated time without blocking
        mmwave_traits::Clock::sleep(&clock, period);
        tracker.poll();
        last = tracker.step();
        frames += 1;
        if opts.realtime {
            std::thread::sleep(period);
        }
    }
    Ok(Summary {
        frames,
        elapsed_ms: clock.elapsed_ms(),
        last,
    })
}

/// Build the tracker without running it and log the effective settings.
pub fn check_config(cfg: &Config, json: bool) -> Result<()> {
    let tracker = build(cfg, NoFrames, NullPublisher, &ReplayClock::new())?;
    tracker.dump_config();
    let published = tracker.targets().iter().filter(|t| t.is_published()).count();
    if json {
        println!(
            "{}",
            json!({
                "event": "config",
                "name": tracker.name(),
                "zones": tracker.zones().len(),
                "published_targets": published,
                "max_distance": tracker.limits().max_distance(),
                "min_tilt_angle": tracker.limits().min_tilt_angle(),
                "max_tilt_angle": tracker.limits().max_tilt_angle(),
            })
        );
    } else {
        println!(
            "config OK: \"{}\" with {} zone(s), {} published target(s), max_distance={} tilt=[{}, {}]",
            tracker.name(),
            tracker.zones().len(),
            published,
            tracker.limits().max_distance(),
            tracker.limits().min_tilt_angle(),
            tracker.limits().max_tilt_angle()
        );
    }
    Ok(())
}
