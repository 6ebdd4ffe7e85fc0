#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and recorded-frame parsing for the mmWave tracker.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The frames CSV loader enforces headers and groups rows into decoded frames.
use std::collections::HashSet;

use mmwave_traits::{RawFrame, RawReading, SLOT_COUNT};
use serde::Deserialize;

/// Upper bound on `[[zones]]` entries, also enforced by the tracker builder.
pub const MAX_ZONES: usize = 16;

/// A limit is either a plain number (fixed) or a table (live adjustable).
///
/// ```toml
/// min_tilt_angle = -60.0
/// max_tilt_angle = { initial = 60.0, step = 1.0, restore = true }
/// ```
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum LimitToml {
    Fixed(f32),
    Adjustable(AdjustableLimit),
}

/// Missing fields take the per-limit defaults (see `Config::max_distance`).
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct AdjustableLimit {
    pub initial: Option<f32>,
    pub step: Option<f32>,
    pub restore: Option<bool>,
}

impl LimitToml {
    /// Configured starting value, falling back to `default_initial`.
    pub fn initial_or(&self, default_initial: f32) -> f32 {
        match self {
            LimitToml::Fixed(v) => *v,
            LimitToml::Adjustable(a) => a.initial.unwrap_or(default_initial),
        }
    }

    fn step(&self) -> Option<f32> {
        match self {
            LimitToml::Fixed(_) => None,
            LimitToml::Adjustable(a) => a.step,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TargetToml {
    pub name: Option<String>,
    pub debug: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZoneToml {
    pub name: String,
    #[serde(default = "default_zone_margin")]
    pub margin: f32,
    #[serde(default = "default_target_timeout_ms")]
    pub target_timeout_ms: u64,
    /// Ordered `[x, y]` vertices in meters.
    pub polygon: Vec<[f32; 2]>,
    #[serde(default = "yes")]
    pub report_occupancy: bool,
    #[serde(default = "yes")]
    pub report_target_count: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Timing {
    /// No frame for this long marks the sensor unavailable (0 disables).
    pub unavailable_timeout_ms: u64,
    /// Periodic republish cadence for changed target values.
    pub publish_interval_ms: u64,
    /// Max wait per frame read.
    pub frame_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            unavailable_timeout_ms: 5000,
            publish_interval_ms: 1000,
            frame_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Storage {
    /// TOML file holding restorable limit values; in-memory only when absent.
    pub limits_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub flip_x_axis: bool,
    #[serde(default)]
    pub fast_off_detection: bool,
    #[serde(default = "default_fast_off_window")]
    pub fast_off_window: u8,
    #[serde(default = "default_distance_margin")]
    pub max_distance_margin: f32,
    #[serde(default)]
    pub tilt_angle_margin: f32,
    /// Default: adjustable, initial 6.0 m, step 0.1 m, restore.
    #[serde(default)]
    pub max_distance: Option<LimitToml>,
    /// Default: adjustable, initial -90°, step 1°, restore.
    #[serde(default)]
    pub min_tilt_angle: Option<LimitToml>,
    /// Default: adjustable, initial 90°, step 1°, restore.
    #[serde(default)]
    pub max_tilt_angle: Option<LimitToml>,
    /// Published slots, 1..=3 entries when present.
    #[serde(default)]
    pub targets: Option<Vec<TargetToml>>,
    #[serde(default)]
    pub zones: Vec<ZoneToml>,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub storage: Storage,
}

fn default_name() -> String {
    "LD2450".to_string()
}
fn default_fast_off_window() -> u8 {
    2
}
fn default_distance_margin() -> f32 {
    0.25
}
fn default_zone_margin() -> f32 {
    0.25
}
fn default_target_timeout_ms() -> u64 {
    5000
}
fn yes() -> bool {
    true
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn min_tilt_initial(&self) -> f32 {
        self.min_tilt_angle.map_or(-90.0, |l| l.initial_or(-90.0))
    }

    pub fn max_tilt_initial(&self) -> f32 {
        self.max_tilt_angle.map_or(90.0, |l| l.initial_or(90.0))
    }

    pub fn max_distance_initial(&self) -> f32 {
        self.max_distance.map_or(6.0, |l| l.initial_or(6.0))
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Tracking
        if self.name.trim().is_empty() {
            eyre::bail!("name must not be empty");
        }
        if self.fast_off_window == 0 {
            eyre::bail!("fast_off_window must be >= 1");
        }

        // Limits
        if !(0.0..=6.0).contains(&self.max_distance_margin) {
            eyre::bail!("max_distance_margin must be in [0.0, 6.0]");
        }
        if !(0.0..=45.0).contains(&self.tilt_angle_margin) {
            eyre::bail!("tilt_angle_margin must be in [0.0, 45.0]");
        }
        if !(0.0..=6.0).contains(&self.max_distance_initial()) {
            eyre::bail!("max_distance must be in [0.0, 6.0]");
        }
        if !(-90.0..=90.0).contains(&self.min_tilt_initial()) {
            eyre::bail!("min_tilt_angle must be in [-90.0, 90.0]");
        }
        if !(-90.0..=90.0).contains(&self.max_tilt_initial()) {
            eyre::bail!("max_tilt_angle must be in [-90.0, 90.0]");
        }
        if self.min_tilt_initial() >= self.max_tilt_initial() {
            eyre::bail!(
                "min_tilt_angle ({}) must be < max_tilt_angle ({})",
                self.min_tilt_initial(),
                self.max_tilt_initial()
            );
        }
        for (key, limit) in [
            ("max_distance", &self.max_distance),
            ("min_tilt_angle", &self.min_tilt_angle),
            ("max_tilt_angle", &self.max_tilt_angle),
        ] {
            if let Some(step) = limit.and_then(|l| l.step())
                && !(step.is_finite() && step > 0.0)
            {
                eyre::bail!("{key}.step must be > 0");
            }
        }

        // Targets
        if let Some(targets) = &self.targets
            && !(1..=SLOT_COUNT).contains(&targets.len())
        {
            eyre::bail!(
                "targets must have 1..={SLOT_COUNT} entries, got {}",
                targets.len()
            );
        }

        // Zones
        if self.zones.len() > MAX_ZONES {
            eyre::bail!(
                "zones must have at most {MAX_ZONES} entries, got {}",
                self.zones.len()
            );
        }
        let mut names = HashSet::new();
        for z in &self.zones {
            if z.name.trim().is_empty() {
                eyre::bail!("zones.name must not be empty");
            }
            if !names.insert(z.name.as_str()) {
                eyre::bail!("zones.name '{}' is duplicated", z.name);
            }
            if !(z.margin.is_finite() && z.margin >= 0.0) {
                eyre::bail!("zones.margin must be >= 0 (zone '{}')", z.name);
            }
            if z.polygon.len() < 3 {
                eyre::bail!(
                    "zones.polygon must have at least 3 points (zone '{}', got {})",
                    z.name,
                    z.polygon.len()
                );
            }
        }

        // Timing
        if self.timing.frame_timeout_ms == 0 {
            eyre::bail!("timing.frame_timeout_ms must be >= 1");
        }
        if self.timing.publish_interval_ms == 0 {
            eyre::bail!("timing.publish_interval_ms must be >= 1");
        }
        if self.timing.frame_timeout_ms > 60_000 {
            eyre::bail!("timing.frame_timeout_ms is unreasonably large (>60s)");
        }

        // Logging
        if let Some(rotation) = self.logging.rotation.as_deref()
            && !matches!(rotation, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got '{rotation}'");
        }
        Ok(())
    }
}

/// Recorded frames CSV schema.
///
/// Expected headers:
/// t_ms,slot,x,y,speed,resolution
///
/// Rows sharing `t_ms` form one frame; `resolution == 0` marks an empty slot and
/// slots missing from a frame are absent.
///
/// Example:
/// t_ms,slot,x,y,speed,resolution
/// 0,0,0.2,0.2,0.0,0.36
/// 100,0,0.25,0.2,0.1,0.36
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct FrameRow {
    pub t_ms: u64,
    pub slot: usize,
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub resolution: f32,
}

/// One decoded frame and the time (ms from recording start) it arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedFrame {
    pub t_ms: u64,
    pub frame: RawFrame,
}

/// Group rows into frames. Rows must be sorted by `t_ms`.
pub fn frames_from_rows(rows: &[FrameRow]) -> eyre::Result<Vec<RecordedFrame>> {
    let mut out: Vec<RecordedFrame> = Vec::new();
    let mut seen = [false; SLOT_COUNT];
    for (idx, row) in rows.iter().enumerate() {
        if row.slot >= SLOT_COUNT {
            eyre::bail!(
                "row {}: slot {} out of range 0..={}",
                idx + 1,
                row.slot,
                SLOT_COUNT - 1
            );
        }
        let starts_frame = match out.last() {
            None => true,
            Some(last) if row.t_ms > last.t_ms => true,
            Some(last) if row.t_ms == last.t_ms => false,
            Some(last) => eyre::bail!(
                "row {}: t_ms {} goes backwards (previous {})",
                idx + 1,
                row.t_ms,
                last.t_ms
            ),
        };
        if starts_frame {
            out.push(RecordedFrame {
                t_ms: row.t_ms,
                frame: RawFrame::empty(),
            });
            seen = [false; SLOT_COUNT];
        }
        if std::mem::replace(&mut seen[row.slot], true) {
            eyre::bail!(
                "row {}: slot {} appears twice at t_ms {}",
                idx + 1,
                row.slot,
                row.t_ms
            );
        }
        if row.resolution != 0.0
            && let Some(frame) = out.last_mut()
        {
            frame.frame.readings[row.slot] =
                RawReading::present(row.x, row.y, row.speed, row.resolution);
        }
    }
    Ok(out)
}

/// Parse a frames CSV from any reader (headers enforced).
pub fn read_frames_csv<R: std::io::Read>(reader: R) -> eyre::Result<Vec<RecordedFrame>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers: {}", e))?
        .clone();
    let expected = ["t_ms", "slot", "x", "y", "speed", "resolution"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "frames CSV must have headers 't_ms,slot,x,y,speed,resolution', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<FrameRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    frames_from_rows(&rows)
}

pub fn load_frames_csv(path: &std::path::Path) -> eyre::Result<Vec<RecordedFrame>> {
    let file = std::fs::File::open(path)
        .map_err(|e| eyre::eyre!("open frames CSV {:?}: {}", path, e))?;
    read_frames_csv(std::io::BufReader::new(file))
}
