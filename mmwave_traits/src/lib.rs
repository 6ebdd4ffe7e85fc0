//! Seam traits and the decoded-frame contract shared across the mmWave stack.
//!
//! The transport (UART framing, checksums) lives behind [`FrameSource`]; the
//! presentation entities live behind [`Publisher`]; persisted calibration values
//! live behind [`LimitStore`]. Everything in between is `mmwave_core`.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

use std::error::Error;
use std::time::Duration;

/// Number of tracking slots a radar frame carries. Hard protocol limit.
pub const SLOT_COUNT: usize = 3;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// One already-decoded target tuple for a single slot.
///
/// Units: meters for `x`, `y`, `resolution`; meters per second for `speed`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawReading {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub resolution: f32,
    pub present: bool,
}

impl RawReading {
    pub fn present(x: f32, y: f32, speed: f32, resolution: f32) -> Self {
        Self {
            x,
            y,
            speed,
            resolution,
            present: true,
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }
}

/// A decoded frame: one reading per slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawFrame {
    pub readings: [RawReading; SLOT_COUNT],
}

impl RawFrame {
    pub fn new(readings: [RawReading; SLOT_COUNT]) -> Self {
        Self { readings }
    }

    /// Frame with only `slot` populated.
    pub fn single(slot: usize, reading: RawReading) -> Self {
        let mut frame = Self::default();
        if let Some(r) = frame.readings.get_mut(slot) {
            *r = reading;
        }
        frame
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Calibrated per-target values handed to presentation entities.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetValues {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub distance: f32,
    pub angle: f32,
    pub distance_resolution: f32,
}

/// Delivers decoded frames.
///
/// `Ok(None)` is the explicit "no frame" signal (nothing arrived within `timeout`,
/// or the transport dropped a garbled frame).
pub trait FrameSource {
    fn read_frame(&mut self, timeout: Duration) -> Result<Option<RawFrame>, BoxError>;
}

/// Receives everything the engine produces.
///
/// `None` values mean "unknown / not present" (the entity shows no value).
pub trait Publisher {
    fn publish_target(
        &mut self,
        slot: usize,
        name: &str,
        values: Option<&TargetValues>,
    ) -> Result<(), BoxError>;
    fn publish_zone_occupancy(&mut self, zone: &str, occupied: bool) -> Result<(), BoxError>;
    fn publish_zone_target_count(&mut self, zone: &str, count: Option<u8>)
    -> Result<(), BoxError>;
    fn publish_presence(&mut self, occupied: bool, target_count: Option<u8>)
    -> Result<(), BoxError>;
}

/// Persisted storage for restorable calibration values.
pub trait LimitStore {
    fn load(&self, key: &str) -> Option<f32>;
    fn save(&mut self, key: &str, value: f32) -> Result<(), BoxError>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn read_frame(&mut self, timeout: Duration) -> Result<Option<RawFrame>, BoxError> {
        (**self).read_frame(timeout)
    }
}

impl<T: Publisher + ?Sized> Publisher for Box<T> {
    fn publish_target(
        &mut self,
        slot: usize,
        name: &str,
        values: Option<&TargetValues>,
    ) -> Result<(), BoxError> {
        (**self).publish_target(slot, name, values)
    }
    fn publish_zone_occupancy(&mut self, zone: &str, occupied: bool) -> Result<(), BoxError> {
        (**self).publish_zone_occupancy(zone, occupied)
    }
    fn publish_zone_target_count(
        &mut self,
        zone: &str,
        count: Option<u8>,
    ) -> Result<(), BoxError> {
        (**self).publish_zone_target_count(zone, count)
    }
    fn publish_presence(
        &mut self,
        occupied: bool,
        target_count: Option<u8>,
    ) -> Result<(), BoxError> {
        (**self).publish_presence(occupied, target_count)
    }
}

impl<T: LimitStore + ?Sized> LimitStore for Box<T> {
    fn load(&self, key: &str) -> Option<f32> {
        (**self).load(key)
    }
    fn save(&mut self, key: &str, value: f32) -> Result<(), BoxError> {
        (**self).save(key, value)
    }
}

/// Store that never holds anything; restore falls back to defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStore;

impl LimitStore for NoStore {
    fn load(&self, _key: &str) -> Option<f32> {
        None
    }
    fn save(&mut self, _key: &str, _value: f32) -> Result<(), BoxError> {
        Ok(())
    }
}
