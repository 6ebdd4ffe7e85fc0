//! Snapshot returned from each tick of the tracker.

use mmwave_traits::{SLOT_COUNT, TargetValues};

pub use crate::zone::ZoneStatus;

/// What one tick (or one watchdog pass) left behind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickReport {
    /// A frame was processed; `false` for "no frame" ticks.
    pub frame: bool,
    /// The sensor has delivered a frame within the unavailable timeout.
    pub available: bool,
    /// Any slot active.
    pub occupied: bool,
    /// Number of active slots.
    pub target_count: u8,
    /// Calibrated values per slot, `None` while inactive.
    pub targets: [Option<TargetValues>; SLOT_COUNT],
    /// Per-zone aggregates, in configuration order.
    pub zones: Vec<ZoneStatus>,
}

impl TickReport {
    pub fn zone(&self, index: usize) -> Option<ZoneStatus> {
        self.zones.get(index).copied()
    }
}
