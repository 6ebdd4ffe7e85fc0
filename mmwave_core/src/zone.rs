//! Zone engine: polygon containment with a per-slot occupancy state machine.
//!
//! Each (zone, slot) pair is one of:
//!
//! - `Unseen`: not in the zone.
//! - `Inside`: active and contained this tick.
//! - `Grace { since_ms }`: was inside, currently not contained. Still occupies
//!   the zone until `target_timeout` has strictly elapsed since `since_ms`.
//!
//! `occupied` is true while any slot is `Inside` or `Grace`; `target_count` only
//! counts `Inside` slots.

use std::sync::Arc;

use mmwave_traits::SLOT_COUNT;

use crate::geometry::{Point, PolygonError, point_in_polygon, validate_polygon};
use crate::target::TargetState;

pub use mmwave_config::MAX_ZONES;

/// Produces a fresh polygon each time a dynamic zone is refreshed.
pub type PolygonTemplate = Arc<dyn Fn() -> Vec<Point> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotOccupancy {
    #[default]
    Unseen,
    Inside,
    Grace {
        since_ms: u64,
    },
}

impl SlotOccupancy {
    pub fn occupies(&self) -> bool {
        !matches!(self, SlotOccupancy::Unseen)
    }

    fn next(self, contained: bool, now_ms: u64, timeout_ms: u64) -> Self {
        match (self, contained) {
            (_, true) => SlotOccupancy::Inside,
            (SlotOccupancy::Unseen, false) => SlotOccupancy::Unseen,
            (SlotOccupancy::Inside, false) => SlotOccupancy::Grace { since_ms: now_ms },
            (SlotOccupancy::Grace { since_ms }, false) => {
                if now_ms.saturating_sub(since_ms) > timeout_ms {
                    SlotOccupancy::Unseen
                } else {
                    SlotOccupancy::Grace { since_ms }
                }
            }
        }
    }
}

/// Aggregate result of one zone evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneStatus {
    pub occupied: bool,
    pub target_count: u8,
}

enum PolygonSource {
    Static,
    Template {
        template: PolygonTemplate,
        interval_ms: u64,
        last_eval_ms: u64,
    },
}

impl core::fmt::Debug for PolygonSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PolygonSource::Static => f.write_str("Static"),
            PolygonSource::Template {
                interval_ms,
                last_eval_ms,
                ..
            } => f
                .debug_struct("Template")
                .field("interval_ms", interval_ms)
                .field("last_eval_ms", last_eval_ms)
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct Zone {
    name: String,
    margin: f32,
    target_timeout_ms: u64,
    polygon: Vec<Point>,
    source: PolygonSource,
    slots: [SlotOccupancy; SLOT_COUNT],
    report_occupancy: bool,
    report_target_count: bool,
}

impl Zone {
    /// Zone with a fixed polygon. The polygon is validated here and never again.
    pub fn new_static(
        name: impl Into<String>,
        polygon: Vec<Point>,
        margin: f32,
        target_timeout_ms: u64,
    ) -> Result<Self, PolygonError> {
        validate_polygon(&polygon)?;
        Ok(Self {
            name: name.into(),
            margin,
            target_timeout_ms,
            polygon,
            source: PolygonSource::Static,
            slots: [SlotOccupancy::Unseen; SLOT_COUNT],
            report_occupancy: true,
            report_target_count: true,
        })
    }

    /// Zone whose polygon is recomputed every `interval_ms` (0 = only once, now).
    pub fn new_template(
        name: impl Into<String>,
        template: PolygonTemplate,
        interval_ms: u64,
        margin: f32,
        target_timeout_ms: u64,
        now_ms: u64,
    ) -> Self {
        let mut zone = Self {
            name: name.into(),
            margin,
            target_timeout_ms,
            polygon: Vec::new(),
            source: PolygonSource::Template {
                template,
                interval_ms,
                last_eval_ms: now_ms,
            },
            slots: [SlotOccupancy::Unseen; SLOT_COUNT],
            report_occupancy: true,
            report_target_count: true,
        };
        zone.apply_template();
        zone
    }

    pub fn with_reporting(mut self, occupancy: bool, target_count: bool) -> Self {
        self.report_occupancy = occupancy;
        self.report_target_count = target_count;
        self
    }

    /// Re-run the template when its interval has elapsed. Returns whether the
    /// polygon was replaced.
    pub fn refresh_template(&mut self, now_ms: u64) -> bool {
        let due = match &mut self.source {
            PolygonSource::Template {
                interval_ms,
                last_eval_ms,
                ..
            } if *interval_ms != 0 && now_ms.saturating_sub(*last_eval_ms) >= *interval_ms => {
                *last_eval_ms = now_ms;
                true
            }
            _ => false,
        };
        due && self.apply_template()
    }

    fn apply_template(&mut self) -> bool {
        let PolygonSource::Template { template, .. } = &self.source else {
            return false;
        };
        let points = template();
        if points.len() < 3 || points.iter().any(|p| !p.is_finite()) {
            tracing::warn!(
                zone = %self.name,
                points = points.len(),
                "template polygon discarded; keeping previous polygon"
            );
            return false;
        }
        self.polygon = points;
        true
    }

    /// Replace the polygon at runtime. Fully validated; on error the previous
    /// polygon stays in place. Occupancy timers are kept.
    pub fn update_polygon(&mut self, polygon: Vec<Point>) -> Result<(), PolygonError> {
        validate_polygon(&polygon)?;
        self.polygon = polygon;
        Ok(())
    }

    /// Advance every slot's state machine against the current target list.
    pub fn evaluate(&mut self, targets: &[TargetState; SLOT_COUNT], now_ms: u64) -> ZoneStatus {
        if self.polygon.len() < 3 {
            return self.status();
        }
        for (slot, target) in targets.iter().enumerate() {
            let contained =
                target.is_active() && point_in_polygon(target.position(), &self.polygon, self.margin);
            let prev = self.slots[slot];
            let next = prev.next(contained, now_ms, self.target_timeout_ms);
            if std::mem::discriminant(&prev) != std::mem::discriminant(&next) {
                tracing::debug!(zone = %self.name, slot, from = ?prev, to = ?next, "zone transition");
            }
            self.slots[slot] = next;
        }
        self.status()
    }

    pub fn status(&self) -> ZoneStatus {
        ZoneStatus {
            occupied: self.slots.iter().any(SlotOccupancy::occupies),
            target_count: self
                .slots
                .iter()
                .filter(|s| matches!(s, SlotOccupancy::Inside))
                .count() as u8,
        }
    }

    /// Forget all slots (sensor went away).
    pub fn reset(&mut self) {
        self.slots = [SlotOccupancy::Unseen; SLOT_COUNT];
    }

    pub fn is_occupied(&self) -> bool {
        self.status().occupied
    }

    pub fn target_count(&self) -> u8 {
        self.status().target_count
    }

    pub fn slot_state(&self, slot: usize) -> Option<SlotOccupancy> {
        self.slots.get(slot).copied()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn target_timeout_ms(&self) -> u64 {
        self.target_timeout_ms
    }

    pub fn polygon(&self) -> &[Point] {
        &self.polygon
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self.source, PolygonSource::Template { .. })
    }

    /// Template interval, `None` for static zones.
    pub fn template_interval_ms(&self) -> Option<u64> {
        match self.source {
            PolygonSource::Template { interval_ms, .. } => Some(interval_ms),
            PolygonSource::Static => None,
        }
    }

    pub fn reports_occupancy(&self) -> bool {
        self.report_occupancy
    }

    pub fn reports_target_count(&self) -> bool {
        self.report_target_count
    }
}
