//! Per-slot target state: calibration, kinematics and fast-off debounce.

use mmwave_traits::{RawReading, TargetValues};

use crate::geometry::Point;
use crate::limits::Limits;

/// Minimum spacing between two debug reports of the same slot.
pub const DEBUG_INTERVAL_MS: u64 = 1000;

/// Slot-independent calibration switches, shared by all three slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetPolicy {
    /// Negate the lateral axis (sensor mounted upside down).
    pub flip_x_axis: bool,
    /// `Some(w)`: a slot goes inactive only after `w` consecutive empty frames.
    /// `None`: it goes inactive on the first empty frame.
    pub fast_off_window: Option<u8>,
}

/// What a single update did to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Valid reading stored.
    Accepted,
    /// Reading outside the detection limits; slot inactive this tick.
    Rejected,
    /// Slot reported empty and is (now) inactive.
    Absent,
    /// Slot reported empty, still inside the fast-off window.
    Held,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetState {
    name: String,
    debug: bool,
    published: bool,
    active: bool,
    x: f32,
    y: f32,
    speed: f32,
    distance: f32,
    angle: f32,
    distance_resolution: f32,
    absent_ticks: u8,
    last_change_ms: u64,
    last_debug_ms: Option<u64>,
}

impl TargetState {
    /// `published` marks slots the user configured; the remaining slots are still
    /// tracked (they take part in zones and global occupancy) but are not reported.
    pub fn new(name: impl Into<String>, debug: bool, published: bool) -> Self {
        Self {
            name: name.into(),
            debug,
            published,
            active: false,
            x: 0.0,
            y: 0.0,
            speed: 0.0,
            distance: 0.0,
            angle: 0.0,
            distance_resolution: 0.0,
            absent_ticks: 0,
            last_change_ms: 0,
            last_debug_ms: None,
        }
    }

    pub fn update(
        &mut self,
        slot: usize,
        reading: &RawReading,
        policy: &TargetPolicy,
        limits: &Limits,
        now_ms: u64,
    ) -> UpdateOutcome {
        if !reading.present {
            return self.mark_absent(policy);
        }

        let x = if policy.flip_x_axis {
            -reading.x
        } else {
            reading.x
        };
        let y = reading.y;
        let distance = x.hypot(y);
        let angle = x.atan2(y).to_degrees();

        if !(distance.is_finite() && angle.is_finite() && reading.speed.is_finite())
            || !limits.accepts(distance, angle, self.active)
        {
            if self.active {
                tracing::trace!(slot, distance, angle, "reading outside detection limits");
            }
            self.active = false;
            return UpdateOutcome::Rejected;
        }

        let changed = x != self.x
            || y != self.y
            || reading.speed != self.speed
            || reading.resolution != self.distance_resolution;
        if changed || !self.active {
            self.last_change_ms = now_ms;
        }

        self.x = x;
        self.y = y;
        self.distance = distance;
        self.angle = angle;
        self.speed = reading.speed;
        self.distance_resolution = reading.resolution;
        self.active = true;
        self.absent_ticks = 0;

        if self.debug && self.debug_due(now_ms) {
            self.last_debug_ms = Some(now_ms);
            tracing::debug!(
                target_name = %self.name,
                slot,
                raw_x = reading.x,
                raw_y = reading.y,
                raw_speed = reading.speed,
                raw_resolution = reading.resolution,
                x = self.x,
                y = self.y,
                distance = self.distance,
                angle = self.angle,
                "target reading"
            );
        }
        UpdateOutcome::Accepted
    }

    fn mark_absent(&mut self, policy: &TargetPolicy) -> UpdateOutcome {
        match policy.fast_off_window {
            Some(window) if self.active => {
                self.absent_ticks = self.absent_ticks.saturating_add(1);
                if self.absent_ticks >= window.max(1) {
                    self.active = false;
                    UpdateOutcome::Absent
                } else {
                    UpdateOutcome::Held
                }
            }
            _ => {
                self.active = false;
                UpdateOutcome::Absent
            }
        }
    }

    fn debug_due(&self, now_ms: u64) -> bool {
        self.last_debug_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= DEBUG_INTERVAL_MS)
    }

    /// Drop to inactive with zeroed values.
    pub fn clear(&mut self) {
        let (name, debug, published) = (std::mem::take(&mut self.name), self.debug, self.published);
        *self = Self::new(name, debug, published);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn is_published(&self) -> bool {
        self.published
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_moving(&self) -> bool {
        self.speed != 0.0
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn distance_resolution(&self) -> f32 {
        self.distance_resolution
    }

    /// Tick time (ms since tracker start) of the last accepted value change.
    pub fn last_change_ms(&self) -> u64 {
        self.last_change_ms
    }

    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Calibrated values, or `None` while inactive.
    pub fn values(&self) -> Option<TargetValues> {
        self.active.then_some(TargetValues {
            x: self.x,
            y: self.y,
            speed: self.speed,
            distance: self.distance,
            angle: self.angle,
            distance_resolution: self.distance_resolution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limits::LimitMode;

    fn open_limits() -> Limits {
        Limits::default()
    }

    #[test]
    fn derives_distance_and_angle() {
        let mut t = TargetState::new("t", false, true);
        let out = t.update(
            0,
            &RawReading::present(1.0, 1.0, 0.5, 0.1),
            &TargetPolicy::default(),
            &open_limits(),
            10,
        );
        assert_eq!(out, UpdateOutcome::Accepted);
        assert!(t.is_active());
        assert!((t.distance() - 2f32.sqrt()).abs() < 1e-6);
        assert!((t.angle() - 45.0).abs() < 1e-4);
        assert!(t.is_moving());
        assert_eq!(t.last_change_ms(), 10);
    }

    #[test]
    fn flip_negates_x_and_angle() {
        let mut t = TargetState::new("t", false, true);
        let policy = TargetPolicy {
            flip_x_axis: true,
            fast_off_window: None,
        };
        t.update(0, &RawReading::present(0.5, 1.0, 0.0, 0.1), &policy, &open_limits(), 0);
        assert_eq!(t.x(), -0.5);
        assert!(t.angle() < 0.0);
    }

    #[test]
    fn rejection_keeps_last_known_position() {
        let limits = Limits::new(
            LimitMode::Fixed(3.0),
            LimitMode::Fixed(-90.0),
            LimitMode::Fixed(90.0),
            0.0,
            0.0,
        )
        .unwrap();
        let mut t = TargetState::new("t", false, true);
        let policy = TargetPolicy::default();
        t.update(0, &RawReading::present(0.0, 2.0, 0.0, 0.1), &policy, &limits, 0);
        let out = t.update(0, &RawReading::present(0.0, 3.5, 0.0, 0.1), &policy, &limits, 1);
        assert_eq!(out, UpdateOutcome::Rejected);
        assert!(!t.is_active());
        assert_eq!(t.y(), 2.0);
        assert_eq!(t.values(), None);
    }

    #[test]
    fn clear_resets_values_but_keeps_identity() {
        let mut t = TargetState::new("Desk", true, true);
        t.update(
            0,
            &RawReading::present(0.2, 0.4, 0.0, 0.1),
            &TargetPolicy::default(),
            &open_limits(),
            0,
        );
        t.clear();
        assert!(!t.is_active());
        assert_eq!(t.x(), 0.0);
        assert_eq!(t.name(), "Desk");
        assert!(t.is_debug());
    }
}
