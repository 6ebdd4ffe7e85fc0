//! The tick-driven tracking controller (`TrackerCore`).
//!
//! Owns the three target slots and every zone. Each tick drains queued limit
//! adjustments, updates the slots from the frame, evaluates the zones and
//! publishes the aggregates. `poll` runs the independent timer cadence:
//! dynamic polygon refresh, periodic republish and the availability watchdog.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel as xch;
use mmwave_traits::clock::Clock;
use mmwave_traits::{BoxError, FrameSource, LimitStore, Publisher, RawFrame, SLOT_COUNT, TargetValues};

use crate::config::Timing;
use crate::error::{Result, TrackerError};
use crate::geometry::Point;
use crate::hw_error::map_source_error;
use crate::limits::{LimitAdjust, LimitHandle, LimitKind, Limits};
use crate::status::TickReport;
use crate::target::{TargetPolicy, TargetState};
use crate::zone::{Zone, ZoneStatus};

/// Unified core for both the boxed `Tracker` and the generic `TrackerG`.
pub struct TrackerCore<S: FrameSource, P: Publisher> {
    pub(crate) source: S,
    pub(crate) publisher: P,
    pub(crate) store: Box<dyn LimitStore>,
    pub(crate) name: String,
    pub(crate) policy: TargetPolicy,
    pub(crate) limits: Limits,
    pub(crate) targets: [TargetState; SLOT_COUNT],
    pub(crate) zones: Vec<Zone>,
    pub(crate) timing: Timing,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) adjust_tx: xch::Sender<LimitAdjust>,
    pub(crate) adjust_rx: xch::Receiver<LimitAdjust>,

    pub(crate) available: bool,
    pub(crate) watchdog_fired: bool,
    pub(crate) last_frame_ms: u64,
    pub(crate) last_publish_ms: u64,
    pub(crate) published: [Option<TargetValues>; SLOT_COUNT],
}

impl<S: FrameSource, P: Publisher> core::fmt::Debug for TrackerCore<S, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TrackerCore")
            .field("name", &self.name)
            .field("available", &self.available)
            .field("target_count", &self.target_count())
            .field("zones", &self.zones.len())
            .finish()
    }
}

fn log_publish_error(res: std::result::Result<(), BoxError>, what: &'static str) {
    if let Err(e) = res {
        let err = TrackerError::Publish(e.to_string());
        tracing::warn!(error = %err, what, "publisher rejected update");
    }
}

impl<S: FrameSource, P: Publisher> TrackerCore<S, P> {
    /// Milliseconds since the tracker was built.
    #[inline]
    pub fn now_ms(&self) -> u64 {
        self.clock.ms_since(self.epoch)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn targets(&self) -> &[TargetState; SLOT_COUNT] {
        &self.targets
    }

    pub fn target(&self, slot: usize) -> Option<&TargetState> {
        self.targets.get(slot)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.name() == name)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// A frame arrived within the unavailable timeout.
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Any slot active.
    pub fn occupied(&self) -> bool {
        self.targets.iter().any(TargetState::is_active)
    }

    /// Number of active slots.
    pub fn target_count(&self) -> u8 {
        self.targets.iter().filter(|t| t.is_active()).count() as u8
    }

    /// Cloneable sender for live limit adjustments from other threads.
    pub fn limit_handle(&self) -> LimitHandle {
        LimitHandle::new(self.adjust_tx.clone())
    }

    /// Apply a limit adjustment now. Returns the clamped value that was stored.
    ///
    /// The value stays applied even when persisting it fails; the error is still
    /// returned so the caller can surface it.
    pub fn set_limit(&mut self, kind: LimitKind, value: f32) -> Result<f32> {
        let applied = self.limits.set(kind, value).map_err(eyre::Report::new)?;
        tracing::info!(limit = kind.key(), requested = value, applied, "limit adjusted");
        if self.limits.get(kind).restores() {
            self.store
                .save(kind.key(), applied)
                .map_err(|e| eyre::Report::new(TrackerError::Persist(e.to_string())))?;
        }
        Ok(applied)
    }

    fn drain_adjustments(&mut self) {
        while let Ok(adj) = self.adjust_rx.try_recv() {
            if let Err(e) = self.set_limit(adj.kind, adj.value) {
                tracing::warn!(error = %e, limit = adj.kind.key(), "queued limit adjustment failed");
            }
        }
    }

    /// Replace a zone's polygon at runtime. Fully validated; the old polygon is
    /// kept on error.
    pub fn update_zone_polygon(&mut self, zone: &str, points: Vec<Point>) -> Result<()> {
        let Some(z) = self.zones.iter_mut().find(|z| z.name() == zone) else {
            return Err(eyre::Report::new(TrackerError::Config(format!(
                "unknown zone '{zone}'"
            ))));
        };
        z.update_polygon(points).map_err(|e| {
            eyre::Report::new(TrackerError::Config(format!("zone '{zone}': {e}")))
        })?;
        tracing::info!(zone, points = z.polygon().len(), "zone polygon updated");
        Ok(())
    }

    /// One tick. `None` is the "no frame" signal: state is carried forward and
    /// nothing is published.
    pub fn tick(&mut self, frame: Option<&RawFrame>) -> TickReport {
        self.drain_adjustments();
        let Some(frame) = frame else {
            return self.report(false);
        };
        let now = self.now_ms();
        self.mark_frame(now);

        for (slot, (target, reading)) in self
            .targets
            .iter_mut()
            .zip(frame.readings.iter())
            .enumerate()
        {
            target.update(slot, reading, &self.policy, &self.limits, now);
        }

        let targets = &self.targets;
        let zones: Vec<ZoneStatus> = self
            .zones
            .iter_mut()
            .map(|z| z.evaluate(targets, now))
            .collect();

        self.publish_tick(&zones);
        TickReport {
            frame: true,
            available: self.available,
            occupied: self.occupied(),
            target_count: self.target_count(),
            targets: self.targets.each_ref().map(TargetState::values),
            zones,
        }
    }

    /// Read one frame from the source (waiting at most `frame_timeout_ms`) and
    /// tick on it. Source errors are logged and count as "no frame".
    pub fn step(&mut self) -> TickReport {
        let timeout = Duration::from_millis(self.timing.frame_timeout_ms);
        let frame = match self.source.read_frame(timeout) {
            Ok(frame) => frame,
            Err(e) => {
                match map_source_error(&*e) {
                    TrackerError::Timeout => tracing::trace!("frame read timed out"),
                    err => tracing::warn!(error = %err, "frame source error"),
                }
                None
            }
        };
        self.tick(frame.as_ref())
    }

    /// Timer cadence: refresh due dynamic polygons, republish changed target
    /// values every `publish_interval_ms` and run the availability watchdog.
    pub fn poll(&mut self) {
        let now = self.now_ms();
        for zone in &mut self.zones {
            if zone.refresh_template(now) {
                tracing::trace!(zone = zone.name(), "dynamic polygon refreshed");
            }
        }

        if now.saturating_sub(self.last_publish_ms) >= self.timing.publish_interval_ms {
            self.last_publish_ms = now;
            for slot in 0..SLOT_COUNT {
                let values = self.targets[slot].values();
                if self.targets[slot].is_published() && values != self.published[slot] {
                    self.publish_target(slot, values);
                }
            }
        }

        self.check_watchdog(now);
    }

    /// Snapshot of the current state without advancing anything.
    pub fn report(&self, frame: bool) -> TickReport {
        TickReport {
            frame,
            available: self.available,
            occupied: self.occupied(),
            target_count: self.target_count(),
            targets: self.targets.each_ref().map(TargetState::values),
            zones: self.zones.iter().map(Zone::status).collect(),
        }
    }

    /// Log the effective configuration.
    pub fn dump_config(&self) {
        tracing::info!(
            name = %self.name,
            flip_x_axis = self.policy.flip_x_axis,
            fast_off_window = ?self.policy.fast_off_window,
            "tracker"
        );
        for kind in LimitKind::ALL {
            let l = self.limits.get(kind);
            tracing::info!(
                limit = kind.key(),
                value = l.value(),
                min = l.min_bound(),
                max = l.max_bound(),
                step = ?l.step(),
                restore = l.restores(),
                "limit"
            );
        }
        tracing::info!(
            max_distance_margin = self.limits.distance_margin(),
            tilt_angle_margin = self.limits.tilt_margin(),
            "limit margins"
        );
        for (slot, t) in self.targets.iter().enumerate() {
            tracing::info!(slot, name = t.name(), debug = t.is_debug(), published = t.is_published(), "target");
        }
        for z in &self.zones {
            tracing::info!(
                zone = z.name(),
                margin = z.margin(),
                target_timeout_ms = z.target_timeout_ms(),
                points = z.polygon().len(),
                dynamic = z.is_dynamic(),
                interval_ms = ?z.template_interval_ms(),
                "zone"
            );
        }
        tracing::info!(
            unavailable_timeout_ms = self.timing.unavailable_timeout_ms,
            publish_interval_ms = self.timing.publish_interval_ms,
            frame_timeout_ms = self.timing.frame_timeout_ms,
            "timing"
        );
    }

    // ── Private ──────────────────────────────────────────────────────────────

    fn mark_frame(&mut self, now: u64) {
        self.last_frame_ms = now;
        if !self.available {
            tracing::info!(name = %self.name, "sensor available");
        }
        self.available = true;
        self.watchdog_fired = false;
    }

    fn check_watchdog(&mut self, now: u64) {
        let timeout = self.timing.unavailable_timeout_ms;
        if timeout == 0 || self.watchdog_fired {
            return;
        }
        if now.saturating_sub(self.last_frame_ms) < timeout {
            return;
        }
        self.watchdog_fired = true;
        self.available = false;
        tracing::error!(
            name = %self.name,
            silent_ms = now.saturating_sub(self.last_frame_ms),
            "no frames received; sensor unavailable"
        );

        for t in &mut self.targets {
            t.clear();
        }
        for z in &mut self.zones {
            z.reset();
        }
        for slot in 0..SLOT_COUNT {
            if self.targets[slot].is_published() {
                self.publish_target(slot, None);
            }
        }
        for z in &self.zones {
            if z.reports_occupancy() {
                log_publish_error(
                    self.publisher.publish_zone_occupancy(z.name(), false),
                    "zone occupancy",
                );
            }
            if z.reports_target_count() {
                log_publish_error(
                    self.publisher.publish_zone_target_count(z.name(), None),
                    "zone target count",
                );
            }
        }
        log_publish_error(self.publisher.publish_presence(false, None), "presence");
    }

    fn publish_target(&mut self, slot: usize, values: Option<TargetValues>) {
        log_publish_error(
            self.publisher
                .publish_target(slot, self.targets[slot].name(), values.as_ref()),
            "target",
        );
        self.published[slot] = values;
    }

    fn publish_tick(&mut self, zones: &[ZoneStatus]) {
        // Activity edges go out immediately; value changes wait for `poll`.
        for slot in 0..SLOT_COUNT {
            let values = self.targets[slot].values();
            if self.targets[slot].is_published()
                && values.is_some() != self.published[slot].is_some()
            {
                self.publish_target(slot, values);
            }
        }

        for (z, status) in self.zones.iter().zip(zones) {
            if z.reports_occupancy() {
                log_publish_error(
                    self.publisher.publish_zone_occupancy(z.name(), status.occupied),
                    "zone occupancy",
                );
            }
            if z.reports_target_count() {
                log_publish_error(
                    self.publisher
                        .publish_zone_target_count(z.name(), Some(status.target_count)),
                    "zone target count",
                );
            }
        }

        let (occupied, count) = (self.occupied(), self.target_count());
        log_publish_error(self.publisher.publish_presence(occupied, Some(count)), "presence");
    }
}
