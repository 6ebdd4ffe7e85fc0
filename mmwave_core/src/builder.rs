//! Type-state builder for `Tracker` and the generic `build_tracker` constructor.
//!
//! The builder enforces at compile time that a frame source and a publisher are
//! provided before `build()` is available. `try_build()` is always available for
//! dynamic checks.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use crossbeam_channel as xch;
use mmwave_traits::clock::{Clock, MonotonicClock};
use mmwave_traits::{FrameSource, LimitStore, NoStore, Publisher, RawFrame, SLOT_COUNT};

use crate::config::*;
use crate::core::TrackerCore;
use crate::error::{BuildError, Result};
use crate::geometry::Point;
use crate::limits::{LimitHandle, LimitKind, Limits};
use crate::status::TickReport;
use crate::target::{TargetPolicy, TargetState};
use crate::zone::{MAX_ZONES, Zone};

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

/// Tracker over boxed seams; see `TrackerCore` for the behavior.
pub struct Tracker {
    pub(crate) inner: TrackerCore<Box<dyn FrameSource>, Box<dyn Publisher>>,
}

impl core::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracker")
            .field("name", &self.inner.name)
            .field("available", &self.inner.available)
            .field("target_count", &self.inner.target_count())
            .finish()
    }
}

impl Tracker {
    /// Start building a Tracker.
    pub fn builder() -> TrackerBuilder<Missing, Missing> {
        TrackerBuilder::default()
    }

    /// Process one decoded frame (`None` = no frame).
    pub fn tick(&mut self, frame: Option<&RawFrame>) -> TickReport {
        self.inner.tick(frame)
    }

    /// Read from the frame source and tick.
    pub fn step(&mut self) -> TickReport {
        self.inner.step()
    }

    /// Timer cadence: polygon refresh, republish, watchdog.
    pub fn poll(&mut self) {
        self.inner.poll();
    }

    pub fn report(&self) -> TickReport {
        self.inner.report(false)
    }

    pub fn set_limit(&mut self, kind: LimitKind, value: f32) -> Result<f32> {
        self.inner.set_limit(kind, value)
    }

    pub fn limit_handle(&self) -> LimitHandle {
        self.inner.limit_handle()
    }

    pub fn update_zone_polygon(&mut self, zone: &str, points: Vec<Point>) -> Result<()> {
        self.inner.update_zone_polygon(zone, points)
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn targets(&self) -> &[TargetState; SLOT_COUNT] {
        self.inner.targets()
    }

    pub fn target(&self, slot: usize) -> Option<&TargetState> {
        self.inner.target(slot)
    }

    pub fn zones(&self) -> &[Zone] {
        self.inner.zones()
    }

    pub fn zone(&self, name: &str) -> Option<&Zone> {
        self.inner.zone(name)
    }

    pub fn limits(&self) -> &Limits {
        self.inner.limits()
    }

    pub fn timing(&self) -> &Timing {
        self.inner.timing()
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    pub fn occupied(&self) -> bool {
        self.inner.occupied()
    }

    pub fn target_count(&self) -> u8 {
        self.inner.target_count()
    }

    pub fn dump_config(&self) {
        self.inner.dump_config();
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `Tracker`. Everything is validated on `build()`.
pub struct TrackerBuilder<S, P> {
    source: Option<Box<dyn FrameSource>>,
    publisher: Option<Box<dyn Publisher>>,
    cfg: TrackerCfg,
    store: Option<Box<dyn LimitStore>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
    _s: PhantomData<S>,
    _p: PhantomData<P>,
}

impl Default for TrackerBuilder<Missing, Missing> {
    fn default() -> Self {
        Self {
            source: None,
            publisher: None,
            cfg: TrackerCfg::default(),
            store: None,
            clock: None,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn build_zone(cfg: ZoneCfg, now_ms: u64) -> Result<Zone> {
    if cfg.name.trim().is_empty() {
        return Err(invalid("zone name must not be empty"));
    }
    if !(cfg.margin.is_finite() && cfg.margin >= 0.0) {
        return Err(invalid("zone margin must be >= 0"));
    }
    let zone = match cfg.polygon {
        PolygonCfg::Static(points) => {
            Zone::new_static(cfg.name.clone(), points, cfg.margin, cfg.target_timeout_ms).map_err(
                |reason| {
                    eyre::Report::new(BuildError::InvalidPolygon {
                        zone: cfg.name.clone(),
                        reason,
                    })
                },
            )?
        }
        PolygonCfg::Template {
            template,
            interval_ms,
        } => Zone::new_template(
            cfg.name.clone(),
            template,
            interval_ms,
            cfg.margin,
            cfg.target_timeout_ms,
            now_ms,
        ),
    };
    Ok(zone.with_reporting(cfg.report_occupancy, cfg.report_target_count))
}

/// Validate configuration and construct a `TrackerCore`.
///
/// The single source of truth for validation, used by both
/// `TrackerBuilder::try_build()` and `build_tracker()`.
fn validate_and_build<S: FrameSource, P: Publisher>(
    source: S,
    publisher: P,
    cfg: TrackerCfg,
    store: Box<dyn LimitStore>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<TrackerCore<S, P>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if cfg.targets.len() > SLOT_COUNT {
        return Err(eyre::Report::new(BuildError::TooManyTargets(
            cfg.targets.len(),
        )));
    }
    if cfg.zones.len() > MAX_ZONES {
        return Err(eyre::Report::new(BuildError::TooManyZones(cfg.zones.len())));
    }
    let mut seen = HashSet::new();
    for z in &cfg.zones {
        if !seen.insert(z.name.as_str()) {
            return Err(eyre::Report::new(BuildError::DuplicateZone(z.name.clone())));
        }
    }
    if cfg.tracking.fast_off_detection && cfg.tracking.fast_off_window == 0 {
        return Err(invalid("fast_off_window must be >= 1"));
    }
    if cfg.timing.frame_timeout_ms == 0 {
        return Err(invalid("frame_timeout_ms must be >= 1"));
    }
    if cfg.timing.publish_interval_ms == 0 {
        return Err(invalid("publish_interval_ms must be >= 1"));
    }

    let l = &cfg.limits;
    let mut limits = Limits::new(
        l.max_distance,
        l.min_tilt_angle,
        l.max_tilt_angle,
        l.max_distance_margin,
        l.tilt_angle_margin,
    )
    .map_err(eyre::Report::new)?;
    limits.restore_from(&*store);

    // ── Construct ────────────────────────────────────────────────────────────
    let clock: Arc<dyn Clock + Send + Sync> = match clock {
        Some(b) => Arc::from(b),
        None => Arc::new(MonotonicClock::new()),
    };
    let epoch = clock.now();
    let now = clock.ms_since(epoch);

    let zones = cfg
        .zones
        .into_iter()
        .map(|z| build_zone(z, now))
        .collect::<Result<Vec<_>>>()?;

    let targets: [TargetState; SLOT_COUNT] = std::array::from_fn(|slot| {
        let fallback = format!("Target {}", slot + 1);
        match cfg.targets.get(slot) {
            Some(t) => TargetState::new(t.name.clone().unwrap_or(fallback), t.debug, true),
            None => TargetState::new(fallback, false, false),
        }
    });

    let policy = TargetPolicy {
        flip_x_axis: cfg.tracking.flip_x_axis,
        fast_off_window: cfg
            .tracking
            .fast_off_detection
            .then_some(cfg.tracking.fast_off_window),
    };

    let (adjust_tx, adjust_rx) = xch::unbounded();

    Ok(TrackerCore {
        source,
        publisher,
        store,
        name: cfg.name,
        policy,
        limits,
        targets,
        zones,
        timing: cfg.timing,
        clock,
        epoch,
        adjust_tx,
        adjust_rx,
        available: false,
        watchdog_fired: false,
        last_frame_ms: now,
        last_publish_ms: now,
        published: [None; SLOT_COUNT],
    })
}

impl<S, P> TrackerBuilder<S, P> {
    /// Fallible build available in any type-state; reports missing pieces.
    pub fn try_build(self) -> Result<Tracker> {
        let source = self
            .source
            .ok_or_else(|| eyre::Report::new(BuildError::MissingSource))?;
        let publisher = self
            .publisher
            .ok_or_else(|| eyre::Report::new(BuildError::MissingPublisher))?;

        let inner = validate_and_build(
            source,
            publisher,
            self.cfg,
            self.store.unwrap_or_else(|| Box::new(NoStore)),
            self.clock,
        )?;
        Ok(Tracker { inner })
    }
}

/// Chainable setters that do not affect type-state.
impl<S, P> TrackerBuilder<S, P> {
    /// Replace the whole configuration.
    pub fn with_config(mut self, cfg: TrackerCfg) -> Self {
        self.cfg = cfg;
        self
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.cfg.name = name.into();
        self
    }
    pub fn with_tracking(mut self, tracking: TrackingCfg) -> Self {
        self.cfg.tracking = tracking;
        self
    }
    pub fn with_limits(mut self, limits: LimitsCfg) -> Self {
        self.cfg.limits = limits;
        self
    }
    pub fn with_target(mut self, target: TargetCfg) -> Self {
        self.cfg.targets.push(target);
        self
    }
    pub fn with_zone(mut self, zone: ZoneCfg) -> Self {
        self.cfg.zones.push(zone);
        self
    }
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.cfg.timing = timing;
        self
    }
    /// Storage for restorable limits; defaults to `NoStore`.
    pub fn with_store(mut self, store: impl LimitStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }
    /// Provide a custom clock implementation; defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

// Setters that advance type-state
impl<P> TrackerBuilder<Missing, P> {
    pub fn with_source(self, source: impl FrameSource + 'static) -> TrackerBuilder<Set, P> {
        TrackerBuilder {
            source: Some(Box::new(source)),
            publisher: self.publisher,
            cfg: self.cfg,
            store: self.store,
            clock: self.clock,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

impl<S> TrackerBuilder<S, Missing> {
    pub fn with_publisher(self, publisher: impl Publisher + 'static) -> TrackerBuilder<S, Set> {
        TrackerBuilder {
            source: self.source,
            publisher: Some(Box::new(publisher)),
            cfg: self.cfg,
            store: self.store,
            clock: self.clock,
            _s: PhantomData,
            _p: PhantomData,
        }
    }
}

impl TrackerBuilder<Set, Set> {
    /// Validate and build. Only available once source and publisher are set.
    pub fn build(self) -> Result<Tracker> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type TrackerG<S, P> = TrackerCore<S, P>;

/// Build a generic, statically-dispatched `TrackerG` from concrete seams.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_tracker<S, P>(
    source: S,
    publisher: P,
    cfg: TrackerCfg,
    store: Option<Box<dyn LimitStore>>,
    clock: Option<Box<dyn Clock + Send + Sync>>,
) -> Result<TrackerG<S, P>>
where
    S: FrameSource + 'static,
    P: Publisher + 'static,
{
    validate_and_build(
        source,
        publisher,
        cfg,
        store.unwrap_or_else(|| Box::new(NoStore)),
        clock,
    )
}
