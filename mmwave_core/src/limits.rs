//! Detection limits: max distance and the tilt-angle window.
//!
//! Each limit is either fixed at configuration time or adjustable at runtime
//! through a clamp-then-store `set`. Adjustable limits may restore their last
//! value from a [`LimitStore`] at startup and persist every accepted change.

use crossbeam_channel as xch;
use mmwave_traits::LimitStore;

use crate::error::{BuildError, TrackerError};

/// Physical range of the distance limit (m).
pub const DISTANCE_BOUNDS: (f32, f32) = (0.0, 6.0);
/// Physical range of the tilt-angle limits (degrees).
pub const ANGLE_BOUNDS: (f32, f32) = (-90.0, 90.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitKind {
    MaxDistance,
    MinTiltAngle,
    MaxTiltAngle,
}

impl LimitKind {
    pub const ALL: [LimitKind; 3] = [
        LimitKind::MaxDistance,
        LimitKind::MinTiltAngle,
        LimitKind::MaxTiltAngle,
    ];

    /// Key under which the value is persisted.
    pub fn key(self) -> &'static str {
        match self {
            LimitKind::MaxDistance => "max_distance",
            LimitKind::MinTiltAngle => "min_tilt_angle",
            LimitKind::MaxTiltAngle => "max_tilt_angle",
        }
    }

    pub fn bounds(self) -> (f32, f32) {
        match self {
            LimitKind::MaxDistance => DISTANCE_BOUNDS,
            LimitKind::MinTiltAngle | LimitKind::MaxTiltAngle => ANGLE_BOUNDS,
        }
    }
}

impl std::str::FromStr for LimitKind {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LimitKind::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| TrackerError::Config(format!("unknown limit '{s}'")))
    }
}

/// How a limit is configured.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitMode {
    /// Compile-time constant; `set` is refused.
    Fixed(f32),
    /// Live adjustable number.
    Adjustable { initial: f32, step: f32, restore: bool },
}

impl LimitMode {
    pub fn initial(&self) -> f32 {
        match *self {
            LimitMode::Fixed(v) => v,
            LimitMode::Adjustable { initial, .. } => initial,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    kind: LimitKind,
    value: f32,
    min_bound: f32,
    max_bound: f32,
    step: Option<f32>,
    restore: bool,
}

impl Limit {
    pub fn new(kind: LimitKind, mode: LimitMode) -> Self {
        let (min_bound, max_bound) = kind.bounds();
        let (step, restore) = match mode {
            LimitMode::Fixed(_) => (None, false),
            LimitMode::Adjustable { step, restore, .. } => (Some(step), restore),
        };
        Self {
            kind,
            value: mode.initial().clamp(min_bound, max_bound),
            min_bound,
            max_bound,
            step,
            restore,
        }
    }

    pub fn kind(&self) -> LimitKind {
        self.kind
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn min_bound(&self) -> f32 {
        self.min_bound
    }

    pub fn max_bound(&self) -> f32 {
        self.max_bound
    }

    /// Step size for presentation; `None` for fixed limits.
    pub fn step(&self) -> Option<f32> {
        self.step
    }

    pub fn is_adjustable(&self) -> bool {
        self.step.is_some()
    }

    pub fn restores(&self) -> bool {
        self.restore
    }

    /// Clamp `v` into `[lo, hi] ∩ [min_bound, max_bound]` and store it.
    fn store_clamped(&mut self, v: f32, lo: f32, hi: f32) -> f32 {
        let lo = lo.max(self.min_bound);
        let hi = hi.min(self.max_bound);
        self.value = v.clamp(lo, hi.max(lo));
        self.value
    }

    /// Clamp-then-store within the physical bounds. Returns the applied value.
    pub fn set_value(&mut self, v: f32) -> Result<f32, TrackerError> {
        self.set_value_within(v, self.min_bound, self.max_bound)
    }

    fn set_value_within(&mut self, v: f32, lo: f32, hi: f32) -> Result<f32, TrackerError> {
        if !self.is_adjustable() {
            return Err(TrackerError::State(format!(
                "{} is fixed and cannot be adjusted",
                self.kind.key()
            )));
        }
        if !v.is_finite() {
            return Err(TrackerError::State(format!(
                "{} must be a finite number",
                self.kind.key()
            )));
        }
        Ok(self.store_clamped(v, lo, hi))
    }
}

/// A queued live adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitAdjust {
    pub kind: LimitKind,
    pub value: f32,
}

/// Cloneable sender for live limit adjustments.
///
/// Adjustments are applied by the tracker at the start of its next tick.
#[derive(Debug, Clone)]
pub struct LimitHandle {
    tx: xch::Sender<LimitAdjust>,
}

impl LimitHandle {
    pub(crate) fn new(tx: xch::Sender<LimitAdjust>) -> Self {
        Self { tx }
    }

    pub fn set(&self, kind: LimitKind, value: f32) -> Result<(), TrackerError> {
        self.tx
            .send(LimitAdjust { kind, value })
            .map_err(|_| TrackerError::State("tracker is gone".into()))
    }
}

/// The three detection limits plus the hysteresis margins for active targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    max_distance: Limit,
    min_tilt: Limit,
    max_tilt: Limit,
    distance_margin: f32,
    tilt_margin: f32,
}

impl Limits {
    pub fn new(
        max_distance: LimitMode,
        min_tilt: LimitMode,
        max_tilt: LimitMode,
        distance_margin: f32,
        tilt_margin: f32,
    ) -> Result<Self, BuildError> {
        if !(distance_margin.is_finite() && distance_margin >= 0.0) {
            return Err(BuildError::InvalidConfig("max_distance_margin must be >= 0"));
        }
        if !(tilt_margin.is_finite() && tilt_margin >= 0.0) {
            return Err(BuildError::InvalidConfig("tilt_angle_margin must be >= 0"));
        }
        for mode in [max_distance, min_tilt, max_tilt] {
            if !mode.initial().is_finite() {
                return Err(BuildError::InvalidConfig("limit values must be finite"));
            }
            if let LimitMode::Adjustable { step, .. } = mode
                && !(step.is_finite() && step > 0.0)
            {
                return Err(BuildError::InvalidConfig("limit step must be > 0"));
            }
        }
        let limits = Self {
            max_distance: Limit::new(LimitKind::MaxDistance, max_distance),
            min_tilt: Limit::new(LimitKind::MinTiltAngle, min_tilt),
            max_tilt: Limit::new(LimitKind::MaxTiltAngle, max_tilt),
            distance_margin,
            tilt_margin,
        };
        if limits.min_tilt.value >= limits.max_tilt.value {
            return Err(BuildError::TiltOrder {
                min: limits.min_tilt.value,
                max: limits.max_tilt.value,
            });
        }
        Ok(limits)
    }

    pub fn get(&self, kind: LimitKind) -> &Limit {
        match kind {
            LimitKind::MaxDistance => &self.max_distance,
            LimitKind::MinTiltAngle => &self.min_tilt,
            LimitKind::MaxTiltAngle => &self.max_tilt,
        }
    }

    pub fn max_distance(&self) -> f32 {
        self.max_distance.value
    }

    pub fn min_tilt_angle(&self) -> f32 {
        self.min_tilt.value
    }

    pub fn max_tilt_angle(&self) -> f32 {
        self.max_tilt.value
    }

    pub fn distance_margin(&self) -> f32 {
        self.distance_margin
    }

    pub fn tilt_margin(&self) -> f32 {
        self.tilt_margin
    }

    /// Live adjustment. The tilt pair cannot be inverted: min is clamped to
    /// `[-90, max_tilt]`, max to `[min_tilt, 90]`. Returns the applied value.
    pub fn set(&mut self, kind: LimitKind, value: f32) -> Result<f32, TrackerError> {
        match kind {
            LimitKind::MaxDistance => self.max_distance.set_value(value),
            LimitKind::MinTiltAngle => {
                let hi = self.max_tilt.value;
                self.min_tilt.set_value_within(value, ANGLE_BOUNDS.0, hi)
            }
            LimitKind::MaxTiltAngle => {
                let lo = self.min_tilt.value;
                self.max_tilt.set_value_within(value, lo, ANGLE_BOUNDS.1)
            }
        }
    }

    /// Load persisted values for restorable limits. Values that would invert the
    /// tilt pair are dropped in favor of the configured ones.
    pub fn restore_from(&mut self, store: &dyn LimitStore) {
        let configured = self.clone();
        for kind in LimitKind::ALL {
            let limit = match kind {
                LimitKind::MaxDistance => &mut self.max_distance,
                LimitKind::MinTiltAngle => &mut self.min_tilt,
                LimitKind::MaxTiltAngle => &mut self.max_tilt,
            };
            if !limit.restore {
                continue;
            }
            match store.load(kind.key()) {
                Some(v) if v.is_finite() => {
                    let (lo, hi) = (limit.min_bound, limit.max_bound);
                    let applied = limit.store_clamped(v, lo, hi);
                    tracing::debug!(limit = kind.key(), value = applied, "restored limit");
                }
                Some(v) => {
                    tracing::warn!(limit = kind.key(), value = v, "ignoring non-finite stored limit");
                }
                None => {}
            }
        }
        if self.min_tilt.value >= self.max_tilt.value {
            tracing::warn!(
                min = self.min_tilt.value,
                max = self.max_tilt.value,
                "restored tilt limits are inverted; using configured values"
            );
            self.min_tilt = configured.min_tilt;
            self.max_tilt = configured.max_tilt;
        }
    }

    /// Whether a calibrated reading counts as a valid detection.
    ///
    /// Targets that are already active are held within the margins beyond the
    /// strict limits.
    pub fn accepts(&self, distance: f32, angle: f32, was_active: bool) -> bool {
        let (dm, tm) = if was_active {
            (self.distance_margin, self.tilt_margin)
        } else {
            (0.0, 0.0)
        };
        distance <= self.max_distance.value + dm
            && angle <= self.max_tilt.value + tm
            && angle >= self.min_tilt.value - tm
    }
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_distance: Limit::new(
                LimitKind::MaxDistance,
                LimitMode::Fixed(DISTANCE_BOUNDS.1),
            ),
            min_tilt: Limit::new(LimitKind::MinTiltAngle, LimitMode::Fixed(ANGLE_BOUNDS.0)),
            max_tilt: Limit::new(LimitKind::MaxTiltAngle, LimitMode::Fixed(ANGLE_BOUNDS.1)),
            distance_margin: 0.0,
            tilt_margin: 0.0,
        }
    }
}
