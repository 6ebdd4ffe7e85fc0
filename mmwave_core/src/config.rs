//! Runtime configuration for the tracker.
//!
//! These are the structs `TrackerCore` is built from. They are separate from the
//! TOML-deserialized schema in `mmwave_config`; see `conversions` for the bridge.

use crate::geometry::Point;
use crate::limits::LimitMode;
use crate::zone::PolygonTemplate;

/// Axis and debounce settings shared by all slots.
#[derive(Debug, Clone)]
pub struct TrackingCfg {
    /// Negate `x` on every reading.
    pub flip_x_axis: bool,
    /// Delay "target lost" until `fast_off_window` consecutive empty frames.
    pub fast_off_detection: bool,
    /// Empty frames tolerated before a slot goes inactive. Default: 2.
    pub fast_off_window: u8,
}

impl Default for TrackingCfg {
    fn default() -> Self {
        Self {
            flip_x_axis: false,
            fast_off_detection: false,
            fast_off_window: 2,
        }
    }
}

/// Detection limits and their edge hysteresis.
#[derive(Debug, Clone)]
pub struct LimitsCfg {
    pub max_distance: LimitMode,
    pub min_tilt_angle: LimitMode,
    pub max_tilt_angle: LimitMode,
    /// Extra range (m) an already active target may use beyond `max_distance`.
    pub max_distance_margin: f32,
    /// Extra angle (deg) an already active target may use beyond the tilt pair.
    pub tilt_angle_margin: f32,
}

impl Default for LimitsCfg {
    fn default() -> Self {
        Self {
            max_distance: LimitMode::Adjustable {
                initial: 6.0,
                step: 0.1,
                restore: true,
            },
            min_tilt_angle: LimitMode::Adjustable {
                initial: -90.0,
                step: 1.0,
                restore: true,
            },
            max_tilt_angle: LimitMode::Adjustable {
                initial: 90.0,
                step: 1.0,
                restore: true,
            },
            max_distance_margin: 0.25,
            tilt_angle_margin: 0.0,
        }
    }
}

/// A configured (published) slot. Unconfigured slots are tracked but not reported.
#[derive(Debug, Clone, Default)]
pub struct TargetCfg {
    pub name: Option<String>,
    pub debug: bool,
}

/// Where a zone's polygon comes from.
#[derive(Clone)]
pub enum PolygonCfg {
    Static(Vec<Point>),
    Template {
        template: PolygonTemplate,
        /// 0 evaluates the template once, at build.
        interval_ms: u64,
    },
}

impl core::fmt::Debug for PolygonCfg {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PolygonCfg::Static(points) => f.debug_tuple("Static").field(points).finish(),
            PolygonCfg::Template { interval_ms, .. } => f
                .debug_struct("Template")
                .field("interval_ms", interval_ms)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ZoneCfg {
    pub name: String,
    /// Outward growth of the polygon in meters. Default: 0.25.
    pub margin: f32,
    /// Grace period after a target leaves. Default: 5000 ms.
    pub target_timeout_ms: u64,
    pub polygon: PolygonCfg,
    pub report_occupancy: bool,
    pub report_target_count: bool,
}

impl ZoneCfg {
    pub fn new(name: impl Into<String>, polygon: Vec<Point>) -> Self {
        Self {
            name: name.into(),
            margin: 0.25,
            target_timeout_ms: 5000,
            polygon: PolygonCfg::Static(polygon),
            report_occupancy: true,
            report_target_count: true,
        }
    }

    /// Dynamic zone refreshed every `interval_ms` (1000 if you have no better idea).
    pub fn with_template(
        name: impl Into<String>,
        template: PolygonTemplate,
        interval_ms: u64,
    ) -> Self {
        Self {
            polygon: PolygonCfg::Template {
                template,
                interval_ms,
            },
            ..Self::new(name, Vec::new())
        }
    }
}

/// Timers and watchdogs.
#[derive(Debug, Clone)]
pub struct Timing {
    /// No frame for this long marks the sensor unavailable. 0 disables the watchdog.
    pub unavailable_timeout_ms: u64,
    /// Cadence of `poll` republishing of changed target values.
    pub publish_interval_ms: u64,
    /// Max wait per `FrameSource::read_frame`.
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

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct TrackerCfg {
    pub name: String,
    pub tracking: TrackingCfg,
    pub limits: LimitsCfg,
    /// 0..=3 published slots; an empty list publishes nothing per target.
    pub targets: Vec<TargetCfg>,
    pub zones: Vec<ZoneCfg>,
    pub timing: Timing,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            name: "LD2450".to_string(),
            tracking: TrackingCfg::default(),
            limits: LimitsCfg::default(),
            targets: Vec::new(),
            zones: Vec::new(),
            timing: Timing::default(),
        }
    }
}
