//! `From` implementations bridging `mmwave_config` types to `mmwave_core` types.

use crate::config::{LimitsCfg, PolygonCfg, TargetCfg, Timing, TrackerCfg, TrackingCfg, ZoneCfg};
use crate::geometry::Point;
use crate::limits::LimitMode;

// ── LimitMode ────────────────────────────────────────────────────────────────

/// Resolve a TOML limit against its per-limit defaults.
fn limit_mode(
    src: Option<mmwave_config::LimitToml>,
    default_initial: f32,
    default_step: f32,
) -> LimitMode {
    match src {
        Some(mmwave_config::LimitToml::Fixed(v)) => LimitMode::Fixed(v),
        Some(mmwave_config::LimitToml::Adjustable(a)) => LimitMode::Adjustable {
            initial: a.initial.unwrap_or(default_initial),
            step: a.step.unwrap_or(default_step),
            restore: a.restore.unwrap_or(true),
        },
        None => LimitMode::Adjustable {
            initial: default_initial,
            step: default_step,
            restore: true,
        },
    }
}

// ── LimitsCfg / TrackingCfg ─────────────────────────────────────────────────

impl From<&mmwave_config::Config> for LimitsCfg {
    fn from(c: &mmwave_config::Config) -> Self {
        Self {
            max_distance: limit_mode(c.max_distance, 6.0, 0.1),
            min_tilt_angle: limit_mode(c.min_tilt_angle, -90.0, 1.0),
            max_tilt_angle: limit_mode(c.max_tilt_angle, 90.0, 1.0),
            max_distance_margin: c.max_distance_margin,
            tilt_angle_margin: c.tilt_angle_margin,
        }
    }
}

impl From<&mmwave_config::Config> for TrackingCfg {
    fn from(c: &mmwave_config::Config) -> Self {
        Self {
            flip_x_axis: c.flip_x_axis,
            fast_off_detection: c.fast_off_detection,
            fast_off_window: c.fast_off_window,
        }
    }
}

// ── TargetCfg ────────────────────────────────────────────────────────────────

impl From<&mmwave_config::TargetToml> for TargetCfg {
    fn from(t: &mmwave_config::TargetToml) -> Self {
        Self {
            name: t.name.clone(),
            debug: t.debug,
        }
    }
}

// ── ZoneCfg ──────────────────────────────────────────────────────────────────

impl From<&mmwave_config::ZoneToml> for ZoneCfg {
    fn from(z: &mmwave_config::ZoneToml) -> Self {
        Self {
            name: z.name.clone(),
            margin: z.margin,
            target_timeout_ms: z.target_timeout_ms,
            polygon: PolygonCfg::Static(z.polygon.iter().map(|&[x, y]| Point::new(x, y)).collect()),
            report_occupancy: z.report_occupancy,
            report_target_count: z.report_target_count,
        }
    }
}

// ── Timing ───────────────────────────────────────────────────────────────────

impl From<&mmwave_config::Timing> for Timing {
    fn from(t: &mmwave_config::Timing) -> Self {
        Self {
            unavailable_timeout_ms: t.unavailable_timeout_ms,
            publish_interval_ms: t.publish_interval_ms,
            frame_timeout_ms: t.frame_timeout_ms,
        }
    }
}

// ── TrackerCfg ───────────────────────────────────────────────────────────────

impl From<&mmwave_config::Config> for TrackerCfg {
    fn from(c: &mmwave_config::Config) -> Self {
        Self {
            name: c.name.clone(),
            tracking: c.into(),
            limits: c.into(),
            // No [[targets]] means every slot is published under its default name.
            targets: match &c.targets {
                Some(ts) => ts.iter().map(TargetCfg::from).collect(),
                None => vec![TargetCfg::default(); mmwave_traits::SLOT_COUNT],
            },
            zones: c.zones.iter().map(ZoneCfg::from).collect(),
            timing: (&c.timing).into(),
        }
    }
}
