#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Target tracking and zone occupancy (hardware-agnostic).
//!
//! Frames come in through `mmwave_traits::FrameSource` (or straight into
//! [`Tracker::tick`]); results go out through `mmwave_traits::Publisher`.
//!
//! ## Architecture
//!
//! - **Geometry**: points, convexity, margin-grown containment (`geometry`)
//! - **Limits**: max distance and tilt window, live adjustable (`limits`)
//! - **Targets**: per-slot calibration and fast-off debounce (`target`)
//! - **Zones**: polygon containment with a per-slot grace state machine (`zone`)
//! - **Controller**: tick, timer cadence, availability watchdog (`TrackerCore`)
//! - **Configuration**: runtime structs (`config`) and the TOML bridge (`conversions`)
//!
//! Each tick runs frame → targets → zones → publish, in that order.

pub mod builder;
pub mod config;
pub mod conversions;
pub mod core;
pub mod error;
pub mod geometry;
pub mod hw_error;
pub mod limits;
pub mod mocks;
pub mod status;
pub mod target;
pub mod zone;

pub use crate::builder::{Missing, Set, Tracker, TrackerBuilder, TrackerG, build_tracker};
pub use crate::config::{
    LimitsCfg, PolygonCfg, TargetCfg, Timing, TrackerCfg, TrackingCfg, ZoneCfg,
};
pub use crate::core::TrackerCore;
pub use crate::error::{BuildError, Report, Result, TrackerError};
pub use crate::geometry::{BOUNDARY_EPSILON_M, COLLINEAR_TOLERANCE, Point, PolygonError, is_convex, point_in_polygon};
pub use crate::limits::{LimitHandle, LimitKind, LimitMode, Limits};
pub use crate::status::{TickReport, ZoneStatus};
pub use crate::target::{TargetPolicy, TargetState};
pub use crate::zone::{MAX_ZONES, PolygonTemplate, SlotOccupancy, Zone};
