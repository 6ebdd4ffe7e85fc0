use thiserror::Error;

use crate::geometry::PolygonError;

#[derive(Debug, Error, Clone)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("frame source error: {0}")]
    Source(String),
    #[error("timeout waiting for frame")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("persist error: {0}")]
    Persist(String),
    #[error("publish error: {0}")]
    Publish(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("missing frame source")]
    MissingSource,
    #[error("missing publisher")]
    MissingPublisher,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("zone '{zone}': {reason}")]
    InvalidPolygon { zone: String, reason: PolygonError },
    #[error("duplicate zone name '{0}'")]
    DuplicateZone(String),
    #[error("too many zones: {0} (max {max})", max = crate::zone::MAX_ZONES)]
    TooManyZones(usize),
    #[error("too many targets: {0} (max {max})", max = mmwave_traits::SLOT_COUNT)]
    TooManyTargets(usize),
    #[error("min_tilt_angle ({min}) must be < max_tilt_angle ({max})")]
    TiltOrder { min: f32, max: f32 },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
