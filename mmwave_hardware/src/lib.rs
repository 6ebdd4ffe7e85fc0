//! Frame sources and limit stores for running the tracker without a UART.
//!
//! - [`SimulatedRadar`]: deterministic people walking through the field of view.
//! - [`ScriptedSource`]: replays a queue of frames, gaps and errors (tests, CSV replay).
//! - [`ReplayClock`]: a clock driven by recorded timestamps.
//! - [`MemoryStore`] / [`FileLimitStore`]: persistence for restorable limits.

pub mod error;
pub mod replay;
pub mod sim;
pub mod store;

pub use replay::{ReplayClock, ScriptedSource};
pub use sim::SimulatedRadar;
pub use store::{FileLimitStore, MemoryStore};
