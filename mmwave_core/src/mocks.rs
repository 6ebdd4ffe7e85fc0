//! Test and helper stand-ins for the seam traits.

use std::time::Duration;

use mmwave_traits::{BoxError, FrameSource, Publisher, RawFrame, TargetValues};

/// A source that never has a frame; useful when driving the tracker with
/// externally decoded frames via `tick`.
pub struct NoFrames;

impl FrameSource for NoFrames {
    fn read_frame(&mut self, _timeout: Duration) -> Result<Option<RawFrame>, BoxError> {
        Ok(None)
    }
}

/// A publisher that drops everything.
pub struct NullPublisher;

impl Publisher for NullPublisher {
    fn publish_target(
        &mut self,
        _slot: usize,
        _name: &str,
        _values: Option<&TargetValues>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn publish_zone_occupancy(&mut self, _zone: &str, _occupied: bool) -> Result<(), BoxError> {
        Ok(())
    }

    fn publish_zone_target_count(
        &mut self,
        _zone: &str,
        _count: Option<u8>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    fn publish_presence(
        &mut self,
        _occupied: bool,
        _target_count: Option<u8>,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}
