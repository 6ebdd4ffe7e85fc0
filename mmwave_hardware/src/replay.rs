use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use mmwave_traits::clock::Clock;
use mmwave_traits::{BoxError, FrameSource, RawFrame};

use crate::error::HwError;

/// Clock whose time is set from recorded timestamps.
///
/// now() = origin + offset. `sleep` advances the offset instead of blocking, so
/// a replay runs as fast as the CPU allows. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ReplayClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ReplayClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Jump to `ms` after the origin. Time never runs backwards.
    pub fn set_ms(&self, ms: u64) {
        if let Ok(mut off) = self.offset.lock() {
            *off = (*off).max(Duration::from_millis(ms));
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.offset
            .lock()
            .map(|g| g.as_millis() as u64)
            .unwrap_or(0)
    }
}

impl Clock for ReplayClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }
}

/// One scripted read result.
#[derive(Debug)]
enum Step {
    Frame(RawFrame),
    Gap,
    Fail(HwError),
}

/// Frame source that plays back a fixed script.
///
/// Once the script is exhausted every read reports "no frame", or
/// `HwError::Disconnected` when built with [`ScriptedSource::disconnect_when_done`].
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Step>,
    disconnect_when_done: bool,
    reads: usize,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: impl IntoIterator<Item = RawFrame>) -> Self {
        Self {
            script: frames.into_iter().map(Step::Frame).collect(),
            ..Self::default()
        }
    }

    pub fn push_frame(&mut self, frame: RawFrame) -> &mut Self {
        self.script.push_back(Step::Frame(frame));
        self
    }

    /// Queue a read that times out without a frame.
    pub fn push_gap(&mut self) -> &mut Self {
        self.script.push_back(Step::Gap);
        self
    }

    pub fn push_error(&mut self, err: HwError) -> &mut Self {
        self.script.push_back(Step::Fail(err));
        self
    }

    pub fn disconnect_when_done(mut self) -> Self {
        self.disconnect_when_done = true;
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl FrameSource for ScriptedSource {
    fn read_frame(&mut self, _timeout: Duration) -> Result<Option<RawFrame>, BoxError> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Step::Frame(frame)) => Ok(Some(frame)),
            Some(Step::Gap) => Ok(None),
            Some(Step::Fail(e)) => Err(Box::new(e)),
            None if self.disconnect_when_done => Err(Box::new(HwError::Disconnected)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmwave_traits::RawReading;

    #[test]
    fn replay_clock_is_monotonic() {
        let c = ReplayClock::new();
        let epoch = c.now();
        c.set_ms(500);
        c.set_ms(200);
        assert_eq!(c.ms_since(epoch), 500);
        c.sleep(Duration::from_millis(20));
        assert_eq!(c.elapsed_ms(), 520);
    }

    #[test]
    fn script_plays_in_order() {
        let mut s = ScriptedSource::new();
        s.push_frame(RawFrame::single(0, RawReading::present(0.0, 1.0, 0.0, 0.36)))
            .push_gap()
            .push_error(HwError::Timeout);
        let t = Duration::from_millis(10);
        assert!(s.read_frame(t).unwrap().is_some());
        assert!(s.read_frame(t).unwrap().is_none());
        assert!(s.read_frame(t).is_err());
        assert!(s.read_frame(t).unwrap().is_none());
        assert_eq!(s.reads(), 4);
    }
}
