use std::time::Duration;

use mmwave_traits::{BoxError, FrameSource, RawFrame, RawReading, SLOT_COUNT};

/// Radar-reported distance resolution for simulated detections (m).
const SIM_RESOLUTION_M: f32 = 0.36;

/// Simulated radar with up to three people pacing through the room.
///
/// Person `k` walks a horizontal line at `y = 1.0 + k` meters, sweeping
/// `x` between -1.5 and 1.5 m. Positions get a little deterministic jitter and
/// each slot can drop out with probability `dropout`, which exercises the
/// fast-off path. Every `read_frame` advances simulated time by `period`.
#[derive(Debug, Clone)]
pub struct SimulatedRadar {
    people: usize,
    period: Duration,
    dropout: f32,
    jitter_m: f32,
    t_ms: u64,
    rng: u64,
}

impl SimulatedRadar {
    pub fn new(seed: u64) -> Self {
        Self {
            people: 1,
            period: Duration::from_millis(100),
            dropout: 0.0,
            jitter_m: 0.01,
            t_ms: 0,
            // xorshift must not start at zero
            rng: seed.max(1),
        }
    }

    pub fn with_people(mut self, people: usize) -> Self {
        self.people = people.min(SLOT_COUNT);
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Probability in `[0, 1]` that a slot reports empty in a given frame.
    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout.clamp(0.0, 1.0);
        self
    }

    pub fn with_jitter(mut self, jitter_m: f32) -> Self {
        self.jitter_m = jitter_m.max(0.0);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Simulated time of the last produced frame.
    pub fn elapsed_ms(&self) -> u64 {
        self.t_ms
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        x
    }

    /// Uniform in `[0, 1)`.
    fn next_unit(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    fn person(&mut self, k: usize) -> RawReading {
        // Each person has its own pace so the tracks do not move in lockstep.
        let pace_ms = 8000.0 + 2500.0 * k as f32;
        let phase = (self.t_ms as f32 / pace_ms) * std::f32::consts::TAU;
        let x = 1.5 * phase.sin();
        let y = 1.0 + k as f32;
        let speed = 1.5 * phase.cos() * std::f32::consts::TAU / (pace_ms / 1000.0);
        let jx = (self.next_unit() - 0.5) * 2.0 * self.jitter_m;
        let jy = (self.next_unit() - 0.5) * 2.0 * self.jitter_m;
        RawReading::present(x + jx, y + jy, speed, SIM_RESOLUTION_M)
    }
}

impl FrameSource for SimulatedRadar {
    fn read_frame(&mut self, _timeout: Duration) -> Result<Option<RawFrame>, BoxError> {
        self.t_ms = self
            .t_ms
            .saturating_add(self.period.as_millis() as u64);
        let mut frame = RawFrame::empty();
        for k in 0..self.people {
            let reading = self.person(k);
            let dropped = self.dropout > 0.0 && self.next_unit() < self.dropout;
            if !dropped {
                frame.readings[k] = reading;
            }
        }
        tracing::trace!(t_ms = self.t_ms, people = self.people, "simulated frame");
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_frames() {
        let mut a = SimulatedRadar::new(7).with_people(2).with_dropout(0.3);
        let mut b = SimulatedRadar::new(7).with_people(2).with_dropout(0.3);
        for _ in 0..50 {
            let t = Duration::from_millis(100);
            assert_eq!(a.read_frame(t).unwrap(), b.read_frame(t).unwrap());
        }
        assert_eq!(a.elapsed_ms(), 5000);
    }

    #[test]
    fn people_stay_in_their_lanes() {
        let mut r = SimulatedRadar::new(1).with_people(3);
        for _ in 0..100 {
            let f = r.read_frame(Duration::from_millis(100)).unwrap().unwrap();
            for (k, reading) in f.readings.iter().enumerate() {
                assert!(reading.present);
                assert!(reading.x.abs() <= 1.52);
                assert!((reading.y - (1.0 + k as f32)).abs() <= 0.011);
            }
        }
    }
}
