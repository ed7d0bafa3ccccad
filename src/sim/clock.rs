//! Fixed-step accumulator
//!
//! Banks real elapsed time and spends it in constant `dt` increments. Time
//! beyond the per-frame step cap is dropped, so the simulation falls behind
//! under overload instead of spiraling.

/// Per-burst wall clock bookkeeping
#[derive(Debug, Clone, Default)]
pub struct SimulationClock {
    last_timestamp: Option<f64>,
    accumulator: f64,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Record a frame timestamp (ms) and return how many fixed steps to run
    ///
    /// The first frame counts as exactly one `dt`. Deltas are clamped to
    /// `[0, max_delta]` seconds; non-finite timestamps add no time.
    pub fn advance(&mut self, timestamp_ms: f64, dt: f64, max_delta: f64, max_steps: u32) -> u32 {
        let delta = match self.last_timestamp {
            None => dt,
            Some(last) => {
                let elapsed = (timestamp_ms - last) / 1000.0;
                if elapsed.is_finite() {
                    elapsed.clamp(0.0, max_delta)
                } else {
                    0.0
                }
            }
        };
        if timestamp_ms.is_finite() {
            self.last_timestamp = Some(timestamp_ms);
        }
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= dt && steps < max_steps {
            self.accumulator -= dt;
            steps += 1;
        }
        if self.accumulator >= dt {
            log::debug!(
                "Step cap reached, dropping {:.1} ms of simulation time",
                self.accumulator * 1000.0
            );
            self.accumulator = 0.0;
        }
        steps
    }
}
