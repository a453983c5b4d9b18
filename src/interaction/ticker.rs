//! Fixed-rate ticks driven by variable frame times.

/// Longest frame accepted in one advance, in seconds.
const MAX_FRAME_TIME: f32 = 0.25;

/// Accumulates elapsed time and hands it out in whole steps.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedStep {
    step: f32,
    accumulator: f32,
}

impl FixedStep {
    pub fn new(hz: f32) -> Self {
        Self {
            step: 1.0 / hz.max(f32::EPSILON),
            accumulator: 0.0,
        }
    }

    /// Seconds per step.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Adds `dt` seconds and returns how many steps are due.
    ///
    /// Long frames are clamped so a stall does not replay seconds of ticks.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }
        self.accumulator += dt.min(MAX_FRAME_TIME);
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
