//! Frame timing
//!
//! The [`FrameClock`] is the sole scheduling primitive of the engine: dirty
//! nodes are rebuilt when the owning scene advances its clock by one tick.
//! The clock itself is passive. Something external (a real-time [`Timer`], a
//! fixed-step loop, or a test harness) decides when a tick happens and how
//! much time it represents.

use std::time::Instant;

/// Monotonically increasing tick counter with per-tick elapsed time.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    frame: u64,
    delta: f32,
    total: f32,
}

impl FrameClock {
    /// Create a clock at frame zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick of `delta` seconds.
    ///
    /// Negative deltas are clamped to zero; the clock never runs backwards.
    pub fn advance(&mut self, delta: f32) {
        self.frame += 1;
        self.delta = delta.max(0.0);
        self.total += self.delta;
    }

    /// Number of ticks taken so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Elapsed seconds of the most recent tick.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Total elapsed seconds across all ticks.
    pub fn total(&self) -> f32 {
        self.total
    }
}

/// Real-time delta source for driving a [`FrameClock`] from a render loop.
///
/// ```
/// use scene_engine::foundation::time::Timer;
///
/// let mut timer = Timer::new();
/// let delta = timer.step(); // seconds since the previous step
/// assert!(delta >= 0.0);
/// ```
#[derive(Debug)]
pub struct Timer {
    last_step: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a timer; the first `step` measures from this moment.
    pub fn new() -> Self {
        Self {
            last_step: Instant::now(),
        }
    }

    /// Seconds elapsed since the previous `step` (or construction).
    pub fn step(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_step).as_secs_f32();
        self.last_step = now;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clock_counts_frames_and_accumulates_time() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.frame(), 0);

        clock.advance(0.016);
        clock.advance(0.020);

        assert_eq!(clock.frame(), 2);
        assert_relative_eq!(clock.delta(), 0.020);
        assert_relative_eq!(clock.total(), 0.036);
    }

    #[test]
    fn clock_clamps_negative_deltas() {
        let mut clock = FrameClock::new();
        clock.advance(-1.0);
        assert_eq!(clock.frame(), 1);
        assert_relative_eq!(clock.delta(), 0.0);
        assert_relative_eq!(clock.total(), 0.0);
    }

    #[test]
    fn timer_steps_are_non_negative() {
        let mut timer = Timer::new();
        assert!(timer.step() >= 0.0);
        assert!(timer.step() >= 0.0);
    }
}
