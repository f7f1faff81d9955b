//! Time management utilities

use std::time::{Duration, Instant};

/// Session clock feeding the per-tick `time` uniform
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    /// Seconds since the timer was created
    pub fn elapsed(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Fixed-rate tick pacing for the render/update loop
#[derive(Debug, Clone)]
pub struct FixedStep {
    interval: Duration,
    next_tick: Instant,
}

impl FixedStep {
    /// Pace ticks at `frames_per_second`
    pub fn new(frames_per_second: u32) -> Self {
        let interval = Duration::from_secs_f64(1.0 / f64::from(frames_per_second.max(1)));
        Self {
            interval,
            next_tick: Instant::now(),
        }
    }

    /// Tick interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next tick is due
    ///
    /// A tick that ran long does not accumulate debt: the schedule restarts
    /// from now, so slow ticks drop frames instead of bursting.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if self.next_tick > now {
            std::thread::sleep(self.next_tick - now);
            self.next_tick += self.interval;
        } else {
            self.next_tick = now + self.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_step_interval_for_120_hz() {
        let step = FixedStep::new(120);
        let expected = Duration::from_secs_f64(1.0 / 120.0);
        assert_eq!(step.interval(), expected);
    }

    #[test]
    fn test_timer_elapsed_is_monotonic() {
        let timer = Timer::new();
        let first = timer.elapsed();
        std::thread::sleep(Duration::from_millis(2));
        assert!(timer.elapsed() > first);
    }
}
