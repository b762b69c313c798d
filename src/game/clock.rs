//! Frame clock - wall-clock timestamps to bounded delta time

use std::time::Instant;

/// Largest delta a single frame may observe, in seconds. Long stalls
/// (debugger, suspended tab, missed ticks) must not turn into a huge
/// integration step.
pub const MAX_FRAME_DELTA: f32 = 0.1;

/// Converts wall-clock frame timestamps into a bounded delta-time value.
#[derive(Debug)]
pub struct SimulationClock {
    last_frame: Option<Instant>,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self { last_frame: None }
    }

    /// Delta time in seconds since the previous call, clamped to
    /// [`MAX_FRAME_DELTA`]. The first frame yields 0.
    pub fn frame_delta(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame = Some(now);
        dt.min(MAX_FRAME_DELTA)
    }

    /// Forget the previous frame so the next delta starts from zero.
    pub fn reset(&mut self) {
        self.last_frame = None;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn first_frame_is_zero() {
        let mut clock = SimulationClock::new();
        assert_eq!(clock.frame_delta(Instant::now()), 0.0);
    }

    #[test]
    fn delta_is_elapsed_time() {
        let mut clock = SimulationClock::new();
        let start = Instant::now();
        clock.frame_delta(start);
        let dt = clock.frame_delta(start + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-4);
    }

    #[test]
    fn delta_is_clamped_after_stall() {
        let mut clock = SimulationClock::new();
        let start = Instant::now();
        clock.frame_delta(start);
        let dt = clock.frame_delta(start + Duration::from_secs(5));
        assert_eq!(dt, MAX_FRAME_DELTA);
    }

    #[test]
    fn reset_forgets_last_frame() {
        let mut clock = SimulationClock::new();
        let start = Instant::now();
        clock.frame_delta(start);
        clock.reset();
        assert_eq!(clock.frame_delta(start + Duration::from_secs(1)), 0.0);
    }
}
