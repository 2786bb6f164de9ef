use std::time::{Duration, Instant};

/// Window after which the tally is turned into a rate and reset.
pub const FPS_WINDOW: Duration = Duration::from_secs(1);

/// Windowed frame-rate counter.
///
/// The reported value only changes when a window closes, so the on-screen number is
/// up to one window stale but does not jitter between frames.
#[derive(Clone, Debug)]
pub struct FrameRateTracker {
    tally: u64,
    window_start: Instant,
    current: f64,
}

impl FrameRateTracker {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            tally: 0,
            window_start: start,
            current: 0.0,
        }
    }

    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Count one frame observed at `now`.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        self.tally += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed > FPS_WINDOW {
            let rate = self.tally as f64 / elapsed.as_secs_f64();
            if rate.is_finite() && rate >= 0.0 {
                self.current = rate;
            }
            self.tally = 0;
            self.window_start = now;
        }
        self.current
    }

    /// Last reported value.
    pub fn current(&self) -> f64 {
        self.current
    }
}

impl Default for FrameRateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holds_value_until_window_closes() {
        let start = Instant::now();
        let mut tracker = FrameRateTracker::starting_at(start);

        for i in 1..=10 {
            let fps = tracker.tick_at(start + Duration::from_millis(i * 90));
            assert_eq!(fps, 0.0);
        }

        // 11th frame at 1.1s closes the window.
        let fps = tracker.tick_at(start + Duration::from_millis(1100));
        assert!((fps - 10.0).abs() < 1e-9);

        // Later frames inside the next window keep reporting the old value.
        let held = tracker.tick_at(start + Duration::from_millis(1500));
        assert_eq!(held, fps);
    }

    #[test]
    fn exactly_one_second_does_not_reset() {
        let start = Instant::now();
        let mut tracker = FrameRateTracker::starting_at(start);
        assert_eq!(tracker.tick_at(start + FPS_WINDOW), 0.0);
        let fps = tracker.tick_at(start + Duration::from_millis(2000));
        assert!((fps - 1.0).abs() < 1e-9);
    }

    #[test]
    fn clock_going_backwards_is_harmless() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut tracker = FrameRateTracker::starting_at(start);
        let fps = tracker.tick_at(start - Duration::from_secs(1));
        assert_eq!(fps, 0.0);
        assert!(tracker.current() >= 0.0);
    }
}
