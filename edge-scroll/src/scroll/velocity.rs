//! Rolling velocity estimate
//!
//! Keeps the per-frame scroll contributions of the last [`VELOCITY_WINDOW`]
//! and reports travel per second across them.

use crate::time::timebase::{Duration, Timestamp};
use std::collections::VecDeque;

/// How far back the estimate looks
pub const VELOCITY_WINDOW: Duration = Duration::from_millis(100);

/// Velocity tracker over one scroll axis
#[derive(Debug, Default, Clone)]
pub struct VelocityTracker {
    /// (frame time, contribution since the previous frame)
    history: VecDeque<(Timestamp, f64)>,
}

impl VelocityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame's contribution
    pub fn record(&mut self, timestamp: Timestamp, delta: f64) {
        self.history.push_back((timestamp, delta));
        self.prune(timestamp);
    }

    /// Units per second over the window ending at `now`.
    ///
    /// The oldest sample only anchors the time span; its own delta happened
    /// before the window started. Fewer than two samples read as stationary.
    pub fn velocity(&mut self, now: Timestamp) -> f64 {
        self.prune(now);
        let (Some(&(first, _)), Some(&(last, _))) = (self.history.front(), self.history.back()) else {
            return 0.0;
        };
        let span = last.duration_since(first).as_secs_f64();
        if span <= 0.0 {
            return 0.0;
        }
        let travel: f64 = self.history.iter().skip(1).map(|&(_, d)| d).sum();
        travel / span
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn prune(&mut self, now: Timestamp) {
        while let Some(&(ts, _)) = self.history.front() {
            if now.duration_since(ts) > VELOCITY_WINDOW {
                self.history.pop_front();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_motion() {
        let mut tracker = VelocityTracker::new();
        for i in 0..6 {
            tracker.record(Timestamp::from_millis(1000 + i * 10), 10.0);
        }
        // 10 units every 10 ms
        let v = tracker.velocity(Timestamp::from_millis(1050));
        assert!((v - 1000.0).abs() < 1e-6, "got {}", v);
    }

    #[test]
    fn test_single_sample_is_stationary() {
        let mut tracker = VelocityTracker::new();
        tracker.record(Timestamp::from_millis(10), 50.0);
        assert_eq!(tracker.velocity(Timestamp::from_millis(10)), 0.0);
    }

    #[test]
    fn test_old_samples_expire() {
        let mut tracker = VelocityTracker::new();
        tracker.record(Timestamp::from_millis(0), 10.0);
        tracker.record(Timestamp::from_millis(10), 10.0);
        assert!(tracker.velocity(Timestamp::from_millis(20)) > 0.0);

        // A pause longer than the window means the contact stopped
        assert_eq!(tracker.velocity(Timestamp::from_millis(500)), 0.0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_direction_is_signed() {
        let mut tracker = VelocityTracker::new();
        tracker.record(Timestamp::from_millis(0), -5.0);
        tracker.record(Timestamp::from_millis(8), -8.0);
        tracker.record(Timestamp::from_millis(16), -8.0);
        assert!(tracker.velocity(Timestamp::from_millis(16)) < -900.0);
    }
}
