//! Scroll inertia
//!
//! After a fast zone exit the scroll keeps going with exponentially decaying
//! velocity. [`InertiaState`] is the pure model; [`InertiaTask`] drives it on
//! a dedicated thread at a fixed tick until it decays or is stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Tick period of the inertia loop
pub const INERTIA_TICK: Duration = Duration::from_millis(16);

/// Exit velocity (units/s) required to start inertia
pub const MIN_START_VELOCITY: f64 = 500.0;

/// Velocity (units/s) below which inertia stops
pub const STOP_VELOCITY: f64 = 50.0;

/// Fraction of velocity retained after one second
pub const DECAY_PER_SECOND: f64 = 0.2;

/// Decaying velocity along one axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaState {
    velocity: f64,
}

impl InertiaState {
    /// Inertia for an exit velocity, if it is fast enough to start
    pub fn start(velocity: f64) -> Option<Self> {
        (velocity.is_finite() && velocity.abs() >= MIN_START_VELOCITY).then_some(Self { velocity })
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Advance by `dt` seconds: returns the distance covered, then decays.
    pub fn advance(&mut self, dt: f64) -> f64 {
        let dt = dt.max(0.0);
        let distance = self.velocity * dt;
        self.velocity *= DECAY_PER_SECOND.powf(dt);
        distance
    }

    pub fn is_finished(&self) -> bool {
        self.velocity.abs() < STOP_VELOCITY
    }
}

/// Handle to a running inertia loop
#[derive(Debug)]
pub struct InertiaTask {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InertiaTask {
    /// Spawn the loop. `on_distance` receives each tick's travel.
    pub fn spawn<F>(mut state: InertiaState, mut on_distance: F) -> crate::Result<Self>
    where
        F: FnMut(f64) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);
        let handle = thread::Builder::new()
            .name("scroll-inertia".into())
            .spawn(move || {
                let mut last = Instant::now();
                let mut ticks = 0u32;
                while !thread_stop.load(Ordering::Acquire) {
                    thread::sleep(INERTIA_TICK);
                    if thread_stop.load(Ordering::Acquire) {
                        break;
                    }
                    let now = Instant::now();
                    let dt = now.duration_since(last).as_secs_f64();
                    last = now;

                    on_distance(state.advance(dt));
                    ticks += 1;
                    if state.is_finished() {
                        break;
                    }
                }
                trace!("Inertia loop ended after {} ticks", ticks);
                thread_finished.store(true, Ordering::Release);
            })?;

        debug!("Inertia started at {:.0} units/s", state.velocity());
        Ok(Self {
            stop,
            finished,
            handle: Some(handle),
        })
    }

    /// Whether the loop is still ticking
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }

    /// Stop the loop and wait for its last tick to finish
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Inertia thread panicked before finishing");
                self.finished.store(true, Ordering::Release);
            }
        }
    }
}

impl Drop for InertiaTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_start_threshold() {
        assert!(InertiaState::start(499.9).is_none());
        assert!(InertiaState::start(-499.9).is_none());
        assert!(InertiaState::start(500.0).is_some());
        assert!(InertiaState::start(-800.0).is_some());
        assert!(InertiaState::start(f64::NAN).is_none());
    }

    #[test]
    fn test_decay_per_second() {
        let mut state = InertiaState::start(1000.0).unwrap();
        let distance = state.advance(1.0);
        assert_eq!(distance, 1000.0);
        assert!((state.velocity() - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_decays_to_stop() {
        let mut state = InertiaState::start(600.0).unwrap();
        let mut total = 0.0;
        let mut ticks = 0;
        while !state.is_finished() {
            total += state.advance(0.016);
            ticks += 1;
            assert!(ticks < 1000, "inertia never stopped");
        }
        assert!(state.velocity().abs() < STOP_VELOCITY);
        // Geometric series bound: v0 / ln(1/0.2)
        assert!(total > 0.0 && total < 600.0 / (1.0 / DECAY_PER_SECOND).ln() + 1.0);
    }

    #[test]
    fn test_task_runs_to_completion() {
        let travelled = Arc::new(Mutex::new(0.0f64));
        let sink = Arc::clone(&travelled);
        let task = InertiaTask::spawn(InertiaState::start(2000.0).unwrap(), move |d| {
            *sink.lock() += d;
        })
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while task.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        assert!(!task.is_running());
        assert!(*travelled.lock() > 0.0);
    }

    #[test]
    fn test_stop_joins() {
        let ticks = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&ticks);
        let mut task = InertiaTask::spawn(InertiaState::start(5000.0).unwrap(), move |_| {
            *counter.lock() += 1;
        })
        .unwrap();

        thread::sleep(Duration::from_millis(40));
        task.stop();
        let after_stop = *ticks.lock();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(*ticks.lock(), after_stop);
    }

    #[test]
    fn test_stop_after_callback_panic() {
        let mut task = InertiaTask::spawn(InertiaState::start(5000.0).unwrap(), |_| {
            panic!("sink rejected wheel event");
        })
        .unwrap();

        thread::sleep(Duration::from_millis(50));
        task.stop();
        assert!(!task.is_running());
    }
}
