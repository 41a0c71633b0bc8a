//! Pointer-move interception decision
//!
//! The state machine publishes a small snapshot after every frame; the host's
//! pointer hook reads it from another thread. Reads and writes are plain
//! atomics, so the hook never blocks.

use super::types::{AtomicGestureState, GestureState};
use crate::time::timebase::{Duration, Timestamp};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Attribution window while a gesture owns the pointer
pub const ACTIVE_GESTURE_WINDOW: Duration = Duration::from_millis(100);

/// Attribution window for ordinary frames
pub const RECENT_FRAME_WINDOW: Duration = Duration::from_millis(30);

/// Snapshot shared between the frame path and the pointer hook
#[derive(Debug, Default)]
pub struct InterceptState {
    state: AtomicGestureState,
    last_frame_us: AtomicU64,
    has_frame: AtomicBool,
    active_contacts: AtomicU32,
    primary_moving: AtomicBool,
}

impl InterceptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the outcome of one frame
    pub fn publish(&self, state: GestureState, frame_time: Timestamp, active_contacts: u32, primary_moving: bool) {
        self.active_contacts.store(active_contacts, Ordering::Relaxed);
        self.primary_moving.store(primary_moving, Ordering::Relaxed);
        self.last_frame_us.store(frame_time.as_micros(), Ordering::Relaxed);
        self.state.store(state, Ordering::Relaxed);
        self.has_frame.store(true, Ordering::Release);
    }

    /// Update only the gesture state (configuration resets, device loss)
    pub fn set_state(&self, state: GestureState) {
        self.state.store(state, Ordering::Release);
    }

    pub fn state(&self) -> GestureState {
        self.state.load(Ordering::Acquire)
    }

    /// Whether a pointer move at `now` was most likely generated by the surface
    pub fn is_touchpad_pointer_move(&self, now: Timestamp) -> bool {
        if !self.has_frame.load(Ordering::Acquire) {
            return false;
        }
        let last = Timestamp::from_micros(self.last_frame_us.load(Ordering::Relaxed));
        let elapsed = now.duration_since(last);

        if self.state().owns_pointer() {
            return elapsed <= ACTIVE_GESTURE_WINDOW;
        }

        elapsed <= RECENT_FRAME_WINDOW
            && self.active_contacts.load(Ordering::Relaxed) > 0
            && self.primary_moving.load(Ordering::Relaxed)
    }

    /// Whether the pointer hook should swallow a move at `now`
    pub fn should_intercept(&self, now: Timestamp) -> bool {
        self.state().owns_pointer() && self.is_touchpad_pointer_move(now)
    }
}

/// Cloneable handle for the pointer-hook thread
#[derive(Debug, Clone, Default)]
pub struct InterceptHandle {
    inner: Arc<InterceptState>,
}

impl InterceptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.inner.state()
    }

    pub fn is_touchpad_pointer_move(&self, now: Timestamp) -> bool {
        self.inner.is_touchpad_pointer_move(now)
    }

    pub fn should_intercept(&self, now: Timestamp) -> bool {
        self.inner.should_intercept(now)
    }

    pub(crate) fn shared(&self) -> &InterceptState {
        &self.inner
    }
}
