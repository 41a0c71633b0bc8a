//! Monotonic timing module
//!
//! Frame timestamps, tap durations, intercept windows and inertia ticks all
//! use the microsecond wrappers defined here.

pub mod timebase;

pub use timebase::{Duration, Timebase, Timestamp};
