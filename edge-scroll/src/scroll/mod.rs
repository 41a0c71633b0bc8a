//! Scroll output
//!
//! Detent accumulation, velocity tracking and inertia.

pub mod emitter;
pub mod inertia;
pub mod velocity;

pub use emitter::{detent_size, ScrollEmitter, ScrollSettings};
pub use inertia::{InertiaState, InertiaTask};
pub use velocity::VelocityTracker;
