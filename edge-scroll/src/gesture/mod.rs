//! Gesture recognition

pub mod corner_tap;

pub use corner_tap::{corner_at, CornerTapCompleted, CornerTapState, GestureRecognizer};
