//! Core types for the touch pipeline
//!
//! These types are designed for:
//! - Cheap copies: samples and commands are `Copy`
//! - Lock-free sharing: the gesture state has an atomic mirror
//! - Serialization: output events serialize to tagged JSON for traces and the CLI

use crate::device::report::RawContact;
use crate::time::timebase::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Wheel units per detent (one notch of a classic mouse wheel)
pub const WHEEL_DELTA: i32 = 120;

/// Stable contact identifier
pub type ContactId = u32;

/// One contact in one frame, with its previous-frame position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSample {
    pub id: ContactId,
    pub x: i32,
    pub y: i32,
    /// Position in the previous frame (equal to `x`/`y` on first sight)
    pub last_x: i32,
    pub last_y: i32,
    pub touching: bool,
    pub confidence: bool,
    pub timestamp: Timestamp,
}

impl ContactSample {
    /// A first-sight sample: previous position equals the current one
    pub fn new(id: ContactId, x: i32, y: i32, timestamp: Timestamp) -> Self {
        Self {
            id,
            x,
            y,
            last_x: x,
            last_y: y,
            touching: true,
            confidence: true,
            timestamp,
        }
    }

    /// Build from a decoded contact and its previous position, if any
    pub fn from_raw(raw: &RawContact, last: Option<(i32, i32)>, timestamp: Timestamp) -> Self {
        let (last_x, last_y) = last.unwrap_or((raw.x, raw.y));
        Self {
            id: raw.id,
            x: raw.x,
            y: raw.y,
            last_x,
            last_y,
            touching: raw.touching,
            confidence: raw.confidence,
            timestamp,
        }
    }

    /// Set the previous-frame position
    pub fn with_last(mut self, last_x: i32, last_y: i32) -> Self {
        self.last_x = last_x;
        self.last_y = last_y;
        self
    }

    /// Set the tip switch flag
    pub fn with_touching(mut self, touching: bool) -> Self {
        self.touching = touching;
        self
    }

    /// Set the confidence flag
    pub fn with_confidence(mut self, confidence: bool) -> Self {
        self.confidence = confidence;
        self
    }

    #[inline]
    pub fn delta_x(&self) -> i32 {
        self.x.saturating_sub(self.last_x)
    }

    #[inline]
    pub fn delta_y(&self) -> i32 {
        self.y.saturating_sub(self.last_y)
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.delta_x() != 0 || self.delta_y() != 0
    }
}

/// Overall gesture state of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum GestureState {
    /// No gesture in progress
    #[default]
    None = 0,
    /// A corner tap may be in progress
    CornerTap = 1,
    /// In a zone, waiting for the direction to settle
    ScrollPending = 2,
    /// Zone scrolling
    Scrolling = 3,
    /// Ordinary pointer movement until every contact lifts
    NormalCursor = 4,
}

impl GestureState {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => GestureState::None,
            1 => GestureState::CornerTap,
            2 => GestureState::ScrollPending,
            3 => GestureState::Scrolling,
            4 => GestureState::NormalCursor,
            _ => GestureState::NormalCursor,
        }
    }

    /// States that a lost primary contact must abandon
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            GestureState::CornerTap | GestureState::ScrollPending | GestureState::Scrolling
        )
    }

    /// States in which pointer movement belongs to the gesture
    pub fn owns_pointer(&self) -> bool {
        matches!(self, GestureState::CornerTap | GestureState::Scrolling)
    }
}

impl fmt::Display for GestureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GestureState::None => "none",
            GestureState::CornerTap => "corner-tap",
            GestureState::ScrollPending => "scroll-pending",
            GestureState::Scrolling => "scrolling",
            GestureState::NormalCursor => "normal-cursor",
        };
        f.write_str(name)
    }
}

/// Atomic wrapper for GestureState
#[derive(Debug)]
pub struct AtomicGestureState(AtomicU8);

impl AtomicGestureState {
    pub const fn new(state: GestureState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self, ordering: Ordering) -> GestureState {
        GestureState::from_u8(self.0.load(ordering))
    }

    pub fn store(&self, state: GestureState, ordering: Ordering) {
        self.0.store(state as u8, ordering);
    }
}

impl Default for AtomicGestureState {
    fn default() -> Self {
        Self::new(GestureState::None)
    }
}

/// Which scroll zone a contact is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollZoneType {
    #[default]
    None,
    Vertical,
    Horizontal,
}

impl ScrollZoneType {
    /// Scroll axis of the zone, if it is one
    pub fn axis(&self) -> Option<ScrollAxis> {
        match self {
            ScrollZoneType::None => None,
            ScrollZoneType::Vertical => Some(ScrollAxis::Vertical),
            ScrollZoneType::Horizontal => Some(ScrollAxis::Horizontal),
        }
    }
}

/// Corners of the touch surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    pub fn is_left(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::BottomLeft)
    }

    pub fn is_top(&self) -> bool {
        matches!(self, Corner::TopLeft | Corner::TopRight)
    }
}

/// Wheel axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

/// A synthesized wheel movement, hardware independent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelCommand {
    pub axis: ScrollAxis,
    /// Signed detent count; positive is up for vertical and right for horizontal
    pub detents: i32,
}

impl WheelCommand {
    pub fn new(axis: ScrollAxis, detents: i32) -> Self {
        Self { axis, detents }
    }

    /// Signed wheel units (detents × 120)
    pub fn wheel_units(&self) -> i32 {
        self.detents.saturating_mul(WHEEL_DELTA)
    }
}

/// Everything the pipeline emits, in delivery order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// Scrolling started in a zone, carrying the entering delta
    ZoneEnter {
        zone: ScrollZoneType,
        delta_x: i32,
        delta_y: i32,
    },
    /// Movement within the active zone
    ZoneMove {
        zone: ScrollZoneType,
        delta_x: i32,
        delta_y: i32,
    },
    /// Scrolling ended
    ZoneExit { zone: ScrollZoneType },
    /// A completed corner tap at the lift position
    CornerTap { corner: Corner, x: i32, y: i32 },
    /// A wheel command from the emitter or the inertia task
    Wheel(WheelCommand),
}

impl OutputEvent {
    pub fn is_wheel(&self) -> bool {
        matches!(self, OutputEvent::Wheel(_))
    }

    /// The wheel command, if this is one
    pub fn wheel(&self) -> Option<WheelCommand> {
        match self {
            OutputEvent::Wheel(cmd) => Some(*cmd),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_deltas() {
        let sample = ContactSample::new(1, 110, 95, Timestamp::from_millis(5)).with_last(100, 100);
        assert_eq!(sample.delta_x(), 10);
        assert_eq!(sample.delta_y(), -5);
        assert!(sample.has_moved());
    }

    #[test]
    fn test_first_sight_has_zero_delta() {
        let raw = RawContact {
            id: 2,
            x: 300,
            y: 400,
            touching: true,
            confidence: false,
        };
        let sample = ContactSample::from_raw(&raw, None, Timestamp::from_millis(1));
        assert_eq!((sample.delta_x(), sample.delta_y()), (0, 0));
        assert!(!sample.confidence);

        let seeded = ContactSample::from_raw(&raw, Some((290, 420)), Timestamp::from_millis(1));
        assert_eq!((seeded.delta_x(), seeded.delta_y()), (10, -20));
    }

    #[test]
    fn test_gesture_state_round_trip_u8() {
        for state in [
            GestureState::None,
            GestureState::CornerTap,
            GestureState::ScrollPending,
            GestureState::Scrolling,
            GestureState::NormalCursor,
        ] {
            assert_eq!(GestureState::from_u8(state as u8), state);
        }
        assert_eq!(GestureState::from_u8(200), GestureState::NormalCursor);
    }

    #[test]
    fn test_gesture_state_categories() {
        assert!(GestureState::Scrolling.owns_pointer());
        assert!(GestureState::CornerTap.owns_pointer());
        assert!(!GestureState::ScrollPending.owns_pointer());
        assert!(GestureState::ScrollPending.is_in_progress());
        assert!(!GestureState::None.is_in_progress());
        assert!(!GestureState::NormalCursor.is_in_progress());
    }

    #[test]
    fn test_atomic_gesture_state() {
        let state = AtomicGestureState::default();
        assert_eq!(state.load(Ordering::SeqCst), GestureState::None);

        state.store(GestureState::Scrolling, Ordering::SeqCst);
        assert_eq!(state.load(Ordering::SeqCst), GestureState::Scrolling);
    }

    #[test]
    fn test_wheel_units() {
        assert_eq!(WheelCommand::new(ScrollAxis::Vertical, -3).wheel_units(), -360);
        assert_eq!(ScrollZoneType::Horizontal.axis(), Some(ScrollAxis::Horizontal));
        assert_eq!(ScrollZoneType::None.axis(), None);
    }

    #[test]
    fn test_output_event_json() {
        let event = OutputEvent::ZoneEnter {
            zone: ScrollZoneType::Vertical,
            delta_x: 0,
            delta_y: -12,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"zone_enter\""));
        assert!(json.contains("\"zone\":\"vertical\""));

        let back: OutputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
