//! # Edge Scroll
//!
//! An edge-scrolling engine for precision touch surfaces. Raw digitizer
//! reports go in; synthetic wheel detents, zone notifications and corner-tap
//! gestures come out, together with a lock-free decision for whether the host
//! should swallow the pointer movement the OS generates for the same contact.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use edge_scroll::app::config::Config;
//! use edge_scroll::capture::sink::CollectingSink;
//! use edge_scroll::device::capabilities::DescriptorQuery;
//! use edge_scroll::time::Timestamp;
//! use edge_scroll::workflow::session::TouchSession;
//!
//! # fn demo(descriptor: Vec<u8>, report: &[u8]) -> edge_scroll::Result<()> {
//! let sink = Arc::new(CollectingSink::new());
//! let mut session = TouchSession::new(Config::default(), sink.clone());
//!
//! let query = DescriptorQuery::new(0x06cb, 0x00f9, "Touchpad", descriptor);
//! session.attach_device(&query)?;
//!
//! session.process_report(report, Timestamp::now());
//! for event in sink.drain() {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`device`]: HID field layouts, capability resolution and report decoding
//! - [`capture`]: contact samples, output events, sinks and the intercept state
//! - [`gesture`]: corner-tap recognition
//! - [`tracker`]: zone geometry and the per-frame gesture state machine
//! - [`scroll`]: detent accumulation, velocity tracking and inertia
//! - [`time`]: monotonic microsecond timestamps
//! - [`workflow`]: per-device sessions and trace recordings
//! - [`app`]: CLI and configuration management
//!
//! ## Event Pipeline
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  HID report │───▶│   Report    │───▶│   Contact   │───▶│    Zone     │
//! │   (bytes)   │    │   Decoder   │    │   Tracker   │    │State Machine│
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//!                                                                 │
//!                                                                 ▼
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  EventSink  │◀───│   Scroll    │◀───│ Zone / tap  │◀───│   Corner    │
//! │  (host)     │    │   Emitter   │    │   events    │    │ Recognizer  │
//! └─────────────┘    └─────────────┘    └─────────────┘    └─────────────┘
//! ```

pub mod time;
pub mod device;
pub mod capture;
pub mod gesture;
pub mod tracker;
pub mod scroll;
pub mod workflow;
pub mod app;

// Re-export commonly used types
pub use capture::types::{ContactSample, GestureState, OutputEvent, ScrollZoneType, WheelCommand};
pub use device::capabilities::TouchSurfaceDescriptor;
pub use time::timebase::Timestamp;
pub use workflow::session::TouchSession;

/// Result type alias for the edge scroll engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the edge scroll engine
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Device error: {0}")]
    Device(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Trace error: {0}")]
    Trace(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
