//! Workflow Module
//!
//! Per-device touch sessions and the trace recordings they capture and replay.

pub mod recording;
pub mod session;

pub use recording::{TraceFrame, TraceMetadata, TraceRecording};
pub use session::{SessionStats, TouchSession};
