//! Capture layer
//!
//! Per-frame contact samples, output events and the channels that carry them
//! out of the pipeline: sinks, the SPSC ring buffer and the lock-free
//! intercept snapshot read by the host's pointer hook.

pub mod types;
pub mod contacts;
pub mod ring_buffer;
pub mod sink;
pub mod intercept;

pub use types::*;
pub use contacts::ContactTracker;
pub use ring_buffer::EventRingBuffer;
pub use sink::{CollectingSink, EventSink, NullSink, RingBufferSink};
pub use intercept::{InterceptHandle, InterceptState};
