//! Output event sinks
//!
//! The pipeline and the inertia thread both emit through an [`EventSink`],
//! so implementations must be shareable across threads.

use super::ring_buffer::{EventConsumer, EventProducer, EventRingBuffer, RingBufferStats};
use super::types::OutputEvent;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::warn;

/// Receiver of output events, in delivery order
pub trait EventSink: Send + Sync {
    fn emit(&self, event: OutputEvent);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: OutputEvent) {}
}

/// Sink that keeps events in memory until drained
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<OutputEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all collected events
    pub fn drain(&self) -> Vec<OutputEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Copy of the collected events, leaving them in place
    pub fn snapshot(&self) -> Vec<OutputEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: OutputEvent) {
        self.events.lock().push(event);
    }
}

/// Sink feeding the producer half of an [`EventRingBuffer`]
pub struct RingBufferSink {
    producer: Mutex<EventProducer>,
}

impl RingBufferSink {
    pub fn new(producer: EventProducer) -> Self {
        Self {
            producer: Mutex::new(producer),
        }
    }

    /// Sink plus the consumer half of a fresh buffer
    pub fn with_capacity(capacity: usize) -> (Self, EventConsumer) {
        let (producer, consumer) = EventRingBuffer::with_capacity(capacity).split();
        (Self::new(producer), consumer)
    }

    /// Counters of the underlying buffer
    pub fn stats(&self) -> Arc<RingBufferStats> {
        self.producer.lock().stats()
    }
}

impl EventSink for RingBufferSink {
    fn emit(&self, event: OutputEvent) {
        if !self.producer.lock().push(event) {
            warn!("Output ring buffer full, dropped {:?}", event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{ScrollAxis, ScrollZoneType, WheelCommand};

    #[test]
    fn test_collecting_sink_drain() {
        let sink = CollectingSink::new();
        sink.emit(OutputEvent::ZoneExit {
            zone: ScrollZoneType::Vertical,
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.snapshot().len(), 1);

        let events = sink.drain();
        assert_eq!(events.len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_ring_buffer_sink() {
        let (sink, mut consumer) = RingBufferSink::with_capacity(1);
        let cmd = WheelCommand::new(ScrollAxis::Horizontal, 2);
        sink.emit(OutputEvent::Wheel(cmd));
        sink.emit(OutputEvent::Wheel(cmd));

        assert_eq!(consumer.pop_batch(10).len(), 1);
    }

    #[test]
    fn test_sink_shared_across_threads() {
        let sink = Arc::new(CollectingSink::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        sink.emit(OutputEvent::Wheel(WheelCommand::new(ScrollAxis::Vertical, 1)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(sink.len(), 100);
    }
}
