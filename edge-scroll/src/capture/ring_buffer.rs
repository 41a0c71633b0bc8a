//! Lock-free ring buffer for output events
//!
//! A bounded SPSC (Single Producer, Single Consumer) queue between the
//! pipeline and the host thread that injects wheel input.
//!
//! Architecture:
//! - Producer (pipeline / inertia): never blocks, drops when full
//! - Consumer (host injector): drains in batches
//!
//! The core queue is `rtrb`; this module adds sequencing and statistics.

use super::types::OutputEvent;
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default ring buffer capacity
pub const DEFAULT_CAPACITY: usize = 1024;

/// An output event with its sequence number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventSlot {
    pub event: OutputEvent,
    /// Sequence number for ordering verification
    pub sequence: u64,
}

/// Ring buffer statistics for monitoring
#[derive(Debug, Default)]
pub struct RingBufferStats {
    /// Total events pushed
    pub events_pushed: AtomicU64,
    /// Events dropped due to full buffer
    pub events_dropped: AtomicU64,
    /// Events successfully consumed
    pub events_consumed: AtomicU64,
    /// Peak buffer occupancy
    pub peak_occupancy: AtomicU64,
}

impl RingBufferStats {
    /// Fraction of pushes that were dropped
    pub fn drop_rate(&self) -> f64 {
        let pushed = self.events_pushed.load(Ordering::Relaxed);
        let dropped = self.events_dropped.load(Ordering::Relaxed);
        let total = pushed + dropped;
        if total == 0 {
            0.0
        } else {
            dropped as f64 / total as f64
        }
    }
}

/// Bounded event queue, split into halves before use
pub struct EventRingBuffer {
    producer: Producer<EventSlot>,
    consumer: Consumer<EventSlot>,
    stats: Arc<RingBufferStats>,
    capacity: usize,
}

impl EventRingBuffer {
    /// Create a new ring buffer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new ring buffer with the given capacity (at least 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (producer, consumer) = RingBuffer::new(capacity);
        Self {
            producer,
            consumer,
            stats: Arc::new(RingBufferStats::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Split into producer and consumer halves
    pub fn split(self) -> (EventProducer, EventConsumer) {
        (
            EventProducer {
                inner: self.producer,
                sequence: 0,
                stats: Arc::clone(&self.stats),
                capacity: self.capacity,
            },
            EventConsumer {
                inner: self.consumer,
                stats: self.stats,
            },
        )
    }

    /// Get statistics
    pub fn stats(&self) -> Arc<RingBufferStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for EventRingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer half of the ring buffer
pub struct EventProducer {
    inner: Producer<EventSlot>,
    sequence: u64,
    stats: Arc<RingBufferStats>,
    capacity: usize,
}

impl EventProducer {
    /// Push an event.
    ///
    /// Never blocks. If the buffer is full the event is dropped, the drop
    /// counter is incremented and false is returned.
    #[inline]
    pub fn push(&mut self, event: OutputEvent) -> bool {
        let slot = EventSlot {
            event,
            sequence: self.sequence,
        };

        match self.inner.push(slot) {
            Ok(()) => {
                self.sequence += 1;
                self.stats.events_pushed.fetch_add(1, Ordering::Relaxed);

                let occupied = (self.capacity - self.inner.slots()) as u64;
                self.stats.peak_occupancy.fetch_max(occupied, Ordering::Relaxed);
                true
            }
            Err(_) => {
                self.stats.events_dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Free slots
    #[inline]
    pub fn available_slots(&self) -> usize {
        self.inner.slots()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.inner.is_full()
    }

    /// Sequence number the next pushed event will get
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn stats(&self) -> Arc<RingBufferStats> {
        Arc::clone(&self.stats)
    }
}

/// Consumer half of the ring buffer
pub struct EventConsumer {
    inner: Consumer<EventSlot>,
    stats: Arc<RingBufferStats>,
}

impl EventConsumer {
    /// Pop one event, if any
    #[inline]
    pub fn pop(&mut self) -> Option<EventSlot> {
        match self.inner.pop() {
            Ok(slot) => {
                self.stats.events_consumed.fetch_add(1, Ordering::Relaxed);
                Some(slot)
            }
            Err(_) => None,
        }
    }

    /// Peek at the next event without removing it
    #[inline]
    pub fn peek(&self) -> Option<&EventSlot> {
        self.inner.peek().ok()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of queued events
    #[inline]
    pub fn available(&self) -> usize {
        self.inner.slots()
    }

    /// Pop up to `max_count` events
    pub fn pop_batch(&mut self, max_count: usize) -> Vec<EventSlot> {
        let mut batch = Vec::with_capacity(max_count.min(self.available()));
        while batch.len() < max_count {
            match self.pop() {
                Some(slot) => batch.push(slot),
                None => break,
            }
        }
        batch
    }
}
