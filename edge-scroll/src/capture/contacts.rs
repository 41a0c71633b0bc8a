//! Frame-to-frame contact tracking
//!
//! Remembers each touching contact's last position so the next frame's
//! sample can carry it. Ids missing from a frame, and contacts that lift,
//! are forgotten.

use super::types::{ContactId, ContactSample};
use crate::device::report::RawContact;
use crate::time::timebase::Timestamp;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Default)]
pub struct ContactTracker {
    last_positions: HashMap<ContactId, (i32, i32)>,
}

impl ContactTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn one decoded frame into samples and remember positions for the next.
    pub fn update(&mut self, contacts: &[RawContact], timestamp: Timestamp) -> Vec<ContactSample> {
        let samples: Vec<ContactSample> = contacts
            .iter()
            .map(|raw| {
                let last = self.last_positions.get(&raw.id).copied();
                ContactSample::from_raw(raw, last, timestamp)
            })
            .collect();

        let before = self.last_positions.len();
        self.last_positions = samples
            .iter()
            .filter(|s| s.touching)
            .map(|s| (s.id, (s.x, s.y)))
            .collect();

        if before != self.last_positions.len() {
            trace!("Tracking {} contacts (was {})", self.last_positions.len(), before);
        }
        samples
    }

    /// Number of contacts currently remembered
    pub fn tracked(&self) -> usize {
        self.last_positions.len()
    }

    pub fn clear(&mut self) {
        self.last_positions.clear();
    }
}
