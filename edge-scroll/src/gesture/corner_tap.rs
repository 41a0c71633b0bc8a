//! Corner tap recognition
//!
//! A tap opens when a contact first touches inside one of the four corner
//! boxes, stays valid while the contact moves less than the threshold on
//! each axis, and completes on lift if it was short enough.

use crate::app::config::CornerTapConfig;
use crate::capture::types::{ContactId, ContactSample, Corner};
use crate::device::capabilities::TouchSurfaceDescriptor;
use crate::time::timebase::{Duration, Timestamp};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Corner whose box contains `(x, y)`, if any.
///
/// Each box spans `size_percent` of the width from its vertical edge and of
/// the height from its horizontal edge; both conditions must hold.
pub fn corner_at(descriptor: &TouchSurfaceDescriptor, size_percent: f64, x: i32, y: i32) -> Option<Corner> {
    if !descriptor.is_initialized() {
        return None;
    }
    let box_w = descriptor.width() * size_percent / 100.0;
    let box_h = descriptor.height() * size_percent / 100.0;
    let (x, y) = (f64::from(x), f64::from(y));

    let left = x <= f64::from(descriptor.logical_min_x) + box_w;
    let right = x >= f64::from(descriptor.logical_max_x) - box_w;
    let top = y <= f64::from(descriptor.logical_min_y) + box_h;
    let bottom = y >= f64::from(descriptor.logical_max_y) - box_h;

    match (left, right, top, bottom) {
        (true, _, true, _) => Some(Corner::TopLeft),
        (_, true, true, _) => Some(Corner::TopRight),
        (true, _, _, true) => Some(Corner::BottomLeft),
        (_, true, _, true) => Some(Corner::BottomRight),
        _ => None,
    }
}

/// Tap bookkeeping for one contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerTapState {
    pub corner: Corner,
    pub start: Timestamp,
    pub start_x: i32,
    pub start_y: i32,
    /// Still under the movement threshold
    pub valid: bool,
    /// Reinterpreted as another gesture
    pub cancelled: bool,
}

impl CornerTapState {
    pub fn is_active(&self) -> bool {
        self.valid && !self.cancelled
    }
}

/// A tap that completed on lift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerTapCompleted {
    pub id: ContactId,
    pub corner: Corner,
    /// Release position
    pub x: i32,
    pub y: i32,
    pub duration: Duration,
}

/// Per-contact corner tap detector
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    taps: HashMap<ContactId, CornerTapState>,
    /// Contacts that have had at least one touching frame
    touched: HashSet<ContactId>,
}

impl GestureRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame; returns taps completed by lifts in this frame.
    pub fn process(
        &mut self,
        samples: &[ContactSample],
        descriptor: &TouchSurfaceDescriptor,
        config: &CornerTapConfig,
    ) -> Vec<CornerTapCompleted> {
        let mut completed = Vec::new();
        if !descriptor.is_initialized() {
            return completed;
        }

        let max_dx = descriptor.width() * config.movement_threshold_percent / 100.0;
        let max_dy = descriptor.height() * config.movement_threshold_percent / 100.0;
        let max_duration = Duration::from_millis(config.max_duration_ms);

        for sample in samples {
            if sample.touching {
                if self.touched.insert(sample.id) {
                    if let Some(corner) = corner_at(descriptor, config.size_percent, sample.x, sample.y) {
                        trace!("Contact {} opened a tap in {:?}", sample.id, corner);
                        self.taps.insert(
                            sample.id,
                            CornerTapState {
                                corner,
                                start: sample.timestamp,
                                start_x: sample.x,
                                start_y: sample.y,
                                valid: true,
                                cancelled: false,
                            },
                        );
                    }
                } else if let Some(tap) = self.taps.get_mut(&sample.id) {
                    let dx = f64::from(sample.x - tap.start_x).abs();
                    let dy = f64::from(sample.y - tap.start_y).abs();
                    if tap.valid && (dx > max_dx || dy > max_dy) {
                        trace!("Contact {} moved out of tap range", sample.id);
                        tap.valid = false;
                    }
                }
                continue;
            }

            // Lift frame
            self.touched.remove(&sample.id);
            let Some(tap) = self.taps.remove(&sample.id) else {
                continue;
            };
            let duration = sample.timestamp.duration_since(tap.start);
            if tap.is_active() && duration <= max_duration {
                debug!(
                    "Corner tap {:?} completed in {} ms",
                    tap.corner,
                    duration.as_millis()
                );
                completed.push(CornerTapCompleted {
                    id: sample.id,
                    corner: tap.corner,
                    x: sample.x,
                    y: sample.y,
                    duration,
                });
            }
        }

        // Ids missing from this frame are gone
        let present: HashSet<ContactId> = samples.iter().map(|s| s.id).collect();
        self.taps.retain(|id, _| present.contains(id));
        self.touched.retain(|id| present.contains(id));

        completed
    }

    /// True while the contact has an open, valid, uncancelled tap
    pub fn is_active_tap(&self, id: ContactId) -> bool {
        self.taps.get(&id).is_some_and(|tap| tap.is_active())
    }

    pub fn tap(&self, id: ContactId) -> Option<&CornerTapState> {
        self.taps.get(&id)
    }

    /// Invalidate a tap because the contact turned into another gesture
    pub fn cancel(&mut self, id: ContactId) {
        if let Some(tap) = self.taps.get_mut(&id) {
            tap.valid = false;
            tap.cancelled = true;
        }
    }

    /// Forget every open tap
    pub fn clear(&mut self) {
        self.taps.clear();
        self.touched.clear();
    }

    pub fn open_taps(&self) -> usize {
        self.taps.len()
    }
}
