//! Per-frame gesture state machine
//!
//! Decides, once per decoded frame, whether the primary contact is moving
//! the pointer, scrolling in a zone or tapping a corner. Zone scrolling needs
//! two consecutive in-zone frames whose travel points along the zone's axis
//! before it starts; anything else falls back to the normal cursor until
//! every contact lifts.
//!
//! ```text
//!            in corner box               moved / held
//!   None ───────────────────▶ CornerTap ───────────────▶ NormalCursor
//!    │                          │ in zone                    ▲
//!    │ in zone                  ▼                            │ crossing
//!    └──────▶ ScrollPending ─▶ Scrolling ────────────────────┘ / left zone
//!              (2 frames)
//! ```

use super::zone::ZoneGeometry;
use crate::app::config::Config;
use crate::capture::intercept::InterceptHandle;
use crate::capture::types::{ContactId, ContactSample, GestureState, OutputEvent, ScrollZoneType};
use crate::device::capabilities::TouchSurfaceDescriptor;
use crate::gesture::corner_tap::{corner_at, GestureRecognizer};
use crate::time::timebase::Timestamp;
use tracing::{debug, trace};

/// Consecutive in-zone frames before the direction is classified
pub const PENDING_FRAMES: u32 = 2;

/// Below this accumulated travel on both axes the direction counts as ambiguous
pub const AMBIGUITY_THRESHOLD: i32 = 15;

/// Travel accumulated while the direction settles
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Pending {
    /// Contact that entered the zone
    contact: ContactId,
    frames: u32,
    delta_x: i32,
    delta_y: i32,
}

impl Pending {
    fn start(sample: &ContactSample) -> Self {
        let mut pending = Self {
            contact: sample.id,
            ..Self::default()
        };
        pending.add(sample);
        pending
    }

    fn add(&mut self, sample: &ContactSample) {
        self.frames += 1;
        self.delta_x = self.delta_x.saturating_add(sample.delta_x());
        self.delta_y = self.delta_y.saturating_add(sample.delta_y());
    }

    /// Whether the travel runs along the zone's scroll axis
    fn confirms(&self, zone: ScrollZoneType) -> bool {
        let (along, across) = match zone {
            ScrollZoneType::Vertical => (self.delta_y.abs(), self.delta_x.abs()),
            ScrollZoneType::Horizontal => (self.delta_x.abs(), self.delta_y.abs()),
            ScrollZoneType::None => return false,
        };
        along >= across || (along < AMBIGUITY_THRESHOLD && across < AMBIGUITY_THRESHOLD)
    }
}

/// Gesture state for one device
#[derive(Debug)]
pub struct ZoneStateMachine {
    state: GestureState,
    recognizer: GestureRecognizer,
    /// Zone of the current scroll
    zone: ScrollZoneType,
    /// A zone-enter has been emitted and no zone-exit since
    zone_entered: bool,
    pending: Pending,
    intercept: InterceptHandle,
    debug: bool,
}

impl Default for ZoneStateMachine {
    fn default() -> Self {
        Self::new(InterceptHandle::new())
    }
}

impl ZoneStateMachine {
    pub fn new(intercept: InterceptHandle) -> Self {
        Self {
            state: GestureState::None,
            recognizer: GestureRecognizer::new(),
            zone: ScrollZoneType::None,
            zone_entered: false,
            pending: Pending::default(),
            intercept,
            debug: false,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// Zone of the current scroll, `None` when not scrolling
    pub fn zone(&self) -> ScrollZoneType {
        if self.is_in_scroll_zone() {
            self.zone
        } else {
            ScrollZoneType::None
        }
    }

    pub fn is_in_scroll_zone(&self) -> bool {
        self.state == GestureState::Scrolling && self.zone_entered && self.zone != ScrollZoneType::None
    }

    pub fn intercept_handle(&self) -> InterceptHandle {
        self.intercept.clone()
    }

    pub fn recognizer(&self) -> &GestureRecognizer {
        &self.recognizer
    }

    /// Evaluate one frame; returns zone and corner-tap events in order.
    pub fn process(
        &mut self,
        samples: &[ContactSample],
        descriptor: &TouchSurfaceDescriptor,
        config: &Config,
        now: Timestamp,
    ) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        if !descriptor.is_initialized() {
            return events;
        }
        self.debug = config.debug;

        let geometry = ZoneGeometry::new(descriptor, &config.zones);
        let touching: Vec<&ContactSample> = samples.iter().filter(|s| s.touching).collect();
        let primary = touching
            .iter()
            .find(|s| s.confidence)
            .or_else(|| {
                touching
                    .iter()
                    .find(|s| geometry.zone_at(s.x, s.y) != ScrollZoneType::None)
            })
            .copied();

        self.step(samples, &touching, primary, &geometry, descriptor, config, &mut events);

        self.intercept.shared().publish(
            self.state,
            now,
            touching.len() as u32,
            primary.is_some_and(|p| p.has_moved()),
        );
        events
    }

    /// Drop all gesture state (device change, configuration reset)
    pub fn reset(&mut self) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        self.exit_zone(&mut events);
        self.pending = Pending::default();
        self.recognizer.clear();
        self.transition(GestureState::None);
        self.intercept.shared().set_state(GestureState::None);
        events
    }

    #[allow(clippy::too_many_arguments)]
    fn step(
        &mut self,
        samples: &[ContactSample],
        touching: &[&ContactSample],
        primary: Option<&ContactSample>,
        geometry: &ZoneGeometry,
        descriptor: &TouchSurfaceDescriptor,
        config: &Config,
        events: &mut Vec<OutputEvent>,
    ) {
        let corner_tap = &config.corner_tap;
        let prior = self.state;

        if corner_tap.enabled {
            let completed = self.recognizer.process(samples, descriptor, corner_tap);
            if prior == GestureState::CornerTap {
                events.extend(completed.into_iter().map(|tap| OutputEvent::CornerTap {
                    corner: tap.corner,
                    x: tap.x,
                    y: tap.y,
                }));
            }
        }

        if touching.is_empty() {
            self.exit_zone(events);
            self.pending = Pending::default();
            self.recognizer.clear();
            self.transition(GestureState::None);
            return;
        }

        let count = touching.len() as u32;
        if count < config.contacts.min_contacts || count > config.contacts.max_contacts {
            trace!("{} contacts outside scroll range", count);
            self.exit_zone(events);
            self.pending = Pending::default();
            self.transition(GestureState::NormalCursor);
            return;
        }

        let Some(primary) = primary else {
            self.exit_zone(events);
            self.pending = Pending::default();
            if self.state.is_in_progress() {
                self.transition(GestureState::NormalCursor);
            }
            return;
        };

        // Corner tap owns the contact while it stays a valid tap
        if self.state == GestureState::None && corner_tap.enabled && self.recognizer.is_active_tap(primary.id) {
            self.transition(GestureState::CornerTap);
            return;
        }

        if self.state == GestureState::CornerTap {
            if self.recognizer.is_active_tap(primary.id) {
                return;
            }
            let zone = geometry.zone_at(primary.x, primary.y);
            if zone == ScrollZoneType::None {
                self.zone = ScrollZoneType::None;
                self.zone_entered = false;
                self.transition(GestureState::NormalCursor);
            } else {
                self.recognizer.cancel(primary.id);
                self.transition(GestureState::Scrolling);
                self.enter_zone(zone, primary.delta_x(), primary.delta_y(), events);
            }
            return;
        }

        if self.state == GestureState::NormalCursor {
            self.exit_zone(events);
            self.pending = Pending::default();
            return;
        }

        let zone = geometry.zone_at(primary.x, primary.y);

        if self.state == GestureState::None
            && corner_tap.enabled
            && corner_at(descriptor, corner_tap.size_percent, primary.x, primary.y).is_some()
        {
            trace!("Contact {} suppressed in corner box", primary.id);
            return;
        }

        if zone != ScrollZoneType::None {
            match self.state {
                GestureState::None => {
                    self.pending = Pending::start(primary);
                    self.transition(GestureState::ScrollPending);
                }
                GestureState::ScrollPending if self.pending.contact != primary.id => {
                    self.log(format_args!(
                        "Primary changed {} -> {} while pending, restarting",
                        self.pending.contact, primary.id
                    ));
                    self.pending = Pending::start(primary);
                }
                GestureState::ScrollPending => {
                    self.pending.add(primary);
                    if self.pending.frames >= PENDING_FRAMES {
                        let pending = std::mem::take(&mut self.pending);
                        if pending.confirms(zone) {
                            self.transition(GestureState::Scrolling);
                            self.enter_zone(zone, pending.delta_x, pending.delta_y, events);
                        } else {
                            self.log(format_args!(
                                "Crossing {:?} zone ({}, {}), not scrolling",
                                zone, pending.delta_x, pending.delta_y
                            ));
                            self.transition(GestureState::NormalCursor);
                        }
                    }
                }
                GestureState::Scrolling => {
                    let (dx, dy) = (primary.delta_x(), primary.delta_y());
                    if !self.zone_entered {
                        self.enter_zone(zone, dx, dy, events);
                    } else if zone != self.zone {
                        self.exit_zone(events);
                        self.enter_zone(zone, dx, dy, events);
                    } else {
                        events.push(OutputEvent::ZoneMove {
                            zone,
                            delta_x: dx,
                            delta_y: dy,
                        });
                    }
                }
                GestureState::CornerTap | GestureState::NormalCursor => {}
            }
            return;
        }

        // Outside every zone
        if self.state == GestureState::ScrollPending {
            self.pending = Pending::default();
            self.transition(GestureState::NormalCursor);
            return;
        }
        self.exit_zone(events);
        if matches!(self.state, GestureState::None | GestureState::Scrolling) {
            self.transition(GestureState::NormalCursor);
        }
    }

    fn enter_zone(&mut self, zone: ScrollZoneType, delta_x: i32, delta_y: i32, events: &mut Vec<OutputEvent>) {
        self.zone = zone;
        self.zone_entered = true;
        self.log(format_args!("Zone enter {:?} ({}, {})", zone, delta_x, delta_y));
        events.push(OutputEvent::ZoneEnter {
            zone,
            delta_x,
            delta_y,
        });
    }

    fn exit_zone(&mut self, events: &mut Vec<OutputEvent>) {
        if self.zone_entered {
            self.log(format_args!("Zone exit {:?}", self.zone));
            events.push(OutputEvent::ZoneExit { zone: self.zone });
        }
        self.zone_entered = false;
        self.zone = ScrollZoneType::None;
    }

    fn transition(&mut self, next: GestureState) {
        if self.state != next {
            self.log(format_args!("Gesture {} -> {}", self.state, next));
            self.state = next;
        }
    }

    fn log(&self, message: std::fmt::Arguments<'_>) {
        if self.debug {
            debug!("{}", message);
        } else {
            trace!("{}", message);
        }
    }
}
