//! Scroll emitter
//!
//! Turns zone movement into wheel detents. Each axis has its own
//! accumulator; whole detents are extracted once the accumulator passes half
//! a detent and the remainder is carried forward. The inertia thread feeds
//! the same accumulators, so they live behind a shared mutex.

use super::inertia::{InertiaState, InertiaTask};
use super::velocity::VelocityTracker;
use crate::app::config::ScrollConfig;
use crate::capture::sink::EventSink;
use crate::capture::types::{OutputEvent, ScrollAxis, ScrollZoneType, WheelCommand};
use crate::device::capabilities::TouchSurfaceDescriptor;
use crate::time::timebase::Timestamp;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Raw units per detent on the reference surface at speed × sensitivity = 1
pub const BASE_UNITS_PER_DETENT: f64 = 40.0;

/// Surface height the base detent size is calibrated for
pub const REFERENCE_HEIGHT: f64 = 6000.0;

/// Smallest accumulator magnitude that can emit
pub const MIN_EMIT_THRESHOLD: f64 = 1.0;

/// Fraction of a detent the accumulator must reach before emitting
pub const EMIT_FRACTION: f64 = 0.5;

/// Raw travel per detent, floored at one unit
pub fn detent_size(surface_height: f64, speed: f64, sensitivity: f64) -> f64 {
    let gain = speed * sensitivity;
    if !gain.is_finite() || gain <= 0.0 || !surface_height.is_finite() {
        return BASE_UNITS_PER_DETENT;
    }
    (BASE_UNITS_PER_DETENT * (surface_height / REFERENCE_HEIGHT) / gain).max(1.0)
}

/// Add `amount` to `acc` and extract whole detents once past the threshold.
///
/// Returns the detents extracted (0 below the threshold). The remainder left
/// in `acc` is `acc − detents × detent`.
pub fn accumulate(acc: &mut f64, amount: f64, detent: f64) -> i32 {
    *acc += amount;
    let threshold = MIN_EMIT_THRESHOLD.max(detent * EMIT_FRACTION);
    if acc.abs() < threshold {
        return 0;
    }
    let detents = (*acc / detent).round();
    if detents == 0.0 {
        return 0;
    }
    *acc -= detents * detent;
    detents.clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Snapshot of everything the emitter needs from config and device
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSettings {
    pub detent_size: f64,
    pub invert_vertical: bool,
    pub invert_horizontal: bool,
    pub inertia_enabled: bool,
}

impl ScrollSettings {
    pub fn new(config: &ScrollConfig, descriptor: &TouchSurfaceDescriptor) -> Self {
        Self {
            detent_size: detent_size(descriptor.height(), config.speed, config.sensitivity),
            invert_vertical: config.invert_vertical,
            invert_horizontal: config.invert_horizontal,
            inertia_enabled: config.inertia_enabled,
        }
    }

    /// Signed contribution of a movement to an axis accumulator.
    ///
    /// Vertical: finger moving up (negative Y) scrolls up (positive).
    /// Horizontal: finger moving right scrolls right.
    pub fn contribution(&self, axis: ScrollAxis, delta_x: i32, delta_y: i32) -> f64 {
        match axis {
            ScrollAxis::Vertical => {
                let v = -f64::from(delta_y);
                if self.invert_vertical { -v } else { v }
            }
            ScrollAxis::Horizontal => {
                let h = f64::from(delta_x);
                if self.invert_horizontal { -h } else { h }
            }
        }
    }
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self::new(&ScrollConfig::default(), &TouchSurfaceDescriptor::from_ranges(0, 6000, 0, 6000))
    }
}

/// Per-axis accumulators shared with the inertia thread
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Accumulators {
    pub vertical: f64,
    pub horizontal: f64,
}

impl Accumulators {
    pub fn get(&self, axis: ScrollAxis) -> f64 {
        match axis {
            ScrollAxis::Vertical => self.vertical,
            ScrollAxis::Horizontal => self.horizontal,
        }
    }

    fn get_mut(&mut self, axis: ScrollAxis) -> &mut f64 {
        match axis {
            ScrollAxis::Vertical => &mut self.vertical,
            ScrollAxis::Horizontal => &mut self.horizontal,
        }
    }
}

/// Converts zone events into wheel commands
pub struct ScrollEmitter {
    sink: Arc<dyn EventSink>,
    settings: ScrollSettings,
    accumulators: Arc<Mutex<Accumulators>>,
    vertical_velocity: VelocityTracker,
    horizontal_velocity: VelocityTracker,
    inertia: Option<InertiaTask>,
}

impl ScrollEmitter {
    pub fn new(sink: Arc<dyn EventSink>, settings: ScrollSettings) -> Self {
        Self {
            sink,
            settings,
            accumulators: Arc::new(Mutex::new(Accumulators::default())),
            vertical_velocity: VelocityTracker::new(),
            horizontal_velocity: VelocityTracker::new(),
            inertia: None,
        }
    }

    pub fn settings(&self) -> ScrollSettings {
        self.settings
    }

    /// Replace the settings snapshot; a running inertia loop keeps its own
    pub fn set_settings(&mut self, settings: ScrollSettings) {
        self.settings = settings;
    }

    /// Current accumulator values
    pub fn accumulators(&self) -> Accumulators {
        *self.accumulators.lock()
    }

    /// Feed one pipeline event; returns the wheel events it produced.
    pub fn handle(&mut self, event: &OutputEvent, now: Timestamp) -> Vec<OutputEvent> {
        match *event {
            OutputEvent::ZoneEnter {
                zone,
                delta_x,
                delta_y,
            } => {
                let Some(axis) = zone.axis() else {
                    return Vec::new();
                };
                self.stop_inertia();
                *self.accumulators.lock().get_mut(axis) = 0.0;
                self.velocity_mut(axis).clear();
                self.contribute(axis, delta_x, delta_y, now)
            }
            OutputEvent::ZoneMove {
                zone,
                delta_x,
                delta_y,
            } => {
                let Some(axis) = zone.axis() else {
                    return Vec::new();
                };
                self.stop_inertia();
                self.contribute(axis, delta_x, delta_y, now)
            }
            OutputEvent::ZoneExit { zone } => {
                self.on_exit(zone, now);
                Vec::new()
            }
            OutputEvent::CornerTap { .. } | OutputEvent::Wheel(_) => Vec::new(),
        }
    }

    /// Whether an inertia loop is ticking
    pub fn is_inertia_running(&self) -> bool {
        self.inertia.as_ref().is_some_and(InertiaTask::is_running)
    }

    /// Stop any inertia loop, waiting for its last tick
    pub fn stop_inertia(&mut self) {
        if let Some(mut task) = self.inertia.take() {
            if task.is_running() {
                debug!("Manual scroll pre-empted inertia");
            }
            task.stop();
        }
    }

    /// Stop inertia and drop all accumulated travel
    pub fn reset(&mut self) {
        self.stop_inertia();
        *self.accumulators.lock() = Accumulators::default();
        self.vertical_velocity.clear();
        self.horizontal_velocity.clear();
    }

    fn velocity_mut(&mut self, axis: ScrollAxis) -> &mut VelocityTracker {
        match axis {
            ScrollAxis::Vertical => &mut self.vertical_velocity,
            ScrollAxis::Horizontal => &mut self.horizontal_velocity,
        }
    }

    fn contribute(&mut self, axis: ScrollAxis, delta_x: i32, delta_y: i32, now: Timestamp) -> Vec<OutputEvent> {
        let amount = self.settings.contribution(axis, delta_x, delta_y);
        self.velocity_mut(axis).record(now, amount);

        let detents = {
            let mut acc = self.accumulators.lock();
            accumulate(acc.get_mut(axis), amount, self.settings.detent_size)
        };
        if detents == 0 {
            return Vec::new();
        }

        let event = OutputEvent::Wheel(WheelCommand::new(axis, detents));
        trace!("Wheel {:?} {} detents", axis, detents);
        self.sink.emit(event);
        vec![event]
    }

    fn on_exit(&mut self, zone: ScrollZoneType, now: Timestamp) {
        let Some(axis) = zone.axis() else {
            return;
        };
        let velocity = self.velocity_mut(axis).velocity(now);
        self.vertical_velocity.clear();
        self.horizontal_velocity.clear();

        if !self.settings.inertia_enabled {
            return;
        }
        let Some(state) = InertiaState::start(velocity) else {
            trace!("Exit velocity {:.0} units/s too slow for inertia", velocity);
            return;
        };

        self.stop_inertia();
        let accumulators = Arc::clone(&self.accumulators);
        let sink = Arc::clone(&self.sink);
        let detent = self.settings.detent_size;
        let spawned = InertiaTask::spawn(state, move |distance| {
            let detents = accumulate(accumulators.lock().get_mut(axis), distance, detent);
            if detents != 0 {
                sink.emit(OutputEvent::Wheel(WheelCommand::new(axis, detents)));
            }
        });
        match spawned {
            Ok(task) => self.inertia = Some(task),
            Err(e) => warn!("Inertia unavailable: {}", e),
        }
    }
}

impl Drop for ScrollEmitter {
    fn drop(&mut self) {
        self.stop_inertia();
    }
}
