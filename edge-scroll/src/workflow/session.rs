//! Touch sessions
//!
//! A [`TouchSession`] wires one device's pipeline together: capability
//! resolution, report decoding, contact tracking, the zone state machine and
//! the scroll emitter. Sessions are independent; a host with two touch
//! surfaces runs two sessions.

use super::recording::TraceRecording;
use crate::app::config::Config;
use crate::capture::contacts::ContactTracker;
use crate::capture::intercept::InterceptHandle;
use crate::capture::sink::EventSink;
use crate::capture::types::{ContactSample, GestureState, OutputEvent};
use crate::device::capabilities::{CapabilityQuery, DeviceCapabilityResolver, DeviceInfo, TouchSurfaceDescriptor};
use crate::device::layout::FieldLayout;
use crate::device::report::ReportDecoder;
use crate::scroll::emitter::{ScrollEmitter, ScrollSettings};
use crate::time::timebase::Timestamp;
use crate::tracker::state_machine::ZoneStateMachine;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, trace, warn};

/// Frame counters for one session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    /// Reports handed to the session
    pub reports: u64,
    /// Reports that decoded to no contacts
    pub empty_reports: u64,
    /// Frames evaluated by the state machine
    pub frames: u64,
    /// Events delivered to the sink from the frame path
    pub events: u64,
}

/// One device's edge-scroll pipeline
pub struct TouchSession {
    config: Arc<RwLock<Config>>,
    resolver: DeviceCapabilityResolver,
    descriptor: TouchSurfaceDescriptor,
    decoder: Option<ReportDecoder>,
    contacts: ContactTracker,
    machine: ZoneStateMachine,
    emitter: ScrollEmitter,
    sink: Arc<dyn EventSink>,
    trace: Option<TraceRecording>,
    stats: SessionStats,
}

impl TouchSession {
    /// Create a session with no device attached
    pub fn new(config: Config, sink: Arc<dyn EventSink>) -> Self {
        Self::with_shared_config(Arc::new(RwLock::new(config)), sink)
    }

    /// Create a session reading a config shared with the host
    pub fn with_shared_config(config: Arc<RwLock<Config>>, sink: Arc<dyn EventSink>) -> Self {
        let descriptor = TouchSurfaceDescriptor::default();
        let settings = ScrollSettings::new(&config.read().scroll, &descriptor);
        Self {
            config,
            resolver: DeviceCapabilityResolver::new(),
            descriptor,
            decoder: None,
            contacts: ContactTracker::new(),
            machine: ZoneStateMachine::new(InterceptHandle::new()),
            emitter: ScrollEmitter::new(Arc::clone(&sink), settings),
            sink,
            trace: None,
            stats: SessionStats::default(),
        }
    }

    /// Resolve a device and start decoding its reports.
    ///
    /// On failure the session keeps its previous device, if any.
    pub fn attach_device<Q: CapabilityQuery + ?Sized>(&mut self, query: &Q) -> crate::Result<&TouchSurfaceDescriptor> {
        let (descriptor, layout) = self.resolver.resolve(query)?;
        self.install(descriptor, &layout);
        Ok(&self.descriptor)
    }

    /// Attach from an already-obtained layout
    pub fn attach_layout(&mut self, info: &DeviceInfo, layout: &FieldLayout) -> crate::Result<&TouchSurfaceDescriptor> {
        let descriptor = self.resolver.resolve_layout(info, layout)?;
        self.install(descriptor, layout);
        Ok(&self.descriptor)
    }

    fn install(&mut self, descriptor: TouchSurfaceDescriptor, layout: &FieldLayout) {
        self.release_gesture();
        let decoder = ReportDecoder::new(layout);
        info!(
            "Session attached to {:?} with {} contact slots",
            descriptor.name,
            decoder.slot_count()
        );
        self.decoder = Some(decoder);
        self.descriptor = descriptor;
    }

    /// Forget the device; reports are ignored until the next attach
    pub fn detach(&mut self) {
        self.release_gesture();
        self.decoder = None;
        self.descriptor = TouchSurfaceDescriptor::default();
        info!("Session detached");
    }

    fn release_gesture(&mut self) {
        for event in self.machine.reset() {
            self.sink.emit(event);
        }
        self.emitter.reset();
        self.contacts.clear();
    }

    /// Decode and evaluate one raw report. Returns the events this frame
    /// produced, which have already been delivered to the sink.
    pub fn process_report(&mut self, report: &[u8], now: Timestamp) -> Vec<OutputEvent> {
        self.stats.reports += 1;
        if let Some(trace) = self.trace.as_mut() {
            trace.add_frame(now, report);
        }

        let Some(decoder) = self.decoder.as_ref() else {
            trace!("Report ignored: no device attached");
            return Vec::new();
        };
        if !decoder.accepts(report) {
            self.stats.empty_reports += 1;
            trace!("Report of {} bytes belongs to another collection", report.len());
            return Vec::new();
        }
        let raw = decoder.decode(report);
        if raw.is_empty() {
            // Nothing readable counts as every contact lifted
            self.stats.empty_reports += 1;
            trace!("Report of {} bytes decoded no contacts", report.len());
        }

        let samples = self.contacts.update(&raw, now);
        self.process_samples(&samples, now)
    }

    /// Evaluate one frame of already-tracked samples
    pub fn process_samples(&mut self, samples: &[ContactSample], now: Timestamp) -> Vec<OutputEvent> {
        if !self.descriptor.is_initialized() {
            return Vec::new();
        }
        let config = self.config.read().clone();
        self.emitter
            .set_settings(ScrollSettings::new(&config.scroll, &self.descriptor));
        self.stats.frames += 1;

        let zone_events = self.machine.process(samples, &self.descriptor, &config, now);
        let mut out = Vec::with_capacity(zone_events.len() * 2);
        for event in zone_events {
            self.sink.emit(event);
            out.push(event);
            out.extend(self.emitter.handle(&event, now));
        }
        self.stats.events += out.len() as u64;
        out
    }

    /// Pointer-hook entry point: whether to swallow a pointer move
    pub fn on_pointer_move(&self, x: i32, y: i32, now: Timestamp) -> bool {
        let intercept = self.machine.intercept_handle().should_intercept(now);
        if intercept {
            trace!("Intercepted pointer move to ({}, {})", x, y);
        }
        intercept
    }

    /// Handle for a pointer hook running on another thread
    pub fn intercept_handle(&self) -> InterceptHandle {
        self.machine.intercept_handle()
    }

    pub fn state(&self) -> GestureState {
        self.machine.state()
    }

    pub fn is_in_scroll_zone(&self) -> bool {
        self.machine.is_in_scroll_zone()
    }

    pub fn descriptor(&self) -> &TouchSurfaceDescriptor {
        &self.descriptor
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_inertia_running(&self) -> bool {
        self.emitter.is_inertia_running()
    }

    /// Current configuration
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Shared configuration cell; writes apply from the next frame
    pub fn config_handle(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// Replace the configuration after validating it
    pub fn set_config(&self, config: Config) -> crate::Result<()> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Start capturing every report into a trace
    pub fn start_trace(&mut self, trace: TraceRecording) {
        if self.trace.is_some() {
            warn!("Replacing an unfinished trace");
        }
        self.trace = Some(trace);
    }

    /// Stop capturing and return the finalized trace
    pub fn finish_trace(&mut self) -> Option<TraceRecording> {
        let mut trace = self.trace.take()?;
        trace.finalize();
        Some(trace)
    }

    /// Attach the trace's device and feed every recorded frame.
    pub fn replay(&mut self, trace: &TraceRecording) -> crate::Result<Vec<OutputEvent>> {
        self.attach_device(&trace.query())?;
        let mut events = Vec::new();
        for frame in &trace.frames {
            events.extend(self.process_report(&frame.report, frame.timestamp));
        }
        Ok(events)
    }
}
