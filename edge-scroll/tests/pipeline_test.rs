//! Pipeline Integration Tests
//!
//! Drives full touch sessions with raw HID reports:
//! - Descriptor resolution and report decoding into zone events
//! - Scroll confirmation, crossing rejection and contact-count exits
//! - Corner taps end to end
//! - Intercept decisions seen from another thread
//! - Trace capture, save, load and replay

use edge_scroll::app::config::{Config, VerticalZonePosition};
use edge_scroll::capture::sink::{CollectingSink, RingBufferSink};
use edge_scroll::capture::types::{Corner, GestureState, OutputEvent, ScrollAxis, ScrollZoneType};
use edge_scroll::device::capabilities::{DescriptorQuery, DeviceInfo};
use edge_scroll::time::Timestamp;
use edge_scroll::workflow::{TouchSession, TraceRecording};
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Helper Functions
// ============================================================================

/// One finger collection: confidence, tip, 6 pad bits, 8-bit id, 16-bit X/Y
fn finger_collection() -> Vec<u8> {
    vec![
        0x09, 0x22, 0xA1, 0x02, // Finger, Collection (Logical)
        0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x01, //
        0x09, 0x47, 0x81, 0x02, // Confidence
        0x09, 0x42, 0x81, 0x02, // Tip Switch
        0x95, 0x06, 0x81, 0x03, // padding
        0x75, 0x08, 0x95, 0x01, 0x25, 0x0F, //
        0x09, 0x51, 0x81, 0x02, // Contact Identifier
        0x05, 0x01, 0x75, 0x10, //
        0x26, 0x70, 0x17, 0x09, 0x30, 0x81, 0x02, // X 0..6000
        0x26, 0xA0, 0x0F, 0x09, 0x31, 0x81, 0x02, // Y 0..4000
        0x05, 0x0D, 0xC0,
    ]
}

/// Two-finger precision touch pad, report id 1
fn touchpad_descriptor() -> Vec<u8> {
    let mut d = vec![0x05, 0x0D, 0x09, 0x05, 0xA1, 0x01, 0x85, 0x01];
    d.extend(finger_collection());
    d.extend(finger_collection());
    d.extend_from_slice(&[
        0x15, 0x00, 0x25, 0x05, 0x75, 0x08, 0x95, 0x01, //
        0x09, 0x54, 0x81, 0x02, // Contact Count
        0xC0,
    ]);
    d
}

#[derive(Clone, Copy)]
struct Contact {
    id: u8,
    x: u16,
    y: u16,
    tip: bool,
}

fn down(id: u8, x: u16, y: u16) -> Contact {
    Contact { id, x, y, tip: true }
}

fn up(id: u8, x: u16, y: u16) -> Contact {
    Contact { id, x, y, tip: false }
}

fn report(contacts: &[Contact]) -> Vec<u8> {
    let mut r = vec![0x01];
    for slot in 0..2 {
        match contacts.get(slot) {
            Some(c) => {
                r.push(0x01 | (u8::from(c.tip) << 1));
                r.push(c.id);
                r.extend_from_slice(&c.x.to_le_bytes());
                r.extend_from_slice(&c.y.to_le_bytes());
            }
            None => r.extend_from_slice(&[0; 6]),
        }
    }
    r.push(contacts.len() as u8);
    r
}

fn query() -> DescriptorQuery {
    DescriptorQuery::new(0x06cb, 0x00f9, "Integration Pad", touchpad_descriptor())
}

fn quiet_config() -> Config {
    let mut config = Config::default();
    config.scroll.inertia_enabled = false;
    config
}

/// Session on a 6000 × 4000 surface with a manual clock
struct Harness {
    session: TouchSession,
    sink: Arc<CollectingSink>,
    clock_ms: u64,
}

impl Harness {
    fn new(config: Config) -> Self {
        let sink = Arc::new(CollectingSink::new());
        let mut session = TouchSession::new(config, sink.clone());
        session.attach_device(&query()).unwrap();
        Self {
            session,
            sink,
            clock_ms: 1_000,
        }
    }

    fn frame_after(&mut self, ms: u64, contacts: &[Contact]) -> Vec<OutputEvent> {
        self.clock_ms += ms;
        self.session
            .process_report(&report(contacts), Timestamp::from_millis(self.clock_ms))
    }

    fn frame(&mut self, contacts: &[Contact]) -> Vec<OutputEvent> {
        self.frame_after(8, contacts)
    }

    fn state(&self) -> GestureState {
        self.session.state()
    }
}

fn wheel_total(events: &[OutputEvent], axis: ScrollAxis) -> i32 {
    events
        .iter()
        .filter_map(OutputEvent::wheel)
        .filter(|w| w.axis == axis)
        .map(|w| w.detents)
        .sum()
}

// ============================================================================
// Device attach
// ============================================================================

#[test]
fn test_attach_resolves_surface() {
    let sink = Arc::new(CollectingSink::new());
    let mut session = TouchSession::new(Config::default(), sink);
    let descriptor = session.attach_device(&query()).unwrap();

    assert_eq!(descriptor.logical_max_x, 6000);
    assert_eq!(descriptor.logical_max_y, 4000);
    assert_eq!(descriptor.vendor_id, 0x06cb);
    assert!(descriptor.is_initialized());
}

#[test]
fn test_non_touchpad_descriptor_rejected() {
    // Generic desktop mouse application collection
    let mouse = vec![0x05, 0x01, 0x09, 0x02, 0xA1, 0x01, 0xC0];
    let sink = Arc::new(CollectingSink::new());
    let mut session = TouchSession::new(Config::default(), sink.clone());

    let result = session.attach_device(&DescriptorQuery::new(1, 1, "Mouse", mouse));
    assert!(matches!(result, Err(edge_scroll::Error::Device(_))));
    assert!(session
        .process_report(&report(&[down(1, 5800, 2000)]), Timestamp::from_millis(1))
        .is_empty());
    assert!(sink.is_empty());
}

// ============================================================================
// Zone scrolling
// ============================================================================

#[test]
fn test_zone_moves_carry_exact_deltas() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 5800, 2000)]);
    h.frame(&[down(1, 5800, 1990)]);
    assert_eq!(h.state(), GestureState::Scrolling);

    let events = h.frame(&[down(1, 5803, 1953)]);
    assert_eq!(
        events[0],
        OutputEvent::ZoneMove {
            zone: ScrollZoneType::Vertical,
            delta_x: 3,
            delta_y: -37
        }
    );
}

#[test]
fn test_scroll_up_emits_positive_detents() {
    let mut h = Harness::new(quiet_config());
    let mut all = Vec::new();
    for y in (1200..=2000u16).rev().step_by(40) {
        all.extend(h.frame(&[down(1, 5800, y)]));
    }
    all.extend(h.frame(&[up(1, 5800, 1200)]));

    // 800 units of upward travel at ~26.7 units per detent
    let total = wheel_total(&all, ScrollAxis::Vertical);
    assert!((29..=30).contains(&total), "total {}", total);
    assert_eq!(all.last(), Some(&OutputEvent::ZoneExit { zone: ScrollZoneType::Vertical }));
    assert_eq!(h.sink.drain(), all);
}

#[test]
fn test_inverted_vertical_scroll() {
    let mut config = quiet_config();
    config.scroll.invert_vertical = true;
    let mut h = Harness::new(config);
    h.frame(&[down(1, 5800, 2000)]);
    let events = h.frame(&[down(1, 5800, 1900)]);
    assert!(wheel_total(&events, ScrollAxis::Vertical) < 0);
}

#[test]
fn test_single_zone_frame_then_exit_is_cursor() {
    let mut h = Harness::new(quiet_config());
    assert!(h.frame(&[down(1, 5800, 2000)]).is_empty());
    assert_eq!(h.state(), GestureState::ScrollPending);

    assert!(h.frame(&[down(1, 5000, 2000)]).is_empty());
    assert_eq!(h.state(), GestureState::NormalCursor);

    // Returning to the zone does not resume scrolling before lift
    assert!(h.frame(&[down(1, 5800, 1900)]).is_empty());
    assert!(h.frame(&[down(1, 5800, 1800)]).is_empty());
    assert!(h.sink.is_empty());
}

#[test]
fn test_crossing_motion_rejected() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 5600, 2000)]);
    let events = h.frame(&[down(1, 5640, 2005)]);

    assert!(events.is_empty());
    assert_eq!(h.state(), GestureState::NormalCursor);
    assert_eq!(wheel_total(&h.sink.drain(), ScrollAxis::Vertical), 0);
}

#[test]
fn test_second_finger_exits_zone() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 5800, 2000)]);
    h.frame(&[down(1, 5800, 1950)]);
    assert!(h.session.is_in_scroll_zone());

    let events = h.frame(&[down(1, 5800, 1900), down(2, 3000, 2000)]);
    assert_eq!(events, vec![OutputEvent::ZoneExit { zone: ScrollZoneType::Vertical }]);
    assert_eq!(h.state(), GestureState::NormalCursor);

    // Still a cursor after the second finger lifts
    assert!(h.frame(&[down(1, 5800, 1850)]).is_empty());
    assert_eq!(h.state(), GestureState::NormalCursor);

    h.frame(&[up(1, 5800, 1850)]);
    assert_eq!(h.state(), GestureState::None);
}

#[test]
fn test_left_zone_from_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let mut config = quiet_config();
    config.zones.width_percent = 15.0;
    config.zones.position = VerticalZonePosition::Left;
    config.save(&path).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.zones.position, VerticalZonePosition::Left);

    let mut h = Harness::new(config);
    h.frame(&[down(1, 800, 2000)]);
    let events = h.frame(&[down(1, 800, 2080)]);
    assert!(matches!(
        events.first(),
        Some(OutputEvent::ZoneEnter { zone: ScrollZoneType::Vertical, .. })
    ));
    assert!(wheel_total(&events, ScrollAxis::Vertical) < 0);
}

#[test]
fn test_config_change_applies_next_frame() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 5800, 2000)]);
    let slow = h.frame(&[down(1, 5800, 1940)]);

    let mut config = h.session.config();
    config.scroll.speed = 2.0;
    h.session.set_config(config).unwrap();
    let fast = h.frame(&[down(1, 5800, 1880)]);

    assert_eq!(wheel_total(&slow, ScrollAxis::Vertical), 2);
    assert!(wheel_total(&fast, ScrollAxis::Vertical) >= 4);
}

// ============================================================================
// Corner taps
// ============================================================================

fn tap_config() -> Config {
    let mut config = quiet_config();
    config.corner_tap.enabled = true;
    config
}

#[test]
fn test_corner_tap_end_to_end() {
    let mut h = Harness::new(tap_config());
    // Start at (2 %, 3 %), lift at (4 %, 5 %) after 150 ms
    h.frame(&[down(1, 120, 120)]);
    assert_eq!(h.state(), GestureState::CornerTap);
    h.frame_after(75, &[down(1, 180, 160)]);
    let events = h.frame_after(75, &[up(1, 240, 200)]);

    assert_eq!(
        events,
        vec![OutputEvent::CornerTap {
            corner: Corner::TopLeft,
            x: 240,
            y: 200
        }]
    );
    assert_eq!(h.state(), GestureState::None);
}

#[test]
fn test_held_corner_touch_is_not_a_tap() {
    let mut h = Harness::new(tap_config());
    h.frame(&[down(1, 5900, 3900)]);
    let events = h.frame_after(400, &[up(1, 5900, 3900)]);
    assert!(events.is_empty());
    assert!(h.sink.is_empty());
}

#[test]
fn test_no_corner_tap_after_scrolling_into_corner() {
    let mut h = Harness::new(tap_config());
    h.frame(&[down(1, 5800, 3000)]);
    h.frame(&[down(1, 5800, 3300)]);
    assert_eq!(h.state(), GestureState::Scrolling);
    h.frame(&[down(1, 5900, 3900)]);

    let events = h.frame(&[up(1, 5900, 3900)]);
    assert_eq!(events, vec![OutputEvent::ZoneExit { zone: ScrollZoneType::Vertical }]);
    assert!(!h
        .sink
        .drain()
        .iter()
        .any(|e| matches!(e, OutputEvent::CornerTap { .. })));
}

#[test]
fn test_corner_is_scroll_zone_when_taps_disabled() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 5900, 3900)]);
    let events = h.frame(&[down(1, 5900, 3800)]);
    assert_eq!(h.state(), GestureState::Scrolling);
    assert!(wheel_total(&events, ScrollAxis::Vertical) > 0);
}

// ============================================================================
// Intercept decision
// ============================================================================

#[test]
fn test_intercept_handle_across_threads() {
    let mut h = Harness::new(quiet_config());
    let handle = h.session.intercept_handle();

    h.frame(&[down(1, 5800, 2000)]);
    h.frame(&[down(1, 5800, 1950)]);
    let frame_time = h.clock_ms;

    let decisions = std::thread::spawn(move || {
        (
            handle.should_intercept(Timestamp::from_millis(frame_time + 20)),
            handle.should_intercept(Timestamp::from_millis(frame_time + 150)),
        )
    })
    .join()
    .unwrap();
    assert_eq!(decisions, (true, false));

    h.frame(&[up(1, 5800, 1950)]);
    assert!(!h.session.on_pointer_move(0, 0, Timestamp::from_millis(h.clock_ms + 1)));
}

#[test]
fn test_cursor_movement_not_intercepted() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 3000, 2000)]);
    h.frame(&[down(1, 3050, 2000)]);
    let now = Timestamp::from_millis(h.clock_ms + 5);

    assert_eq!(h.state(), GestureState::NormalCursor);
    assert!(h.session.intercept_handle().is_touchpad_pointer_move(now));
    assert!(!h.session.on_pointer_move(100, 100, now));
}

// ============================================================================
// Traces and sinks
// ============================================================================

#[test]
fn test_trace_save_load_replay() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("traces").join("swipe.json");

    let mut h = Harness::new(quiet_config());
    let info = DeviceInfo {
        vendor_id: 0x06cb,
        product_id: 0x00f9,
        name: "Integration Pad".to_string(),
    };
    h.session
        .start_trace(TraceRecording::new("swipe", info, touchpad_descriptor()));

    let mut live = Vec::new();
    for y in [2000u16, 1960, 1910, 1850, 1800] {
        live.extend(h.frame(&[down(1, 5800, y)]));
    }
    live.extend(h.frame(&[up(1, 5800, 1800)]));
    let trace = h.session.finish_trace().unwrap();
    trace.save(&path).unwrap();

    let loaded = TraceRecording::load(&path).unwrap();
    assert_eq!(loaded.metadata.frame_count, 6);
    assert_eq!(loaded.metadata.duration_ms, 40);

    let sink = Arc::new(CollectingSink::new());
    let mut replay = TouchSession::new(quiet_config(), sink.clone());
    let replayed = replay.replay(&loaded).unwrap();
    assert_eq!(replayed, live);
    assert_eq!(sink.drain(), live);
}

#[test]
fn test_ring_buffer_sink_preserves_order() {
    let (sink, mut consumer) = RingBufferSink::with_capacity(64);
    let mut session = TouchSession::new(quiet_config(), Arc::new(sink));
    session.attach_device(&query()).unwrap();

    let mut expected = Vec::new();
    for (i, y) in [2000u16, 1950, 1900, 1850].iter().enumerate() {
        let now = Timestamp::from_millis(i as u64 * 8);
        expected.extend(session.process_report(&report(&[down(1, 5800, *y)]), now));
    }

    let slots = consumer.pop_batch(64);
    let events: Vec<OutputEvent> = slots.iter().map(|s| s.event).collect();
    assert_eq!(events, expected);
    assert!(slots.windows(2).all(|w| w[1].sequence == w[0].sequence + 1));
}

#[test]
fn test_output_events_serialize_as_tagged_json() {
    let mut h = Harness::new(quiet_config());
    h.frame(&[down(1, 5800, 2000)]);
    let events = h.frame(&[down(1, 5800, 1940)]);

    let json = serde_json::to_string(&events[0]).unwrap();
    assert!(json.contains("\"type\":\"zone_enter\""), "{}", json);
    assert!(json.contains("\"delta_y\":-60"), "{}", json);
}
