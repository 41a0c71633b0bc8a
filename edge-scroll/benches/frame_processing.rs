//! Criterion benchmarks for the per-frame hot path
//!
//! Covers: descriptor parsing, report decoding, full session frames and
//! output ring buffer push/pop.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use edge_scroll::app::config::Config;
use edge_scroll::capture::ring_buffer::EventRingBuffer;
use edge_scroll::capture::sink::NullSink;
use edge_scroll::capture::types::{OutputEvent, ScrollAxis, WheelCommand};
use edge_scroll::device::capabilities::DescriptorQuery;
use edge_scroll::device::layout::FieldLayout;
use edge_scroll::device::report::ReportDecoder;
use edge_scroll::time::Timestamp;
use edge_scroll::workflow::TouchSession;
use std::sync::Arc;

const FINGERS: usize = 5;

fn finger_collection() -> Vec<u8> {
    vec![
        0x09, 0x22, 0xA1, 0x02, //
        0x15, 0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x01, //
        0x09, 0x47, 0x81, 0x02, //
        0x09, 0x42, 0x81, 0x02, //
        0x95, 0x06, 0x81, 0x03, //
        0x75, 0x08, 0x95, 0x01, 0x25, 0x0F, //
        0x09, 0x51, 0x81, 0x02, //
        0x05, 0x01, 0x75, 0x10, //
        0x26, 0x70, 0x17, 0x09, 0x30, 0x81, 0x02, //
        0x26, 0xA0, 0x0F, 0x09, 0x31, 0x81, 0x02, //
        0x05, 0x0D, 0xC0,
    ]
}

fn touchpad_descriptor() -> Vec<u8> {
    let mut d = vec![0x05, 0x0D, 0x09, 0x05, 0xA1, 0x01, 0x85, 0x01];
    for _ in 0..FINGERS {
        d.extend(finger_collection());
    }
    d.extend_from_slice(&[
        0x15, 0x00, 0x25, 0x05, 0x75, 0x08, 0x95, 0x01, 0x09, 0x54, 0x81, 0x02, 0xC0,
    ]);
    d
}

fn report(contacts: &[(u8, u16, u16)]) -> Vec<u8> {
    let mut r = vec![0x01];
    for slot in 0..FINGERS {
        match contacts.get(slot) {
            Some(&(id, x, y)) => {
                r.extend_from_slice(&[0x03, id]);
                r.extend_from_slice(&x.to_le_bytes());
                r.extend_from_slice(&y.to_le_bytes());
            }
            None => r.extend_from_slice(&[0; 6]),
        }
    }
    r.push(contacts.len() as u8);
    r
}

// ---------------------------------------------------------------------------
// Device benchmarks
// ---------------------------------------------------------------------------

fn bench_descriptor_parse(c: &mut Criterion) {
    let descriptor = touchpad_descriptor();
    c.bench_function("descriptor_parse", |b| {
        b.iter(|| FieldLayout::parse_descriptor(black_box(&descriptor)))
    });
}

fn bench_report_decode(c: &mut Criterion) {
    let layout = FieldLayout::parse_descriptor(&touchpad_descriptor()).expect("fixture descriptor");
    let decoder = ReportDecoder::new(&layout);

    let mut group = c.benchmark_group("report_decode");
    for count in [1usize, 3, 5] {
        let contacts: Vec<_> = (0..count)
            .map(|i| (i as u8, 1000 + 800 * i as u16, 2000))
            .collect();
        let bytes = report(&contacts);
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| decoder.decode(black_box(bytes)))
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Session benchmarks
// ---------------------------------------------------------------------------

fn bench_session_scroll_frame(c: &mut Criterion) {
    let mut config = Config::default();
    config.scroll.inertia_enabled = false;
    let mut session = TouchSession::new(config, Arc::new(NullSink));
    session
        .attach_device(&DescriptorQuery::new(1, 1, "Bench Pad", touchpad_descriptor()))
        .expect("fixture descriptor");

    let frames: Vec<Vec<u8>> = (0..64u16).map(|i| report(&[(1, 5800, 3500 - i * 40)])).collect();
    let lift = {
        let mut r = report(&[(1, 5800, 940)]);
        r[1] = 0x01;
        r
    };

    c.bench_function("session_scroll_gesture", |b| {
        let mut clock = 0u64;
        b.iter(|| {
            for frame in &frames {
                clock += 8;
                black_box(session.process_report(frame, Timestamp::from_millis(clock)));
            }
            clock += 8;
            session.process_report(&lift, Timestamp::from_millis(clock))
        })
    });
}

// ---------------------------------------------------------------------------
// Ring buffer benchmarks
// ---------------------------------------------------------------------------

fn bench_ring_buffer_push_pop(c: &mut Criterion) {
    c.bench_function("ring_buffer_push_pop", |b| {
        let (mut producer, mut consumer) = EventRingBuffer::with_capacity(8192).split();
        let event = OutputEvent::Wheel(WheelCommand::new(ScrollAxis::Vertical, 1));
        b.iter(|| {
            producer.push(black_box(event));
            consumer.pop()
        })
    });
}

criterion_group!(
    benches,
    bench_descriptor_parse,
    bench_report_decode,
    bench_session_scroll_frame,
    bench_ring_buffer_push_pop,
);
criterion_main!(benches);
