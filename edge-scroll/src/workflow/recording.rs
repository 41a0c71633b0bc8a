//! Trace Recordings
//!
//! A trace captures one device's report descriptor and the raw reports it
//! produced, with timestamps, so a session can be replayed offline.

use crate::device::capabilities::{DescriptorQuery, DeviceInfo};
use crate::time::timebase::Timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// Current trace format version
pub const CURRENT_FORMAT_VERSION: &str = "1.0";

/// Trace metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceMetadata {
    /// Unique trace ID
    pub id: Uuid,
    /// Trace name
    pub name: String,
    /// Recording start time
    pub started_at: DateTime<Utc>,
    /// Recording end time
    pub ended_at: Option<DateTime<Utc>>,
    /// Total frame count
    pub frame_count: usize,
    /// Span from first to last frame in milliseconds
    pub duration_ms: u64,
    /// Version of the trace format
    pub format_version: String,
}

impl TraceMetadata {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }
}

impl Default for TraceMetadata {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: String::new(),
            started_at: Utc::now(),
            ended_at: None,
            frame_count: 0,
            duration_ms: 0,
            format_version: CURRENT_FORMAT_VERSION.to_string(),
        }
    }
}

/// One raw report with its arrival time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    pub timestamp: Timestamp,
    pub report: Vec<u8>,
}

/// A recorded device session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecording {
    pub metadata: TraceMetadata,
    pub device: DeviceInfo,
    /// Raw HID report descriptor
    pub descriptor: Vec<u8>,
    pub frames: Vec<TraceFrame>,
}

impl TraceRecording {
    /// Create an empty trace for a device
    pub fn new(name: impl Into<String>, device: DeviceInfo, descriptor: Vec<u8>) -> Self {
        Self {
            metadata: TraceMetadata::new(name.into()),
            device,
            descriptor,
            frames: Vec::new(),
        }
    }

    /// Append a report
    pub fn add_frame(&mut self, timestamp: Timestamp, report: &[u8]) {
        self.frames.push(TraceFrame {
            timestamp,
            report: report.to_vec(),
        });
    }

    /// Stamp end time, frame count and duration
    pub fn finalize(&mut self) {
        self.metadata.ended_at = Some(Utc::now());
        self.metadata.frame_count = self.frames.len();
        self.metadata.duration_ms = match (self.frames.first(), self.frames.last()) {
            (Some(first), Some(last)) => last.timestamp.duration_since(first.timestamp).as_millis(),
            _ => 0,
        };
    }

    /// Capability query that replays the recorded descriptor
    pub fn query(&self) -> DescriptorQuery {
        DescriptorQuery::new(
            self.device.vendor_id,
            self.device.product_id,
            self.device.name.clone(),
            self.descriptor.clone(),
        )
    }

    /// Save trace to a file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load trace from a file.
    ///
    /// Frames must be in non-decreasing timestamp order.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let trace: TraceRecording = serde_json::from_str(&content)?;
        if trace.metadata.format_version != CURRENT_FORMAT_VERSION {
            tracing::warn!(
                name = %trace.metadata.name,
                found = %trace.metadata.format_version,
                expected = CURRENT_FORMAT_VERSION,
                "Trace has different format version; some fields may use default values"
            );
        }
        if let Some(i) = trace
            .frames
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(crate::Error::Trace(format!(
                "frame {} goes back in time",
                i + 1
            )));
        }
        Ok(trace)
    }
}
