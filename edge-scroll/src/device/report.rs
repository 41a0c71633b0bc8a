//! Input report decoding
//!
//! Turns one raw input report into the contacts it carries. Every field read
//! is bounds checked; a contact whose coordinates cannot be read is dropped
//! and the rest of the frame is kept.

use super::layout::{ButtonField, FieldLayout, ValueField};
use super::usage::{
    PAGE_DIGITIZER, PAGE_GENERIC_DESKTOP, USAGE_CONFIDENCE, USAGE_CONTACT_COUNT,
    USAGE_CONTACT_ID, USAGE_TIP_SWITCH, USAGE_X, USAGE_Y,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Upper bound on contacts decoded from a single report
pub const MAX_CONTACTS_PER_FRAME: usize = 10;

/// One contact as read from a report, before frame-to-frame tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContact {
    /// Hardware contact identifier (falls back to the slot index)
    pub id: u32,
    pub x: i32,
    pub y: i32,
    /// Tip switch
    pub touching: bool,
    /// False when the device suspects a palm or noise
    pub confidence: bool,
}

/// Fields making up one contact slot
#[derive(Debug, Clone, Copy)]
struct ContactFields {
    x: Option<ValueField>,
    y: Option<ValueField>,
    id: Option<ValueField>,
    tip: Option<ButtonField>,
    confidence: Option<ButtonField>,
}

impl ContactFields {
    fn for_collection(layout: &FieldLayout, collection: Option<u16>) -> Self {
        Self {
            x: layout.value(PAGE_GENERIC_DESKTOP, USAGE_X, collection).copied(),
            y: layout.value(PAGE_GENERIC_DESKTOP, USAGE_Y, collection).copied(),
            id: layout.value(PAGE_DIGITIZER, USAGE_CONTACT_ID, collection).copied(),
            tip: layout.button(PAGE_DIGITIZER, USAGE_TIP_SWITCH, collection).copied(),
            confidence: layout.button(PAGE_DIGITIZER, USAGE_CONFIDENCE, collection).copied(),
        }
    }
}

/// Decoder bound to one device's field layout
#[derive(Debug, Clone)]
pub struct ReportDecoder {
    slots: Vec<ContactFields>,
    contact_count: Option<ValueField>,
}

impl ReportDecoder {
    /// Precompute the per-slot field lookup for a layout
    pub fn new(layout: &FieldLayout) -> Self {
        let fingers = layout.finger_collections();
        let slots = if fingers.is_empty() {
            // Single-contact devices put X/Y directly in the application collection
            vec![ContactFields::for_collection(layout, None)]
        } else {
            fingers
                .into_iter()
                .take(MAX_CONTACTS_PER_FRAME)
                .map(|c| ContactFields::for_collection(layout, Some(c)))
                .collect()
        };

        let contact_count = layout
            .value(PAGE_DIGITIZER, USAGE_CONTACT_COUNT, None)
            .or_else(|| layout.first_value(PAGE_DIGITIZER, USAGE_CONTACT_COUNT))
            .copied();

        Self {
            slots,
            contact_count,
        }
    }

    /// Number of contact slots the layout describes
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Whether a report belongs to the collection this decoder reads.
    ///
    /// Reports carrying another report id (a mouse or vendor collection on
    /// the same device) are not frames of this surface.
    pub fn accepts(&self, report: &[u8]) -> bool {
        let report_id = self
            .contact_count
            .map(|f| f.report_id)
            .or_else(|| self.slots.iter().find_map(|s| s.x.map(|f| f.report_id)))
            .unwrap_or(0);
        report_id == 0 || report.first() == Some(&report_id)
    }

    /// Decode one report. Returns an empty list when nothing decodes.
    pub fn decode(&self, report: &[u8]) -> Vec<RawContact> {
        let count = match &self.contact_count {
            Some(field) => match field.read(report) {
                Ok(n) => usize::try_from(n).unwrap_or(0),
                Err(e) => {
                    debug!("Unreadable contact count: {}", e);
                    return Vec::new();
                }
            },
            None => 1,
        };
        let count = count.min(self.slots.len()).min(MAX_CONTACTS_PER_FRAME);

        let mut contacts = Vec::with_capacity(count);
        for (index, fields) in self.slots.iter().take(count).enumerate() {
            match decode_contact(report, index, fields) {
                Ok(contact) => {
                    // Duplicate ids within one frame keep the first sample
                    if contacts.iter().any(|c: &RawContact| c.id == contact.id) {
                        trace!("Duplicate contact id {} in slot {}", contact.id, index);
                        continue;
                    }
                    contacts.push(contact);
                }
                Err(e) => trace!("Dropping contact slot {}: {}", index, e),
            }
        }
        contacts
    }
}

fn decode_contact(report: &[u8], index: usize, fields: &ContactFields) -> crate::Result<RawContact> {
    let x = fields
        .x
        .as_ref()
        .ok_or_else(|| crate::Error::Decode("no X field".to_string()))?
        .read(report)?;
    let y = fields
        .y
        .as_ref()
        .ok_or_else(|| crate::Error::Decode("no Y field".to_string()))?
        .read(report)?;

    let id = match &fields.id {
        Some(field) => u32::try_from(field.read(report)?).unwrap_or(index as u32),
        None => index as u32,
    };

    // Hardware without tip/confidence usages is treated as touching and confident
    let touching = match &fields.tip {
        Some(field) => field.read(report).unwrap_or(true),
        None => true,
    };
    let confidence = match &fields.confidence {
        Some(field) => field.read(report).unwrap_or(true),
        None => true,
    };

    Ok(RawContact {
        id,
        x,
        y,
        touching,
        confidence,
    })
}
