//! HID field layout
//!
//! A `FieldLayout` is the parsed description of where each usage lives inside
//! an input report: report id, bit offset, bit size, logical range and the
//! finger collection the field belongs to. Hosts that already have the OS
//! capability lists can build one directly; everyone else parses the raw
//! report descriptor with [`FieldLayout::parse_descriptor`].

use super::usage::{
    PAGE_BUTTON, PAGE_DIGITIZER, USAGE_CONFIDENCE, USAGE_FINGER, USAGE_TIP_SWITCH,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, trace};

/// Largest input report the parser accepts, in bits
pub const MAX_REPORT_BITS: u32 = 8 * u16::MAX as u32;

/// A multi-bit value field (coordinates, contact id, contact count, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueField {
    /// Report id this field belongs to (0 = unnumbered reports)
    pub report_id: u8,
    pub usage_page: u16,
    pub usage: u16,
    /// Bit offset inside the report payload (the report id byte excluded)
    pub bit_offset: u32,
    /// Field width in bits (1..=32)
    pub bit_size: u32,
    pub logical_min: i32,
    pub logical_max: i32,
    /// Index of the enclosing finger collection, if any
    pub collection: Option<u16>,
}

/// A single-bit flag field (tip switch, confidence, buttons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonField {
    pub report_id: u8,
    pub usage_page: u16,
    pub usage: u16,
    pub bit_offset: u32,
    pub collection: Option<u16>,
}

/// Parsed field layout of one device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldLayout {
    /// Usage page of the top-level application collection
    pub top_usage_page: u16,
    /// Usage of the top-level application collection
    pub top_usage: u16,
    /// Value fields in descriptor order
    pub values: Vec<ValueField>,
    /// Flag fields in descriptor order
    pub buttons: Vec<ButtonField>,
}

impl FieldLayout {
    /// Create an empty layout for a top-level collection
    pub fn new(top_usage_page: u16, top_usage: u16) -> Self {
        Self {
            top_usage_page,
            top_usage,
            values: Vec::new(),
            buttons: Vec::new(),
        }
    }

    /// Append a value field
    pub fn with_value(mut self, field: ValueField) -> Self {
        self.values.push(field);
        self
    }

    /// Append a flag field
    pub fn with_button(mut self, field: ButtonField) -> Self {
        self.buttons.push(field);
        self
    }

    /// First value field matching usage and collection
    pub fn value(&self, usage_page: u16, usage: u16, collection: Option<u16>) -> Option<&ValueField> {
        self.values
            .iter()
            .find(|f| f.usage_page == usage_page && f.usage == usage && f.collection == collection)
    }

    /// First value field matching usage, in any collection
    pub fn first_value(&self, usage_page: u16, usage: u16) -> Option<&ValueField> {
        self.values
            .iter()
            .find(|f| f.usage_page == usage_page && f.usage == usage)
    }

    /// First flag field matching usage and collection
    pub fn button(&self, usage_page: u16, usage: u16, collection: Option<u16>) -> Option<&ButtonField> {
        self.buttons
            .iter()
            .find(|f| f.usage_page == usage_page && f.usage == usage && f.collection == collection)
    }

    /// Finger collection indices, in ascending order
    pub fn finger_collections(&self) -> Vec<u16> {
        let set: BTreeSet<u16> = self
            .values
            .iter()
            .filter_map(|f| f.collection)
            .chain(self.buttons.iter().filter_map(|f| f.collection))
            .collect();
        set.into_iter().collect()
    }

    /// Parse a raw HID report descriptor.
    ///
    /// Only Input main items produce fields. Array inputs and constant
    /// padding advance the bit cursor without producing fields.
    pub fn parse_descriptor(descriptor: &[u8]) -> crate::Result<Self> {
        DescriptorParser::default().parse(descriptor)
    }
}

impl ValueField {
    /// Read the field from a raw report.
    pub fn read(&self, report: &[u8]) -> crate::Result<i32> {
        let payload = payload_for(report, self.report_id)?;
        let raw = extract_bits(payload, self.bit_offset, self.bit_size).ok_or_else(|| {
            crate::Error::Decode(format!(
                "usage {:#04x}:{:#04x} at bit {}+{} exceeds {}-byte payload",
                self.usage_page,
                self.usage,
                self.bit_offset,
                self.bit_size,
                payload.len()
            ))
        })?;

        if self.logical_min < 0 {
            Ok(sign_extend(raw, self.bit_size))
        } else {
            Ok(i32::try_from(raw).unwrap_or(i32::MAX))
        }
    }
}

impl ButtonField {
    /// Read the flag from a raw report.
    pub fn read(&self, report: &[u8]) -> crate::Result<bool> {
        let payload = payload_for(report, self.report_id)?;
        extract_bits(payload, self.bit_offset, 1)
            .map(|bit| bit != 0)
            .ok_or_else(|| {
                crate::Error::Decode(format!(
                    "flag {:#04x}:{:#04x} at bit {} exceeds {}-byte payload",
                    self.usage_page,
                    self.usage,
                    self.bit_offset,
                    payload.len()
                ))
            })
    }
}

/// Strip the report id byte, checking that it matches.
fn payload_for(report: &[u8], report_id: u8) -> crate::Result<&[u8]> {
    if report_id == 0 {
        return Ok(report);
    }
    match report.split_first() {
        Some((&id, rest)) if id == report_id => Ok(rest),
        Some((&id, _)) => Err(crate::Error::Decode(format!(
            "report id {} does not match field report id {}",
            id, report_id
        ))),
        None => Err(crate::Error::Decode("empty report".to_string())),
    }
}

/// Little-endian bit extraction with bounds checking.
fn extract_bits(payload: &[u8], bit_offset: u32, bit_size: u32) -> Option<u32> {
    if bit_size == 0 || bit_size > 32 {
        return None;
    }
    let end = u64::from(bit_offset) + u64::from(bit_size);
    if end > payload.len() as u64 * 8 {
        return None;
    }

    let mut value: u64 = 0;
    for i in 0..bit_size {
        let bit = bit_offset + i;
        let byte = *payload.get((bit / 8) as usize)?;
        if (byte >> (bit % 8)) & 1 == 1 {
            value |= 1 << i;
        }
    }
    Some(value as u32)
}

fn sign_extend(raw: u32, bit_size: u32) -> i32 {
    if bit_size >= 32 {
        return raw as i32;
    }
    let sign_bit = 1u32 << (bit_size - 1);
    if raw & sign_bit != 0 {
        (i64::from(raw) - (1i64 << bit_size)) as i32
    } else {
        raw as i32
    }
}

/// Global item state, saved and restored by Push/Pop
#[derive(Debug, Clone, Copy, Default)]
struct GlobalState {
    usage_page: u16,
    logical_min: i32,
    logical_max: i32,
    report_size: u32,
    report_count: u32,
    report_id: u8,
}

/// Local item state, cleared after every main item
#[derive(Debug, Default)]
struct LocalState {
    usages: Vec<(u16, u16)>,
    usage_min: Option<(u16, u16)>,
    usage_max: Option<(u16, u16)>,
}

impl LocalState {
    /// Usage for the i-th report slot of a variable main item
    fn usage_at(&self, index: u32, page: u16) -> Option<(u16, u16)> {
        if let Some(&usage) = self.usages.get(index as usize) {
            return Some(usage);
        }
        if let (Some((min_page, min)), Some((_, max))) = (self.usage_min, self.usage_max) {
            let usage = min.saturating_add(index as u16).min(max);
            return Some((if min_page == 0 { page } else { min_page }, usage));
        }
        self.usages.last().copied()
    }
}

#[derive(Debug, Default)]
struct DescriptorParser {
    global: GlobalState,
    global_stack: Vec<GlobalState>,
    local: LocalState,
    /// Finger collection index for each open collection
    collections: Vec<Option<u16>>,
    next_finger: u16,
    /// Bit cursor per report id
    cursors: HashMap<u8, u32>,
    layout: FieldLayout,
    seen_application: bool,
}

impl DescriptorParser {
    fn parse(mut self, descriptor: &[u8]) -> crate::Result<FieldLayout> {
        let mut i = 0usize;
        while i < descriptor.len() {
            let header = descriptor[i];

            // Long item: 0xFE, size, tag, data...
            if header == 0xFE {
                let size = *descriptor
                    .get(i + 1)
                    .ok_or_else(|| crate::Error::Device("truncated long item".to_string()))?;
                i += 3 + size as usize;
                continue;
            }

            let size = match header & 0x03 {
                3 => 4,
                n => n as usize,
            };
            let item_type = (header >> 2) & 0x03;
            let tag = header >> 4;

            let data = descriptor.get(i + 1..i + 1 + size).ok_or_else(|| {
                crate::Error::Device(format!("truncated descriptor item at byte {}", i))
            })?;
            let unsigned = read_unsigned(data);
            let signed = read_signed(data);

            match item_type {
                0 => self.main_item(tag, unsigned)?,
                1 => self.global_item(tag, unsigned, signed)?,
                2 => self.local_item(tag, unsigned, size),
                _ => trace!("reserved item type at byte {}", i),
            }

            i += 1 + size;
        }

        if !self.collections.is_empty() {
            debug!("descriptor ended with {} open collections", self.collections.len());
        }

        Ok(self.layout)
    }

    fn main_item(&mut self, tag: u8, data: u32) -> crate::Result<()> {
        match tag {
            // Input
            0x8 => self.input_item(data)?,
            // Collection
            0xA => {
                let usage = self.local.usages.first().copied();
                let collection_type = data & 0xFF;

                if !self.seen_application && self.collections.is_empty() {
                    if let Some((page, usage)) = usage {
                        self.layout.top_usage_page = page;
                        self.layout.top_usage = usage;
                    }
                    self.seen_application = true;
                }

                let is_finger = collection_type == 0x02
                    && usage == Some((PAGE_DIGITIZER, USAGE_FINGER));
                let finger = if is_finger {
                    let index = self.next_finger;
                    self.next_finger = index.checked_add(1).ok_or_else(|| {
                        crate::Error::Device("too many finger collections".to_string())
                    })?;
                    Some(index)
                } else {
                    // Nested collections inherit the finger they sit in
                    self.collections.last().copied().flatten()
                };
                self.collections.push(finger);
            }
            // End Collection
            0xC => {
                self.collections.pop();
            }
            // Output and Feature reports never carry contact data
            _ => {}
        }
        self.local = LocalState::default();
        Ok(())
    }

    fn input_item(&mut self, flags: u32) -> crate::Result<()> {
        let report_id = self.global.report_id;
        let size = self.global.report_size;
        let count = self.global.report_count;
        let cursor = self.cursors.entry(report_id).or_insert(0);
        let start = *cursor;
        let end = size
            .checked_mul(count)
            .and_then(|bits| start.checked_add(bits))
            .filter(|&end| end <= MAX_REPORT_BITS)
            .ok_or_else(|| {
                crate::Error::Device(format!(
                    "report {} overflows {} bits ({} x {} at bit {})",
                    report_id, MAX_REPORT_BITS, size, count, start
                ))
            })?;
        *cursor = end;

        let constant = flags & 0x01 != 0;
        let variable = flags & 0x02 != 0;
        if constant || !variable {
            return Ok(());
        }

        let collection = self.collections.last().copied().flatten();
        for index in 0..count {
            let Some((page, usage)) = self.local.usage_at(index, self.global.usage_page) else {
                continue;
            };
            let bit_offset = start + index * size;

            let is_flag = size == 1
                && (page == PAGE_BUTTON
                    || (page == PAGE_DIGITIZER
                        && matches!(usage, USAGE_TIP_SWITCH | USAGE_CONFIDENCE)));

            if is_flag {
                self.layout.buttons.push(ButtonField {
                    report_id,
                    usage_page: page,
                    usage,
                    bit_offset,
                    collection,
                });
            } else {
                self.layout.values.push(ValueField {
                    report_id,
                    usage_page: page,
                    usage,
                    bit_offset,
                    bit_size: size,
                    logical_min: self.global.logical_min,
                    logical_max: self.global.logical_max,
                    collection,
                });
            }
        }
        Ok(())
    }

    fn global_item(&mut self, tag: u8, unsigned: u32, signed: i32) -> crate::Result<()> {
        match tag {
            0x0 => self.global.usage_page = unsigned as u16,
            0x1 => self.global.logical_min = signed,
            0x2 => {
                // Logical maximum is unsigned unless the minimum is negative
                self.global.logical_max = if self.global.logical_min < 0 {
                    signed
                } else {
                    i32::try_from(unsigned).unwrap_or(i32::MAX)
                };
            }
            0x7 => self.global.report_size = unsigned,
            0x8 => {
                self.global.report_id = u8::try_from(unsigned).map_err(|_| {
                    crate::Error::Device(format!("report id {} out of range", unsigned))
                })?;
            }
            0x9 => self.global.report_count = unsigned,
            0xA => self.global_stack.push(self.global),
            0xB => {
                self.global = self.global_stack.pop().ok_or_else(|| {
                    crate::Error::Device("Pop without matching Push".to_string())
                })?;
            }
            // Physical range, unit exponent and unit do not affect layout
            _ => {}
        }
        Ok(())
    }

    fn local_item(&mut self, tag: u8, data: u32, size: usize) {
        // 4-byte usages carry the usage page in the high word
        let usage = if size == 4 {
            ((data >> 16) as u16, data as u16)
        } else {
            (self.global.usage_page, data as u16)
        };
        match tag {
            0x0 => self.local.usages.push(usage),
            0x1 => self.local.usage_min = Some(usage),
            0x2 => self.local.usage_max = Some(usage),
            _ => {}
        }
    }
}

fn read_unsigned(data: &[u8]) -> u32 {
    data.iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)))
}

fn read_signed(data: &[u8]) -> i32 {
    match data.len() {
        1 => i32::from(data[0] as i8),
        2 => i32::from(i16::from_le_bytes([data[0], data[1]])),
        4 => i32::from_le_bytes([data[0], data[1], data[2], data[3]]),
        _ => 0,
    }
}
