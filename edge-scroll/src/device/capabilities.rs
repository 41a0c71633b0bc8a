//! Device capability resolution
//!
//! Decides whether a device is a touch pad digitizer and extracts the
//! logical coordinate ranges every downstream component scales against.

use super::layout::FieldLayout;
use super::usage::{self, PAGE_GENERIC_DESKTOP, USAGE_X, USAGE_Y};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Identity of a device as reported by enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Human-readable product name
    pub name: String,
}

/// Capability query for one device handle.
///
/// The host implements this on top of whatever the OS offers (preparsed
/// data, hidraw descriptors, ...). Both calls may fail.
pub trait CapabilityQuery {
    /// Vendor/product identity and name
    fn device_info(&self) -> crate::Result<DeviceInfo>;

    /// Parsed field layout of the device's input reports
    fn field_layout(&self) -> crate::Result<FieldLayout>;
}

/// Capability query backed by a raw HID report descriptor
#[derive(Debug, Clone)]
pub struct DescriptorQuery {
    info: DeviceInfo,
    descriptor: Vec<u8>,
}

impl DescriptorQuery {
    pub fn new(vendor_id: u16, product_id: u16, name: impl Into<String>, descriptor: Vec<u8>) -> Self {
        Self {
            info: DeviceInfo {
                vendor_id,
                product_id,
                name: name.into(),
            },
            descriptor,
        }
    }

    /// Raw descriptor bytes
    pub fn descriptor(&self) -> &[u8] {
        &self.descriptor
    }
}

impl CapabilityQuery for DescriptorQuery {
    fn device_info(&self) -> crate::Result<DeviceInfo> {
        Ok(self.info.clone())
    }

    fn field_layout(&self) -> crate::Result<FieldLayout> {
        if self.descriptor.is_empty() {
            return Err(crate::Error::Device("empty report descriptor".to_string()));
        }
        FieldLayout::parse_descriptor(&self.descriptor)
    }
}

/// Coordinate space and identity of a touch surface.
///
/// Created once per detected device. The default value is uninitialized;
/// consumers check [`TouchSurfaceDescriptor::is_initialized`] and skip
/// zone and scroll logic until it returns true.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TouchSurfaceDescriptor {
    pub logical_min_x: i32,
    pub logical_max_x: i32,
    pub logical_min_y: i32,
    pub logical_max_y: i32,
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: String,
}

impl TouchSurfaceDescriptor {
    /// Descriptor from explicit logical ranges
    pub fn from_ranges(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            logical_min_x: min_x,
            logical_max_x: max_x,
            logical_min_y: min_y,
            logical_max_y: max_y,
            ..Default::default()
        }
    }

    /// Logical width (max − min)
    pub fn width(&self) -> f64 {
        f64::from(self.logical_max_x) - f64::from(self.logical_min_x)
    }

    /// Logical height (max − min)
    pub fn height(&self) -> f64 {
        f64::from(self.logical_max_y) - f64::from(self.logical_min_y)
    }

    /// True iff both extents are positive
    pub fn is_initialized(&self) -> bool {
        self.width() > 0.0 && self.height() > 0.0
    }
}

/// Resolves device handles into surface descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceCapabilityResolver;

impl DeviceCapabilityResolver {
    pub fn new() -> Self {
        Self
    }

    /// Query the device and resolve its descriptor and layout.
    pub fn resolve<Q: CapabilityQuery + ?Sized>(
        &self,
        query: &Q,
    ) -> crate::Result<(TouchSurfaceDescriptor, FieldLayout)> {
        let info = query.device_info()?;
        let layout = query.field_layout().map_err(|e| {
            warn!("Capability query failed for {:?}: {}", info.name, e);
            e
        })?;
        let descriptor = self.resolve_layout(&info, &layout)?;
        Ok((descriptor, layout))
    }

    /// Resolve a descriptor from an already-obtained layout.
    pub fn resolve_layout(
        &self,
        info: &DeviceInfo,
        layout: &FieldLayout,
    ) -> crate::Result<TouchSurfaceDescriptor> {
        if !usage::is_touch_pad(layout.top_usage_page, layout.top_usage) {
            return Err(crate::Error::Device(format!(
                "{:?} is not a touch pad digitizer (usage {:#04x}:{:#04x})",
                info.name, layout.top_usage_page, layout.top_usage
            )));
        }

        let x = layout.first_value(PAGE_GENERIC_DESKTOP, USAGE_X);
        let y = layout.first_value(PAGE_GENERIC_DESKTOP, USAGE_Y);
        let (Some(x), Some(y)) = (x, y) else {
            return Err(crate::Error::Device(format!(
                "{:?} reports no X/Y value fields",
                info.name
            )));
        };

        let descriptor = TouchSurfaceDescriptor {
            logical_min_x: x.logical_min,
            logical_max_x: x.logical_max,
            logical_min_y: y.logical_min,
            logical_max_y: y.logical_max,
            vendor_id: info.vendor_id,
            product_id: info.product_id,
            name: info.name.clone(),
        };

        if !descriptor.is_initialized() {
            return Err(crate::Error::Device(format!(
                "{:?} reports a degenerate coordinate range {}x{}",
                info.name,
                descriptor.width(),
                descriptor.height()
            )));
        }

        info!(
            "Resolved touch surface {:?} ({:04x}:{:04x}) {}x{}",
            descriptor.name,
            descriptor.vendor_id,
            descriptor.product_id,
            descriptor.width(),
            descriptor.height()
        );
        Ok(descriptor)
    }
}
