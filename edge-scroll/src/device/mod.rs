//! Device layer
//!
//! HID usage constants, field layouts, capability resolution and report
//! decoding. Everything here is pure: no OS handles, no threads.

pub mod capabilities;
pub mod layout;
pub mod report;
pub mod usage;

pub use capabilities::{
    CapabilityQuery, DescriptorQuery, DeviceCapabilityResolver, DeviceInfo, TouchSurfaceDescriptor,
};
pub use layout::{ButtonField, FieldLayout, ValueField};
pub use report::{RawContact, ReportDecoder};
