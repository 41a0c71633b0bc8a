//! Scroll zone geometry

use crate::app::config::{HorizontalZonePosition, VerticalZonePosition, ZoneConfig};
use crate::capture::types::ScrollZoneType;
use crate::device::capabilities::TouchSurfaceDescriptor;

/// Zone boundaries resolved against one surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneGeometry {
    /// X beyond which (or below which, for a left zone) the vertical zone starts
    vertical_edge: f64,
    vertical_position: VerticalZonePosition,
    /// Y boundary of the horizontal zone, if enabled
    horizontal_edge: Option<f64>,
    horizontal_position: HorizontalZonePosition,
}

impl ZoneGeometry {
    pub fn new(descriptor: &TouchSurfaceDescriptor, zones: &ZoneConfig) -> Self {
        let zone_w = descriptor.width() * zones.width_percent / 100.0;
        let zone_h = descriptor.height() * zones.horizontal_height_percent / 100.0;

        let vertical_edge = match zones.position {
            VerticalZonePosition::Right => f64::from(descriptor.logical_max_x) - zone_w,
            VerticalZonePosition::Left => f64::from(descriptor.logical_min_x) + zone_w,
        };
        let horizontal_edge = zones.horizontal_enabled.then(|| match zones.horizontal_position {
            HorizontalZonePosition::Bottom => f64::from(descriptor.logical_max_y) - zone_h,
            HorizontalZonePosition::Top => f64::from(descriptor.logical_min_y) + zone_h,
        });

        Self {
            vertical_edge,
            vertical_position: zones.position,
            horizontal_edge,
            horizontal_position: zones.horizontal_position,
        }
    }

    pub fn in_vertical_zone(&self, x: i32) -> bool {
        let x = f64::from(x);
        match self.vertical_position {
            VerticalZonePosition::Right => x >= self.vertical_edge,
            VerticalZonePosition::Left => x <= self.vertical_edge,
        }
    }

    pub fn in_horizontal_zone(&self, y: i32) -> bool {
        let Some(edge) = self.horizontal_edge else {
            return false;
        };
        let y = f64::from(y);
        match self.horizontal_position {
            HorizontalZonePosition::Bottom => y >= edge,
            HorizontalZonePosition::Top => y <= edge,
        }
    }

    /// Zone containing a position; the horizontal zone wins where they overlap
    pub fn zone_at(&self, x: i32, y: i32) -> ScrollZoneType {
        if self.in_horizontal_zone(y) {
            ScrollZoneType::Horizontal
        } else if self.in_vertical_zone(x) {
            ScrollZoneType::Vertical
        } else {
            ScrollZoneType::None
        }
    }
}
