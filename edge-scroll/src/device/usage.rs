//! HID usage pages and usages consumed by the decoder

/// Usage pages
pub const PAGE_GENERIC_DESKTOP: u16 = 0x01;
pub const PAGE_BUTTON: u16 = 0x09;
pub const PAGE_DIGITIZER: u16 = 0x0D;

// Generic Desktop usages
pub const USAGE_X: u16 = 0x30;
pub const USAGE_Y: u16 = 0x31;

// Digitizer usages
pub const USAGE_TOUCH_SCREEN: u16 = 0x04;
pub const USAGE_TOUCH_PAD: u16 = 0x05;
pub const USAGE_FINGER: u16 = 0x22;
pub const USAGE_TIP_SWITCH: u16 = 0x42;
pub const USAGE_CONFIDENCE: u16 = 0x47;
pub const USAGE_CONTACT_ID: u16 = 0x51;
pub const USAGE_CONTACT_COUNT: u16 = 0x54;
pub const USAGE_CONTACT_MAX: u16 = 0x55;
pub const USAGE_SCAN_TIME: u16 = 0x56;

/// Check whether a top-level collection is a touch pad digitizer
pub fn is_touch_pad(usage_page: u16, usage: u16) -> bool {
    usage_page == PAGE_DIGITIZER && usage == USAGE_TOUCH_PAD
}
