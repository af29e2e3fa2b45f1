//! USB and HID constants used by raw HID discovery and transport

/// USB class codes
pub mod class {
    /// Human Interface Device class (bInterfaceClass)
    pub const HID: u8 = 0x03;
    /// Raw HID interfaces declare no boot subclass
    pub const RAW_SUBCLASS: u8 = 0x00;
    /// Raw HID interfaces declare no boot protocol (keyboard = 1, mouse = 2)
    pub const RAW_PROTOCOL: u8 = 0x00;
}

/// Endpoint address bits
pub mod endpoint {
    /// Direction bit of bEndpointAddress: set for IN (device-to-host)
    pub const DIR_IN: u8 = 0x80;

    /// Check whether an endpoint address is an IN endpoint
    #[inline]
    pub fn is_in(address: u8) -> bool {
        address & DIR_IN != 0
    }
}

/// Control request fields
pub mod request {
    /// bmRequestType: device-to-host, standard, interface
    pub const TYPE_STANDARD_INTERFACE_IN: u8 = 0x81;
    /// bmRequestType: host-to-device, class, interface
    pub const TYPE_CLASS_INTERFACE_OUT: u8 = 0x21;

    /// Standard GET_DESCRIPTOR
    pub const GET_DESCRIPTOR: u8 = 0x06;
    /// HID class SET_REPORT
    pub const SET_REPORT: u8 = 0x09;

    /// HID report descriptor type (wValue high byte for GET_DESCRIPTOR)
    pub const DT_REPORT: u8 = 0x22;
    /// wValue for SET_REPORT: report type Output (0x02), report ID 0
    pub const SET_REPORT_OUTPUT: u16 = 0x0200;

    /// wValue for fetching the report descriptor
    #[inline]
    pub fn report_descriptor_value() -> u16 {
        (DT_REPORT as u16) << 8
    }
}

/// Report descriptor item tags (short item, type+tag bits, size bits cleared)
pub mod tag {
    /// Global item: Usage Page
    pub const USAGE_PAGE: u8 = 0x04;
    /// Local item: Usage
    pub const USAGE: u8 = 0x08;
    /// Marker byte that introduces a long item
    pub const LONG_ITEM: u8 = 0xFE;
}

/// Timing and sizes
pub mod timing {
    /// Timeout for the report descriptor control transfer
    pub const DESCRIPTOR_TIMEOUT_MS: u64 = 1000;
}

/// Report descriptor fetch buffer size
pub const DESCRIPTOR_BUFFER_SIZE: usize = 1024;

/// Packet size used by the Teensy raw HID firmware
pub const DEFAULT_PACKET_SIZE: usize = 64;
