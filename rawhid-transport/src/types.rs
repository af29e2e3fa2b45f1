//! Common types for the raw HID layer
//!
//! Descriptor snapshots are plain copies of what the USB stack reports, so
//! discovery can be driven by any [`UsbBackend`](crate::usb::UsbBackend).

use serde::Serialize;

use crate::protocol::{class, endpoint};

/// Device descriptor fields used by discovery and scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptorInfo {
    /// USB Vendor ID
    pub vendor_id: u16,
    /// USB Product ID
    pub product_id: u16,
    /// bNumConfigurations
    pub num_configurations: u8,
}

/// One endpoint of an alternate setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointInfo {
    /// bEndpointAddress, direction bit included
    pub address: u8,
}

impl EndpointInfo {
    pub fn is_in(&self) -> bool {
        endpoint::is_in(self.address)
    }
}

/// One alternate setting of an interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltSettingInfo {
    /// bInterfaceNumber
    pub interface_number: u8,
    /// bAlternateSetting
    pub setting_number: u8,
    pub class_code: u8,
    pub sub_class_code: u8,
    pub protocol_code: u8,
    /// Endpoints in descriptor order
    pub endpoints: Vec<EndpointInfo>,
}

impl AltSettingInfo {
    /// HID class with zero subclass and protocol (not a boot keyboard/mouse)
    pub fn is_raw_hid(&self) -> bool {
        self.class_code == class::HID
            && self.sub_class_code == class::RAW_SUBCLASS
            && self.protocol_code == class::RAW_PROTOCOL
    }

    /// First IN and first OUT endpoint addresses, in descriptor order
    pub fn first_endpoints(&self) -> (Option<u8>, Option<u8>) {
        let input = self.endpoints.iter().find(|e| e.is_in()).map(|e| e.address);
        let output = self
            .endpoints
            .iter()
            .find(|e| !e.is_in())
            .map(|e| e.address);
        (input, output)
    }
}

/// One interface with its alternate settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub alt_settings: Vec<AltSettingInfo>,
}

/// Configuration descriptor snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDescriptorInfo {
    pub interfaces: Vec<InterfaceInfo>,
}

/// Caller-supplied discovery filters. `None` means "any".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchCriteria {
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub usage_page: Option<u32>,
    pub usage: Option<u32>,
}

impl MatchCriteria {
    /// Match any device
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_vendor_id(mut self, vid: u16) -> Self {
        self.vendor_id = Some(vid);
        self
    }

    pub fn with_product_id(mut self, pid: u16) -> Self {
        self.product_id = Some(pid);
        self
    }

    pub fn with_usage_page(mut self, usage_page: u32) -> Self {
        self.usage_page = Some(usage_page);
        self
    }

    pub fn with_usage(mut self, usage: u32) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Check the VID/PID filters against a device descriptor
    pub fn matches_ids(&self, desc: &DeviceDescriptorInfo) -> bool {
        self.vendor_id.map_or(true, |v| v == desc.vendor_id)
            && self.product_id.map_or(true, |p| p == desc.product_id)
    }
}

/// Snapshot of one registry position, for listing opened devices
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedDevice {
    /// Position in the registry (the index used by receive/send/close)
    pub index: usize,
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface_number: u8,
    pub setting_number: u8,
    pub input_endpoint: u8,
    pub output_endpoint: Option<u8>,
    pub usage_page: u32,
    pub usage: u32,
    pub open: bool,
}
