//! USB stack capability
//!
//! Discovery and transport only talk to the USB stack through these traits.
//! [`RusbBackend`] is the libusb-1.0 implementation used in production.

use std::time::Duration;

use rusb::{Context, Device, DeviceHandle, UsbContext};
use tracing::debug;

use crate::error::UsbError;
use crate::types::{
    AltSettingInfo, ConfigDescriptorInfo, DeviceDescriptorInfo, EndpointInfo, InterfaceInfo,
};

/// Enumeration and open side of the USB stack
pub trait UsbBackend {
    /// An enumerated, not yet opened device
    type Device;
    /// An open connection. Dropping it closes the connection.
    type Handle: UsbHandle;

    /// Currently connected devices, in enumeration order
    fn devices(&self) -> Result<Vec<Self::Device>, UsbError>;

    fn device_descriptor(&self, device: &Self::Device) -> Result<DeviceDescriptorInfo, UsbError>;

    fn config_descriptor(
        &self,
        device: &Self::Device,
        index: u8,
    ) -> Result<ConfigDescriptorInfo, UsbError>;

    fn open(&self, device: &Self::Device) -> Result<Self::Handle, UsbError>;
}

/// Operations on an open device connection
pub trait UsbHandle {
    fn kernel_driver_active(&mut self, interface: u8) -> Result<bool, UsbError>;

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), UsbError>;

    fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError>;

    fn release_interface(&mut self, interface: u8) -> Result<(), UsbError>;

    /// Blocking interrupt IN transfer, returns bytes received
    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError>;

    /// Blocking interrupt OUT transfer, returns bytes sent
    fn write_interrupt(&self, endpoint: u8, buf: &[u8], timeout: Duration)
        -> Result<usize, UsbError>;

    /// Blocking device-to-host control transfer
    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError>;

    /// Blocking host-to-device control transfer
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> Result<usize, UsbError>;
}

/// libusb-1.0 backend over `rusb`
pub struct RusbBackend {
    context: Context,
}

impl RusbBackend {
    /// Initialize a libusb context
    pub fn new() -> Result<Self, UsbError> {
        let context = Context::new()?;
        Ok(Self { context })
    }
}

impl UsbBackend for RusbBackend {
    type Device = Device<Context>;
    type Handle = DeviceHandle<Context>;

    fn devices(&self) -> Result<Vec<Self::Device>, UsbError> {
        let list = self.context.devices()?;
        Ok(list.iter().collect())
    }

    fn device_descriptor(&self, device: &Self::Device) -> Result<DeviceDescriptorInfo, UsbError> {
        let desc = device.device_descriptor()?;
        Ok(DeviceDescriptorInfo {
            vendor_id: desc.vendor_id(),
            product_id: desc.product_id(),
            num_configurations: desc.num_configurations(),
        })
    }

    fn config_descriptor(
        &self,
        device: &Self::Device,
        index: u8,
    ) -> Result<ConfigDescriptorInfo, UsbError> {
        let config = device.config_descriptor(index)?;
        let interfaces = config
            .interfaces()
            .map(|interface| InterfaceInfo {
                alt_settings: interface
                    .descriptors()
                    .map(|desc| AltSettingInfo {
                        interface_number: desc.interface_number(),
                        setting_number: desc.setting_number(),
                        class_code: desc.class_code(),
                        sub_class_code: desc.sub_class_code(),
                        protocol_code: desc.protocol_code(),
                        endpoints: desc
                            .endpoint_descriptors()
                            .map(|ep| EndpointInfo {
                                address: ep.address(),
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();
        Ok(ConfigDescriptorInfo { interfaces })
    }

    fn open(&self, device: &Self::Device) -> Result<Self::Handle, UsbError> {
        let handle = device.open()?;
        debug!(
            "opened device on bus {} address {}",
            device.bus_number(),
            device.address()
        );
        Ok(handle)
    }
}

impl UsbHandle for DeviceHandle<Context> {
    fn kernel_driver_active(&mut self, interface: u8) -> Result<bool, UsbError> {
        Ok(DeviceHandle::kernel_driver_active(self, interface)?)
    }

    fn detach_kernel_driver(&mut self, interface: u8) -> Result<(), UsbError> {
        Ok(DeviceHandle::detach_kernel_driver(self, interface)?)
    }

    fn claim_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        Ok(DeviceHandle::claim_interface(self, interface)?)
    }

    fn release_interface(&mut self, interface: u8) -> Result<(), UsbError> {
        Ok(DeviceHandle::release_interface(self, interface)?)
    }

    fn read_interrupt(
        &self,
        endpoint: u8,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        Ok(DeviceHandle::read_interrupt(self, endpoint, buf, timeout)?)
    }

    fn write_interrupt(
        &self,
        endpoint: u8,
        buf: &[u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        Ok(DeviceHandle::write_interrupt(self, endpoint, buf, timeout)?)
    }

    fn read_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        Ok(DeviceHandle::read_control(
            self,
            request_type,
            request,
            value,
            index,
            buf,
            timeout,
        )?)
    }

    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        buf: &[u8],
        timeout: Duration,
    ) -> Result<usize, UsbError> {
        Ok(DeviceHandle::write_control(
            self,
            request_type,
            request,
            value,
            index,
            buf,
            timeout,
        )?)
    }
}
