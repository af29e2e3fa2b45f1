//! Registry of opened raw HID interfaces
//!
//! Entries keep discovery order and are addressed by zero-based position.
//! Closing an entry leaves it in place (closed), so positions of the other
//! entries never shift until the registry is cleared.

use tracing::{debug, warn};

use crate::types::OpenedDevice;
use crate::usb::UsbHandle;

/// One claimed raw HID interface
pub struct DeviceEntry<H: UsbHandle> {
    /// `None` once closed
    handle: Option<H>,
    pub interface_number: u8,
    pub setting_number: u8,
    /// IN endpoint address (direction bit set), never zero
    pub input_endpoint: u8,
    /// OUT endpoint address, `None` to fall back to SET_REPORT
    pub output_endpoint: Option<u8>,
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u32,
    pub usage: u32,
}

impl<H: UsbHandle> DeviceEntry<H> {
    /// Wrap a handle whose interface has already been claimed
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        handle: H,
        interface_number: u8,
        setting_number: u8,
        input_endpoint: u8,
        output_endpoint: Option<u8>,
        vendor_id: u16,
        product_id: u16,
        usage_page: u32,
        usage: u32,
    ) -> Self {
        Self {
            handle: Some(handle),
            interface_number,
            setting_number,
            input_endpoint,
            output_endpoint,
            vendor_id,
            product_id,
            usage_page,
            usage,
        }
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The open handle, if any
    pub fn handle(&self) -> Option<&H> {
        self.handle.as_ref()
    }

    /// Release the interface and close the connection. No-op when closed.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.release_interface(self.interface_number) {
                warn!(
                    "failed to release interface {} of {:04X}:{:04X}: {}",
                    self.interface_number, self.vendor_id, self.product_id, e
                );
            }
            debug!(
                "closed {:04X}:{:04X} interface {}",
                self.vendor_id, self.product_id, self.interface_number
            );
            // handle dropped here, closing the connection
        }
    }

    fn snapshot(&self, index: usize) -> OpenedDevice {
        OpenedDevice {
            index,
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            interface_number: self.interface_number,
            setting_number: self.setting_number,
            input_endpoint: self.input_endpoint,
            output_endpoint: self.output_endpoint,
            usage_page: self.usage_page,
            usage: self.usage,
            open: self.is_open(),
        }
    }
}

impl<H: UsbHandle> Drop for DeviceEntry<H> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Ordered collection of device entries
pub struct DeviceRegistry<H: UsbHandle> {
    entries: Vec<DeviceEntry<H>>,
}

impl<H: UsbHandle> Default for DeviceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: UsbHandle> DeviceRegistry<H> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry, returning its position
    pub fn add(&mut self, entry: DeviceEntry<H>) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Entry at `index`, open or closed
    pub fn get(&self, index: usize) -> Option<&DeviceEntry<H>> {
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DeviceEntry<H>> {
        self.entries.get_mut(index)
    }

    /// Entry at `index` if it is still open
    pub fn get_open(&self, index: usize) -> Option<&DeviceEntry<H>> {
        self.get(index).filter(|e| e.is_open())
    }

    /// Close the entry at `index`. Absent or already closed entries are ignored.
    pub fn close(&mut self, index: usize) {
        if let Some(entry) = self.get_mut(index) {
            entry.close();
        }
    }

    /// Close every entry and empty the registry
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.close();
        }
        self.entries.clear();
    }

    /// Number of positions, including closed entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries still open
    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_open()).count()
    }

    /// Snapshot of every position
    pub fn snapshot(&self) -> Vec<OpenedDevice> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| e.snapshot(i))
            .collect()
    }
}
