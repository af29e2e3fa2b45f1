//! Caller-facing raw HID session
//!
//! A session owns the USB backend and one device registry. Discovery fills
//! the registry; packets are then exchanged by registry position. All calls
//! block until the transfer completes or its timeout expires.

use std::time::Duration;

use tracing::debug;

use crate::device_registry::{DeviceEntry, DeviceRegistry};
use crate::discovery;
use crate::error::{TransportError, UsbError};
use crate::protocol::{endpoint, request};
use crate::types::{MatchCriteria, OpenedDevice};
use crate::usb::{RusbBackend, UsbBackend, UsbHandle};

/// Raw HID session over a USB backend
pub struct RawHid<B: UsbBackend> {
    backend: B,
    registry: DeviceRegistry<B::Handle>,
}

impl RawHid<RusbBackend> {
    /// Open a session on the system's libusb context
    pub fn open() -> Result<Self, UsbError> {
        Ok(Self::with_backend(RusbBackend::new()?))
    }
}

impl<B: UsbBackend> RawHid<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            registry: DeviceRegistry::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Close everything from a previous pass, then open up to `max`
    /// matching raw HID interfaces. Returns the number opened.
    pub fn discover(&mut self, max: usize, criteria: &MatchCriteria) -> usize {
        discovery::discover(&self.backend, &mut self.registry, max, criteria)
    }

    /// Count devices matching the VID/PID filters without opening them
    pub fn scan(&self, vendor_id: Option<u16>, product_id: Option<u16>) -> usize {
        discovery::scan(&self.backend, vendor_id, product_id)
    }

    /// Receive one packet from device `index` into `buf`.
    ///
    /// Returns the number of bytes received, `Ok(0)` if the timeout expired
    /// without data.
    pub fn receive(
        &self,
        index: usize,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, TransportError> {
        let (entry, handle) = self.lookup(index)?;
        let timeout = Duration::from_millis(timeout_ms as u64);

        match handle.read_interrupt(entry.input_endpoint | endpoint::DIR_IN, buf, timeout) {
            Ok(n) => Ok(n),
            Err(UsbError::Timeout) => Ok(0),
            Err(e) => {
                debug!("receive on #{} failed: {}", index, e);
                Err(TransportError::TransferFailed)
            }
        }
    }

    /// Send one packet to device `index`.
    ///
    /// Uses the interrupt OUT endpoint when the interface has one, otherwise
    /// a SET_REPORT control transfer on the interface.
    pub fn send(&self, index: usize, buf: &[u8], timeout_ms: u32) -> Result<usize, TransportError> {
        let (entry, handle) = self.lookup(index)?;
        let timeout = Duration::from_millis(timeout_ms as u64);

        let result = match entry.output_endpoint {
            Some(ep) => handle.write_interrupt(ep, buf, timeout),
            None => handle.write_control(
                request::TYPE_CLASS_INTERFACE_OUT,
                request::SET_REPORT,
                request::SET_REPORT_OUTPUT,
                entry.interface_number as u16,
                buf,
                timeout,
            ),
        };

        result.map_err(|e| {
            debug!("send on #{} failed: {}", index, e);
            TransportError::TransferFailed
        })
    }

    /// Close device `index`. Absent or already closed devices are ignored.
    pub fn close(&mut self, index: usize) {
        self.registry.close(index);
    }

    /// Close every device and empty the registry
    pub fn close_all(&mut self) {
        self.registry.clear();
    }

    /// Snapshot of every registry position
    pub fn devices(&self) -> Vec<OpenedDevice> {
        self.registry.snapshot()
    }

    /// Number of registry positions, including closed ones
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Number of entries still open
    pub fn open_count(&self) -> usize {
        self.registry.open_count()
    }

    pub fn is_open(&self, index: usize) -> bool {
        self.registry.get_open(index).is_some()
    }

    fn lookup(&self, index: usize) -> Result<(&DeviceEntry<B::Handle>, &B::Handle), TransportError> {
        self.registry
            .get_open(index)
            .and_then(|entry| entry.handle().map(|h| (entry, h)))
            .ok_or(TransportError::NotOpen { index })
    }
}
