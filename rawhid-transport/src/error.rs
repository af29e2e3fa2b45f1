//! Error types for raw HID discovery and transport

use thiserror::Error;

/// Failure reported by the USB stack
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsbError {
    #[error("Operation timed out")]
    Timeout,

    #[error("Access denied: {0}")]
    Access(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Resource busy")]
    Busy,

    #[error("Device disconnected")]
    NoDevice,

    #[error("Operation not supported on this platform")]
    NotSupported,

    #[error("USB error: {0}")]
    Other(String),
}

impl From<rusb::Error> for UsbError {
    fn from(e: rusb::Error) -> Self {
        match e {
            rusb::Error::Timeout => UsbError::Timeout,
            rusb::Error::Access => UsbError::Access(e.to_string()),
            rusb::Error::NotFound => UsbError::NotFound,
            rusb::Error::Busy => UsbError::Busy,
            rusb::Error::NoDevice => UsbError::NoDevice,
            rusb::Error::NotSupported => UsbError::NotSupported,
            other => UsbError::Other(other.to_string()),
        }
    }
}

/// The report descriptor cannot be decoded any further
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("No item at offset {offset}: end of descriptor")]
    EndOfBuffer { offset: usize },

    #[error("Item at offset {offset} needs {needed} bytes past the end of the descriptor")]
    Truncated { offset: usize, needed: usize },
}

/// Why a candidate interface was not registered
///
/// Only ever logged; discovery carries on with the next candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("not a raw HID interface (class {class:#04x}, subclass {sub_class}, protocol {protocol})")]
    NotRawHid { class: u8, sub_class: u8, protocol: u8 },

    #[error("no IN endpoint")]
    NoInputEndpoint,

    #[error("unable to open device: {0}")]
    Open(UsbError),

    #[error("in use by kernel driver, unable to detach: {0}")]
    Detach(UsbError),

    #[error("unable to claim interface: {0}")]
    Claim(UsbError),

    #[error("unable to read report descriptor: {0}")]
    DescriptorFetch(UsbError),

    #[error("report descriptor lacks a usage page or usage (page {usage_page:#06x}, usage {usage:#06x})")]
    MissingUsage { usage_page: u32, usage: u32 },

    #[error("usage {usage_page:#06x}:{usage:#06x} does not match filter")]
    UsageMismatch { usage_page: u32, usage: u32 },
}

/// Errors visible from packet transport calls
///
/// Deliberately carries no USB detail: callers can tell an invalid index
/// from a failed transfer, and a receive timeout is `Ok(0)`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    #[error("No open device at index {index}")]
    NotOpen { index: usize },

    #[error("Transfer failed")]
    TransferFailed,
}

/// Map a transport result onto the integer contract: count, `0` on
/// receive timeout, `-1` on any error.
pub fn status_code(result: Result<usize, TransportError>) -> i32 {
    match result {
        Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
        Err(_) => -1,
    }
}
