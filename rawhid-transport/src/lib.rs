//! Raw HID discovery and packet transport
//!
//! Finds USB interfaces that are HID class with zero subclass and protocol
//! (the "raw HID" used by Teensy-style firmware), opens a bounded number of
//! them whose report descriptor advertises the requested top-level usage,
//! and exchanges fixed-size packets with them over interrupt transfers.
//!
//! ```no_run
//! use rawhid_transport::{MatchCriteria, RawHid};
//!
//! let mut hid = RawHid::open()?;
//! let criteria = MatchCriteria::any()
//!     .with_vendor_id(0x16C0)
//!     .with_product_id(0x0480)
//!     .with_usage_page(0xFFAB)
//!     .with_usage(0x0200);
//! if hid.discover(1, &criteria) == 1 {
//!     let mut buf = [0u8; 64];
//!     let n = hid.receive(0, &mut buf, 220)?;
//!     println!("received {n} bytes");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod descriptor;
pub mod device_registry;
pub mod error;
pub mod protocol;
pub mod types;
pub mod usb;

mod discovery;
mod session;

pub use descriptor::{decode_item, top_level_usage, ReportItem, ReportItems, TopLevelUsage};
pub use device_registry::{DeviceEntry, DeviceRegistry};
pub use discovery::{discover, scan};
pub use error::{status_code, DescriptorError, Rejection, TransportError, UsbError};
pub use session::RawHid;
pub use types::{
    AltSettingInfo, ConfigDescriptorInfo, DeviceDescriptorInfo, EndpointInfo, InterfaceInfo,
    MatchCriteria, OpenedDevice,
};
pub use usb::{RusbBackend, UsbBackend, UsbHandle};
