//! Command handlers for the CLI application.
//!
//! - `device`: discovery commands (scan, list)
//! - `packet`: packet commands (listen, send, echo)
//! - `settings`: configuration command (config)

pub mod device;
pub mod packet;
pub mod settings;

use anyhow::{bail, Context as _};
use rawhid::config::RawHidConfig;
use rawhid::printer::{OutputFormat, PacketPrinter};
use rawhid_transport::{RawHid, RusbBackend};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Result type for command handlers
pub type CommandResult = anyhow::Result<()>;

/// Settings shared by every command
pub struct Context {
    pub config: RawHidConfig,
    pub config_path: PathBuf,
    pub color: bool,
}

impl Context {
    pub fn printer(&self, json: bool) -> PacketPrinter {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };
        PacketPrinter::new(format, self.color)
    }
}

/// Open a libusb session and discover up to `max` devices.
/// Fails if nothing matched.
pub fn open_devices(config: &RawHidConfig, max: usize) -> anyhow::Result<RawHid<RusbBackend>> {
    let criteria = config.criteria()?;
    let mut hid = RawHid::open().context("Failed to initialize libusb")?;

    let found = hid.discover(max, &criteria);
    debug!("discover(max={}) opened {} device(s)", max, found);
    if found == 0 {
        bail!(
            "No rawhid device found (VID={} PID={} usage page={} usage={})",
            config.vendor_id,
            config.product_id,
            config.usage_page,
            config.usage
        );
    }
    Ok(hid)
}

/// Setup Ctrl-C handler and return the running flag
pub fn setup_interrupt_handler() -> Arc<AtomicBool> {
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);

    ctrlc::set_handler(move || {
        running_clone.store(false, Ordering::SeqCst);
    })
    .ok();

    running
}
