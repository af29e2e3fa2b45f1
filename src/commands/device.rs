//! Discovery commands: scan, list

use super::{open_devices, CommandResult, Context};
use anyhow::{bail, Context as _};
use crossterm::style::Stylize;
use rawhid_transport::{OpenedDevice, RawHid};

/// Count attached devices matching the VID/PID filters
pub fn scan(ctx: &Context) -> CommandResult {
    let criteria = ctx.config.criteria()?;
    let hid = RawHid::open().context("Failed to initialize libusb")?;

    let count = hid.scan(criteria.vendor_id, criteria.product_id);
    println!(
        "{} device(s) with VID={} PID={}",
        count, ctx.config.vendor_id, ctx.config.product_id
    );
    if count == 0 {
        bail!("No matching device attached");
    }
    Ok(())
}

/// Open matching raw HID interfaces and print one line per device
pub fn list(ctx: &Context, max: Option<usize>, json: bool) -> CommandResult {
    let max = max.unwrap_or(ctx.config.max_devices);
    let mut hid = open_devices(&ctx.config, max)?;
    let devices = hid.devices();

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
    } else {
        println!("Raw HID devices ({} open):", hid.open_count());
        for device in &devices {
            let line = format_device(device);
            if ctx.color {
                println!("  {}", line.green());
            } else {
                println!("  {}", line);
            }
        }
    }

    hid.close_all();
    Ok(())
}

fn format_device(device: &OpenedDevice) -> String {
    let out = device
        .output_endpoint
        .map(|ep| format!("0x{:02x}", ep))
        .unwrap_or_else(|| "ctrl".to_string());
    format!(
        "#{} VID={:04x} PID={:04x} if={} alt={} in=0x{:02x} out={} page={:04x} usage={:04x}",
        device.index,
        device.vendor_id,
        device.product_id,
        device.interface_number,
        device.setting_number,
        device.input_endpoint,
        out,
        device.usage_page,
        device.usage,
    )
}
