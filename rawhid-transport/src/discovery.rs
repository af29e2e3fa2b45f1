//! Raw HID device discovery
//!
//! Walks device → configuration 0 → interface → alternate setting and opens
//! every alternate setting that passes the candidate pipeline. A failing
//! candidate is logged and skipped; it never aborts the walk.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::descriptor::{top_level_usage, TopLevelUsage};
use crate::device_registry::{DeviceEntry, DeviceRegistry};
use crate::error::{Rejection, UsbError};
use crate::protocol::{request, timing, DESCRIPTOR_BUFFER_SIZE};
use crate::types::{AltSettingInfo, DeviceDescriptorInfo, MatchCriteria};
use crate::usb::{UsbBackend, UsbHandle};

/// Clear `registry`, then open and register up to `max` matching raw HID
/// interfaces. Returns how many were registered.
pub fn discover<B: UsbBackend>(
    backend: &B,
    registry: &mut DeviceRegistry<B::Handle>,
    max: usize,
    criteria: &MatchCriteria,
) -> usize {
    registry.clear();
    debug!("discover, max={}, criteria={:?}", max, criteria);
    if max == 0 {
        return 0;
    }

    let devices = match backend.devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate USB devices: {}", e);
            return 0;
        }
    };

    let mut count = 0;
    'devices: for device in &devices {
        if count >= max {
            break;
        }

        let desc = match backend.device_descriptor(device) {
            Ok(desc) => desc,
            Err(e) => {
                debug!("skipping device without readable descriptor: {}", e);
                continue;
            }
        };
        if !criteria.matches_ids(&desc) {
            continue;
        }

        let config = match backend.config_descriptor(device, 0) {
            Ok(config) => config,
            Err(e) => {
                debug!(
                    "device {:04X}:{:04X}: no configuration descriptor: {}",
                    desc.vendor_id, desc.product_id, e
                );
                continue;
            }
        };
        debug!(
            "device: vid={:04X}, pid={:04X}, with {} iface",
            desc.vendor_id,
            desc.product_id,
            config.interfaces.len()
        );

        for interface in &config.interfaces {
            for alt in &interface.alt_settings {
                if count >= max {
                    break 'devices;
                }
                match open_candidate(backend, device, &desc, alt, criteria) {
                    Ok(entry) => {
                        info!(
                            "Opened raw HID {:04X}:{:04X} interface {} (usage {:04X}:{:04X}) as #{}",
                            desc.vendor_id,
                            desc.product_id,
                            alt.interface_number,
                            entry.usage_page,
                            entry.usage,
                            registry.len()
                        );
                        registry.add(entry);
                        count += 1;
                    }
                    Err(reason) => {
                        debug!(
                            "  {:04X}:{:04X} interface {} alt {}: {}",
                            desc.vendor_id,
                            desc.product_id,
                            alt.interface_number,
                            alt.setting_number,
                            reason
                        );
                    }
                }
            }
        }
    }

    count
}

/// Run one alternate setting through the candidate pipeline.
///
/// Every rejection after the device is opened closes it again, and every
/// rejection after the interface is claimed releases it first.
fn open_candidate<B: UsbBackend>(
    backend: &B,
    device: &B::Device,
    desc: &DeviceDescriptorInfo,
    alt: &AltSettingInfo,
    criteria: &MatchCriteria,
) -> Result<DeviceEntry<B::Handle>, Rejection> {
    if !alt.is_raw_hid() {
        return Err(Rejection::NotRawHid {
            class: alt.class_code,
            sub_class: alt.sub_class_code,
            protocol: alt.protocol_code,
        });
    }

    let (input_endpoint, output_endpoint) = alt.first_endpoints();
    let input_endpoint = input_endpoint.ok_or(Rejection::NoInputEndpoint)?;
    let iface = alt.interface_number;

    let mut handle = backend.open(device).map_err(Rejection::Open)?;

    match handle.kernel_driver_active(iface) {
        Ok(true) => {
            debug!("  interface {} in use by driver, attempting to detach", iface);
            handle
                .detach_kernel_driver(iface)
                .map_err(Rejection::Detach)?;
        }
        Ok(false) => {}
        Err(e) => debug!("  kernel driver state unknown ({}), assuming detached", e),
    }

    handle.claim_interface(iface).map_err(Rejection::Claim)?;

    let usage = match read_usage(&handle, iface, criteria) {
        Ok(usage) => usage,
        Err(reason) => {
            if let Err(e) = handle.release_interface(iface) {
                debug!("  failed to release interface {}: {}", iface, e);
            }
            return Err(reason);
        }
    };

    Ok(DeviceEntry::new(
        handle,
        iface,
        alt.setting_number,
        input_endpoint,
        output_endpoint,
        desc.vendor_id,
        desc.product_id,
        usage.usage_page,
        usage.usage,
    ))
}

/// Fetch the report descriptor of a claimed interface and check its
/// top-level usage against the filters.
fn read_usage<H: UsbHandle>(
    handle: &H,
    iface: u8,
    criteria: &MatchCriteria,
) -> Result<TopLevelUsage, Rejection> {
    let descriptor = fetch_report_descriptor(handle, iface).map_err(Rejection::DescriptorFetch)?;
    debug!("  descriptor, len={}", descriptor.len());

    let usage = top_level_usage(&descriptor);
    if !usage.is_complete() {
        return Err(Rejection::MissingUsage {
            usage_page: usage.usage_page,
            usage: usage.usage,
        });
    }

    let page_ok = criteria.usage_page.map_or(true, |p| p == usage.usage_page);
    let usage_ok = criteria.usage.map_or(true, |u| u == usage.usage);
    if !page_ok || !usage_ok {
        return Err(Rejection::UsageMismatch {
            usage_page: usage.usage_page,
            usage: usage.usage,
        });
    }

    Ok(usage)
}

/// Standard GET_DESCRIPTOR (report) addressed to an interface
fn fetch_report_descriptor<H: UsbHandle>(handle: &H, iface: u8) -> Result<Vec<u8>, UsbError> {
    let mut buf = vec![0u8; DESCRIPTOR_BUFFER_SIZE];
    let len = handle.read_control(
        request::TYPE_STANDARD_INTERFACE_IN,
        request::GET_DESCRIPTOR,
        request::report_descriptor_value(),
        iface as u16,
        &mut buf,
        Duration::from_millis(timing::DESCRIPTOR_TIMEOUT_MS),
    )?;
    buf.truncate(len);
    Ok(buf)
}

/// Count devices matching the VID/PID filters that report at least one
/// configuration. Nothing is opened.
pub fn scan<B: UsbBackend>(
    backend: &B,
    vendor_id: Option<u16>,
    product_id: Option<u16>,
) -> usize {
    let criteria = MatchCriteria {
        vendor_id,
        product_id,
        ..MatchCriteria::default()
    };

    let devices = match backend.devices() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("Failed to enumerate USB devices: {}", e);
            return 0;
        }
    };

    devices
        .iter()
        .filter_map(|device| backend.device_descriptor(device).ok())
        .filter(|desc| criteria.matches_ids(desc) && desc.num_configurations > 0)
        .inspect(|desc| debug!("device: vid={:04X}, pid={:04X}", desc.vendor_id, desc.product_id))
        .count()
}
