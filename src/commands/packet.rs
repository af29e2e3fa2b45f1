//! Packet commands: listen, send, echo

use super::{open_devices, setup_interrupt_handler, CommandResult, Context};
use anyhow::{bail, Context as _};
use rawhid::printer::{pad_packet, parse_hex_bytes, Direction};
use std::io::BufRead;
use std::sync::atomic::Ordering;
use tracing::{info, warn};

/// All packet commands talk to the first device discovered
const DEVICE: usize = 0;

/// Receive and print packets until Ctrl-C, `count` packets, or the device
/// goes away
pub fn listen(ctx: &Context, json: bool, count: Option<usize>) -> CommandResult {
    let mut hid = open_devices(&ctx.config, 1)?;
    let printer = ctx.printer(json);
    let running = setup_interrupt_handler();

    eprintln!("Found rawhid device, listening (Ctrl-C to stop)");
    let mut buf = vec![0u8; ctx.config.packet_size];
    let mut received = 0usize;

    while running.load(Ordering::SeqCst) {
        match hid.receive(DEVICE, &mut buf, ctx.config.timeout_ms) {
            Ok(0) => {}
            Ok(n) => {
                printer.print(Direction::Recv, DEVICE, &buf[..n]);
                received += 1;
                if count.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            Err(e) => {
                hid.close(DEVICE);
                bail!("Error reading, device went offline: {}", e);
            }
        }
    }

    info!("received {} packet(s)", received);
    hid.close(DEVICE);
    Ok(())
}

/// Send one zero-padded packet built from hex bytes
pub fn send(ctx: &Context, bytes: &[String]) -> CommandResult {
    let payload = parse_hex_bytes(&bytes.join(" ")).map_err(anyhow::Error::msg)?;
    let size = ctx.config.packet_size;
    if payload.len() > size {
        bail!("Payload is {} bytes, packet size is {}", payload.len(), size);
    }
    let packet = pad_packet(&payload, size);

    let mut hid = open_devices(&ctx.config, 1)?;
    let sent = hid
        .send(DEVICE, &packet, ctx.config.send_timeout_ms)
        .context("Send failed")?;
    println!("Sent {} bytes", sent);

    hid.close(DEVICE);
    Ok(())
}

/// Send every stdin line as a packet, then print one reply if any arrives
pub fn echo(ctx: &Context, json: bool) -> CommandResult {
    let mut hid = open_devices(&ctx.config, 1)?;
    let printer = ctx.printer(json);
    let size = ctx.config.packet_size;
    let mut buf = vec![0u8; size];

    eprintln!("Found rawhid device, type lines to send (Ctrl-D to stop)");
    for line in std::io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.len() > size {
            warn!("line truncated from {} to {} bytes", line.len(), size);
        }
        let packet = pad_packet(line.as_bytes(), size);

        let sent = hid
            .send(DEVICE, &packet, ctx.config.send_timeout_ms)
            .context("Send failed")?;
        printer.print(Direction::Send, DEVICE, &packet[..sent]);

        match hid.receive(DEVICE, &mut buf, ctx.config.timeout_ms) {
            Ok(0) => {}
            Ok(n) => printer.print(Direction::Recv, DEVICE, &buf[..n]),
            Err(e) => {
                hid.close(DEVICE);
                bail!("Error reading, device went offline: {}", e);
            }
        }
    }

    hid.close(DEVICE);
    Ok(())
}
