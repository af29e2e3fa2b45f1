//! Packet output formatting
//!
//! Text mode prints a header line followed by a hex dump, sixteen bytes per
//! line. JSON mode prints one object per packet.

use crossterm::style::Stylize;
use serde::Serialize;

/// Bytes per hex dump line
pub const BYTES_PER_LINE: usize = 16;

/// Output format for packets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Transfer direction as seen from the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Recv,
    Send,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::Recv => "recv",
            Direction::Send => "send",
        }
    }
}

#[derive(Debug, Serialize)]
struct PacketRecord<'a> {
    direction: Direction,
    device: usize,
    len: usize,
    data: &'a str,
}

/// Hex dump lines, `BYTES_PER_LINE` uppercase bytes per line
pub fn hex_lines(data: &[u8]) -> Vec<String> {
    data.chunks(BYTES_PER_LINE)
        .map(|chunk| {
            chunk
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

/// Parse a payload given as hex bytes.
///
/// Accepts space or comma separated tokens (`01 02 ff`, `0x01,0x02`) or one
/// contiguous string (`0102ff`).
pub fn parse_hex_bytes(input: &str) -> Result<Vec<u8>, String> {
    let tokens: Vec<&str> = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    let parse_token = |t: &str| {
        let t = t
            .strip_prefix("0x")
            .or_else(|| t.strip_prefix("0X"))
            .unwrap_or(t);
        u8::from_str_radix(t, 16).map_err(|e| format!("Invalid hex byte '{}': {}", t, e))
    };

    match tokens.as_slice() {
        [] => Ok(Vec::new()),
        [single] if single.len() > 2 && !single.starts_with("0x") && !single.starts_with("0X") => {
            if !single.is_ascii() {
                return Err(format!("Invalid hex string '{}'", single));
            }
            if single.len() % 2 != 0 {
                return Err(format!("Odd number of hex digits in '{}'", single));
            }
            single
                .as_bytes()
                .chunks(2)
                .map(|pair| std::str::from_utf8(pair).map_err(|e| e.to_string()).and_then(parse_token))
                .collect()
        }
        _ => tokens.iter().map(|t| parse_token(t)).collect(),
    }
}

/// Copy `payload` into a zero-filled packet of `size` bytes.
///
/// Bytes beyond `size` are dropped.
pub fn pad_packet(payload: &[u8], size: usize) -> Vec<u8> {
    let mut packet = vec![0u8; size];
    let n = payload.len().min(size);
    packet[..n].copy_from_slice(&payload[..n]);
    packet
}

/// Packet printer
pub struct PacketPrinter {
    format: OutputFormat,
    color: bool,
}

impl PacketPrinter {
    pub fn new(format: OutputFormat, color: bool) -> Self {
        Self { format, color }
    }

    /// Render one packet. Text mode output spans several lines.
    pub fn render(&self, direction: Direction, device: usize, data: &[u8]) -> String {
        match self.format {
            OutputFormat::Text => {
                let header = format!("{} {} bytes (device #{}):", direction.label(), data.len(), device);
                let header = if !self.color {
                    header
                } else {
                    match direction {
                        Direction::Recv => header.green().to_string(),
                        Direction::Send => header.cyan().to_string(),
                    }
                };
                let mut out = header;
                for line in hex_lines(data) {
                    out.push('\n');
                    out.push_str(&line);
                }
                out
            }
            OutputFormat::Json => {
                let hex = hex_lines(data).join(" ");
                let record = PacketRecord {
                    direction,
                    device,
                    len: data.len(),
                    data: &hex,
                };
                serde_json::to_string(&record).unwrap_or_default()
            }
        }
    }

    pub fn print(&self, direction: Direction, device: usize, data: &[u8]) {
        println!("{}", self.render(direction, device, data));
    }
}
