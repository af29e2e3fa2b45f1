// Raw HID tool - shared library
// Configuration and packet formatting used by the `rawhid` binary

pub mod config;
pub mod printer;

pub use config::{ConfigError, Filter, RawHidConfig};
pub use printer::{hex_lines, pad_packet, parse_hex_bytes, Direction, OutputFormat, PacketPrinter};
