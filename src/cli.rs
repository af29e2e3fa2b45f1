// CLI definitions using clap

use clap::{Parser, Subcommand};
use rawhid::config::Filter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rawhid")]
#[command(author, version, about = "Talk to raw HID USB devices over libusb")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: ~/.config/rawhid/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Vendor ID filter (hex, decimal or "any")
    #[arg(long, global = true, value_name = "ID")]
    pub vid: Option<Filter>,

    /// Product ID filter (hex, decimal or "any")
    #[arg(long, global = true, value_name = "ID")]
    pub pid: Option<Filter>,

    /// Top-level usage page filter (hex, decimal or "any")
    #[arg(long, global = true, value_name = "ID")]
    pub usage_page: Option<Filter>,

    /// Top-level usage filter (hex, decimal or "any")
    #[arg(long, global = true, value_name = "ID")]
    pub usage: Option<Filter>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count attached devices matching the VID/PID filters
    #[command(visible_aliases = ["count", "s"])]
    Scan,

    /// Open matching raw HID interfaces and list them
    #[command(visible_aliases = ["ls", "l"])]
    List {
        /// Maximum number of devices to open (default from config)
        #[arg(short, long)]
        max: Option<usize>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print every packet received from the first matching device
    #[command(visible_aliases = ["recv", "monitor"])]
    Listen {
        /// Print packets as JSON lines
        #[arg(long)]
        json: bool,

        /// Stop after this many packets
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Send one packet (hex bytes, zero padded to the packet size)
    #[command(visible_aliases = ["tx"])]
    Send {
        /// Payload bytes, e.g. `01 02 ff` or `0102ff`
        #[arg(required = true, num_args = 1..)]
        bytes: Vec<String>,
    },

    /// Send each stdin line as a packet and print the reply
    Echo {
        /// Print packets as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    #[command(visible_aliases = ["cfg"])]
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}
