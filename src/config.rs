//! Configuration for the rawhid tool
//!
//! Stored as TOML. Every filter field accepts a number (decimal or TOML hex
//! literal) or the string `"any"`; the defaults identify the Teensy raw HID
//! example firmware.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rawhid_transport::MatchCriteria;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Teensy raw HID example identity
pub mod teensy {
    pub const VENDOR_ID: u32 = 0x16C0;
    pub const PRODUCT_ID: u32 = 0x0480;
    pub const USAGE_PAGE: u32 = 0xFFAB;
    pub const USAGE: u32 = 0x0200;
}

/// Errors loading, saving or applying the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{field} = {value:#X} does not fit in 16 bits")]
    OutOfRange { field: &'static str, value: u32 },
}

/// One discovery filter value. `None` matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filter(pub Option<u32>);

impl Filter {
    pub const ANY: Filter = Filter(None);

    pub fn id(value: u32) -> Self {
        Filter(Some(value))
    }

    /// Zero and negative values are wildcards
    fn from_signed(value: i64) -> Option<Self> {
        match value {
            v if v <= 0 => Some(Filter::ANY),
            v => u32::try_from(v).ok().map(Filter::id),
        }
    }

    /// Narrow to a 16-bit USB ID
    fn as_u16(&self, field: &'static str) -> Result<Option<u16>, ConfigError> {
        match self.0 {
            None => Ok(None),
            Some(v) => u16::try_from(v)
                .map(Some)
                .map_err(|_| ConfigError::OutOfRange { field, value: v }),
        }
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "any" | "*" => Ok(Filter::ANY),
            lower => {
                let parsed = match lower.strip_prefix("0x") {
                    Some(hex) => i64::from_str_radix(hex, 16),
                    None => lower.parse::<i64>(),
                };
                let value = parsed.map_err(|e| format!("Invalid ID '{}': {}", s, e))?;
                Filter::from_signed(value).ok_or_else(|| format!("ID out of range: {}", s))
            }
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => write!(f, "any"),
            Some(v) => write!(f, "0x{:04X}", v),
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            None => s.serialize_str("any"),
            Some(v) => s.serialize_u32(v),
        }
    }
}

/// Accepts an integer (zero or negative meaning any) or a string (`"any"`,
/// `"0x16c0"`).
impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Str(String),
        }

        match Raw::deserialize(d)? {
            Raw::Int(v) => Filter::from_signed(v)
                .ok_or_else(|| serde::de::Error::custom(format!("ID out of range: {}", v))),
            Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawHidConfig {
    pub vendor_id: Filter,
    pub product_id: Filter,
    pub usage_page: Filter,
    pub usage: Filter,
    /// Maximum devices to open in `list`
    pub max_devices: usize,
    /// Packet size in bytes
    pub packet_size: usize,
    /// Receive timeout (ms)
    pub timeout_ms: u32,
    /// Send timeout (ms)
    pub send_timeout_ms: u32,
}

impl Default for RawHidConfig {
    fn default() -> Self {
        Self {
            vendor_id: Filter::id(teensy::VENDOR_ID),
            product_id: Filter::id(teensy::PRODUCT_ID),
            usage_page: Filter::id(teensy::USAGE_PAGE),
            usage: Filter::id(teensy::USAGE),
            max_devices: 1,
            packet_size: rawhid_transport::protocol::DEFAULT_PACKET_SIZE,
            timeout_ms: 220,
            send_timeout_ms: 100,
        }
    }
}

impl RawHidConfig {
    /// `~/.config/rawhid/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rawhid")
            .join("config.toml")
    }

    /// Load config from a file, or return default if not found
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save config to a file, creating the parent directory
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_err)
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        vendor_id: Option<Filter>,
        product_id: Option<Filter>,
        usage_page: Option<Filter>,
        usage: Option<Filter>,
    ) -> Self {
        if let Some(f) = vendor_id {
            self.vendor_id = f;
        }
        if let Some(f) = product_id {
            self.product_id = f;
        }
        if let Some(f) = usage_page {
            self.usage_page = f;
        }
        if let Some(f) = usage {
            self.usage = f;
        }
        self
    }

    /// Discovery filters described by this config
    pub fn criteria(&self) -> Result<MatchCriteria, ConfigError> {
        Ok(MatchCriteria {
            vendor_id: self.vendor_id.as_u16("vendor_id")?,
            product_id: self.product_id.as_u16("product_id")?,
            usage_page: self.usage_page.0,
            usage: self.usage.0,
        })
    }
}
