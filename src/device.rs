//! Device profile, USB identity and protocol limits of an IR controller model
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CAPACITY, DEFAULT_FREQUENCY, RECEIVE_TIMEOUT_SECS};
use crate::error::{Error, Result};

/// Carrier frequency limits, in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRange {
    pub default: u32,
    pub min: u32,
    pub max: u32,
}

impl Default for FrequencyRange {
    fn default() -> Self {
        FrequencyRange {
            default: DEFAULT_FREQUENCY,
            min: 25_000,
            max: 50_000,
        }
    }
}

/// Represents an IR controller model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub name: String,
    #[serde(deserialize_with = "parse_hex_or_decimal")]
    pub vendor_id: u16,
    #[serde(deserialize_with = "parse_hex_or_decimal")]
    pub product_id: u16,
    pub interface: u8,
    #[serde(deserialize_with = "parse_hex_or_decimal")]
    pub endpoint_in: u8,
    #[serde(deserialize_with = "parse_hex_or_decimal")]
    pub endpoint_out: u8,

    #[serde(default)]
    pub frequency: FrequencyRange,
    /// Waveform buffer size in entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_receive_timeout")]
    pub receive_timeout_secs: u64,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_receive_timeout() -> u64 {
    RECEIVE_TIMEOUT_SECS
}

impl ::std::fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        write!(
            f,
            "{}({:04x}:{:04x})",
            self.name, self.vendor_id, self.product_id,
        )
    }
}

impl DeviceProfile {
    /// The built-in ADIR01P profile.
    pub fn adir01p() -> Result<Self> {
        Ok(serde_yaml::from_str(include_str!("../devices/adir01p.yaml"))?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let raw = std::fs::read_to_string(p)?;
        let profile: DeviceProfile = serde_yaml::from_str(&raw)?;
        log::info!("Loaded device profile {} from {}", profile, p.display());
        Ok(profile)
    }

    /// Validate a carrier frequency and narrow it to its 16-bit wire form.
    pub fn check_frequency(&self, frequency: u32) -> Result<u16> {
        let range = &self.frequency;
        if frequency < range.min || frequency > range.max {
            return Err(Error::InvalidFrequency {
                frequency,
                min: range.min,
                max: range.max,
            });
        }
        u16::try_from(frequency).map_err(|_| Error::InvalidFrequency {
            frequency,
            min: range.min,
            max: range.max.min(u16::MAX as u32),
        })
    }
}

/// Accepts `0x22ea`-style strings as well as plain integers.
fn parse_hex_or_decimal<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: TryFrom<u64>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    let value = match Raw::deserialize(deserializer)? {
        Raw::Int(n) => n,
        Raw::Str(s) => {
            let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                u64::from_str_radix(hex, 16)
            } else {
                s.parse()
            };
            parsed.map_err(|_| {
                serde::de::Error::custom(format!("error while parsing {:?}", s))
            })?
        }
    };
    T::try_from(value)
        .map_err(|_| serde::de::Error::custom(format!("{:#x} out of range", value)))
}
