//! Ethernet hardware addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Length of an Ethernet MAC address in bytes.
pub const MAC_LEN: usize = 6;

/// A 6-byte Ethernet MAC address.
///
/// Parsed from and displayed as colon-separated hex (`b8:27:eb:c3:27:b5`).
/// Parsing is case-insensitive; display is always lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; MAC_LEN]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; MAC_LEN] {
        self.0
    }
}

impl From<[u8; MAC_LEN]> for MacAddress {
    fn from(octets: [u8; MAC_LEN]) -> Self {
        Self(octets)
    }
}

impl TryFrom<&[u8]> for MacAddress {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let octets: [u8; MAC_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidAddress(format!(
                "MAC address must be {} bytes, got {}",
                MAC_LEN,
                bytes.len()
            ))
        })?;
        Ok(Self(octets))
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.trim().split(':').collect();
        if parts.len() != MAC_LEN {
            return Err(Error::InvalidAddress(format!(
                "MAC address '{}' must have {} colon-separated octets",
                text, MAC_LEN
            )));
        }

        let mut octets = [0u8; MAC_LEN];
        for (octet, part) in octets.iter_mut().zip(&parts) {
            let well_formed = (1..=2).contains(&part.len())
                && part.bytes().all(|byte| byte.is_ascii_hexdigit());
            *octet = well_formed
                .then(|| u8::from_str_radix(part, 16).ok())
                .flatten()
                .ok_or_else(|| {
                    Error::InvalidAddress(format!(
                        "Bad octet '{}' in MAC address '{}'",
                        part, text
                    ))
                })?;
        }

        Ok(Self(octets))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(text: String) -> Result<Self> {
        text.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a, b, c, d, e, g
        )
    }
}
