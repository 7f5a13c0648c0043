//! The validated, read-only description of the one lease this server hands out.

use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mac::MacAddress;
use crate::packet::DHCP_FILE_SIZE;

/// Lease time advertised in every OFFER and ACK (24 hours).
pub const LEASE_TIME_SECONDS: u32 = 24 * 60 * 60;

/// Boot filename written into the `file` header field.
///
/// A configured name ending in `/` asks for an explicit NUL terminator: the
/// slash is dropped and the byte after the name is forced to zero. Without
/// it, the name may fill the whole 128-byte field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootFile {
    name: String,
    terminated: bool,
}

impl BootFile {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }
}

impl FromStr for BootFile {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let (name, terminated) = match text.strip_suffix('/') {
            Some(name) => (name, true),
            None => (text, false),
        };

        if name.is_empty() {
            return Err(Error::InvalidConfig("boot file name is empty".to_string()));
        }

        if !name.is_ascii() || name.contains('\0') {
            return Err(Error::InvalidConfig(format!(
                "boot file name '{}' must be ASCII without NUL bytes",
                name.escape_default()
            )));
        }

        let capacity = if terminated {
            DHCP_FILE_SIZE - 1
        } else {
            DHCP_FILE_SIZE
        };
        if name.len() > capacity {
            return Err(Error::InvalidConfig(format!(
                "boot file name is {} bytes, the file field holds at most {}",
                name.len(),
                capacity
            )));
        }

        Ok(Self {
            name: name.to_string(),
            terminated,
        })
    }
}

/// Immutable server configuration.
///
/// Built once at startup by [`from_config`](Self::from_config) and then
/// moved into the [`Handshake`](crate::Handshake).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerPolicy {
    /// The only client this server answers.
    pub mac_address: MacAddress,
    /// Local address replies are sent from; also the server identifier.
    pub server_address: Ipv4Addr,
    pub offered_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub gateway: Option<Ipv4Addr>,
    pub boot_file: Option<BootFile>,
}

impl ServerPolicy {
    /// Validates `config` and converts it into a policy.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let boot_file = config
            .boot_file
            .as_deref()
            .map(BootFile::from_str)
            .transpose()?;

        Ok(Self {
            mac_address: config.mac_address,
            server_address: config.bind_address,
            offered_address: config.offered_address,
            subnet_mask: config.subnet_mask,
            gateway: config.gateway,
            boot_file,
        })
    }

    /// Returns true if the offered address shares the server's subnet.
    pub fn offer_on_server_subnet(&self) -> bool {
        let mask = u32::from(self.subnet_mask);
        u32::from(self.offered_address) & mask == u32::from(self.server_address) & mask
    }
}
