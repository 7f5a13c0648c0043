//! DHCP options as defined in RFC 2132.
//!
//! Each option has a code (1 byte), length (1 byte), and variable-length data.
//!
//! Only the handful of options this server reads or writes get their own
//! variant. Everything else, including a known code whose payload has the
//! wrong length, is preserved as [`DhcpOption::Unknown`] so decoding never
//! fails on a well-formed TLV stream.
//!
//! # References
//!
//! - RFC 2132: DHCP Options and BOOTP Vendor Extensions

use std::net::Ipv4Addr;

use crate::error::{Error, Result};

/// Maximum number of IP addresses in a Router (3) option.
///
/// Options have a 1-byte length field, so maximum data is 255 bytes.
/// With 4 bytes per IPv4 address, that's 63 addresses maximum.
const MAX_ADDRESSES_PER_OPTION: usize = 63;

/// Maximum payload of a single option.
const MAX_OPTION_DATA: usize = u8::MAX as usize;

/// DHCP option codes used by this implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OptionCode {
    /// Padding (no operation). Used for alignment.
    Pad = 0,
    /// Subnet mask (RFC 2132 §3.3).
    SubnetMask = 1,
    /// Router/gateway addresses (RFC 2132 §3.5).
    Router = 3,
    /// IP address lease time in seconds (RFC 2132 §9.2).
    LeaseTime = 51,
    /// DHCP message type (RFC 2132 §9.6).
    MessageType = 53,
    /// Server identifier (RFC 2132 §9.7).
    ServerIdentifier = 54,
    /// End of options marker.
    End = 255,
}

impl TryFrom<u8> for OptionCode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Pad),
            1 => Ok(Self::SubnetMask),
            3 => Ok(Self::Router),
            51 => Ok(Self::LeaseTime),
            53 => Ok(Self::MessageType),
            54 => Ok(Self::ServerIdentifier),
            255 => Ok(Self::End),
            other => Err(other),
        }
    }
}

/// DHCP message types (Option 53) as defined in RFC 2132 §9.6.
///
/// The server answers only [`Discover`](Self::Discover) and
/// [`Request`](Self::Request); the rest are recognised so they can be
/// logged before being ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    /// Client broadcast to locate servers.
    Discover = 1,
    /// Server response to DISCOVER with IP offer.
    Offer = 2,
    /// Client request for offered parameters.
    Request = 3,
    /// Client indicates address is already in use.
    Decline = 4,
    /// Server acknowledgement with configuration.
    Ack = 5,
    /// Server negative acknowledgement.
    Nak = 6,
    /// Client releases IP address.
    Release = 7,
    /// Client requests config without IP allocation.
    Inform = 8,
}

impl TryFrom<u8> for MessageType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Discover),
            2 => Ok(Self::Offer),
            3 => Ok(Self::Request),
            4 => Ok(Self::Decline),
            5 => Ok(Self::Ack),
            6 => Ok(Self::Nak),
            7 => Ok(Self::Release),
            8 => Ok(Self::Inform),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discover => write!(f, "DISCOVER"),
            Self::Offer => write!(f, "OFFER"),
            Self::Request => write!(f, "REQUEST"),
            Self::Decline => write!(f, "DECLINE"),
            Self::Ack => write!(f, "ACK"),
            Self::Nak => write!(f, "NAK"),
            Self::Release => write!(f, "RELEASE"),
            Self::Inform => write!(f, "INFORM"),
        }
    }
}

/// A parsed DHCP option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpOption {
    /// Subnet mask (Option 1).
    SubnetMask(Ipv4Addr),
    /// Router/gateway addresses (Option 3). First address is the default gateway.
    Router(Vec<Ipv4Addr>),
    /// Lease time in seconds (Option 51).
    LeaseTime(u32),
    /// DHCP message type (Option 53).
    MessageType(MessageType),
    /// Server identifier - IP of the DHCP server (Option 54).
    ServerIdentifier(Ipv4Addr),
    /// Any other option, or a known code with a malformed payload, kept as
    /// raw code and data.
    Unknown(u8, Vec<u8>),
}

fn ipv4_from(data: &[u8]) -> Option<Ipv4Addr> {
    let octets: [u8; 4] = data.try_into().ok()?;
    Some(Ipv4Addr::from(octets))
}

impl DhcpOption {
    /// Returns the RFC 2132 option code for this option.
    pub fn option_code(&self) -> u8 {
        match self {
            Self::SubnetMask(_) => OptionCode::SubnetMask as u8,
            Self::Router(_) => OptionCode::Router as u8,
            Self::LeaseTime(_) => OptionCode::LeaseTime as u8,
            Self::MessageType(_) => OptionCode::MessageType as u8,
            Self::ServerIdentifier(_) => OptionCode::ServerIdentifier as u8,
            Self::Unknown(code, _) => *code,
        }
    }

    /// Parses a DHCP option from its code and raw data.
    ///
    /// Never fails: payloads that don't fit the typed variant fall back to
    /// [`Unknown`](Self::Unknown) with the original bytes.
    pub fn parse(code: u8, data: &[u8]) -> Self {
        let typed = match OptionCode::try_from(code) {
            Ok(OptionCode::SubnetMask) => ipv4_from(data).map(Self::SubnetMask),
            Ok(OptionCode::Router) => {
                if data.is_empty() || !data.len().is_multiple_of(4) {
                    None
                } else {
                    let routers = data
                        .chunks_exact(4)
                        .map(|chunk| Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]))
                        .collect();
                    Some(Self::Router(routers))
                }
            }
            Ok(OptionCode::LeaseTime) => data
                .try_into()
                .ok()
                .map(|bytes: [u8; 4]| Self::LeaseTime(u32::from_be_bytes(bytes))),
            Ok(OptionCode::MessageType) => match data {
                [value] => MessageType::try_from(*value).ok().map(Self::MessageType),
                _ => None,
            },
            Ok(OptionCode::ServerIdentifier) => ipv4_from(data).map(Self::ServerIdentifier),
            Ok(OptionCode::Pad) | Ok(OptionCode::End) | Err(_) => None,
        };

        typed.unwrap_or_else(|| Self::Unknown(code, data.to_vec()))
    }

    /// Encodes the option to its wire format (code + length + data).
    ///
    /// The returned bytes can be directly appended to a DHCP packet's
    /// options section.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] for anything that would not decode
    /// back to the same option: a Pad or End code, an empty Router list,
    /// more than 63 routers, or a payload longer than 255 bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let encoded = match self {
            Self::SubnetMask(addr) => {
                let mut result = vec![OptionCode::SubnetMask as u8, 4];
                result.extend_from_slice(&addr.octets());
                result
            }
            Self::Router(addrs) => {
                if addrs.is_empty() || addrs.len() > MAX_ADDRESSES_PER_OPTION {
                    return Err(Error::InvalidOption(format!(
                        "Router needs 1 to {} addresses, got {}",
                        MAX_ADDRESSES_PER_OPTION,
                        addrs.len()
                    )));
                }
                let mut result = vec![OptionCode::Router as u8, (addrs.len() * 4) as u8];
                for addr in addrs {
                    result.extend_from_slice(&addr.octets());
                }
                result
            }
            Self::LeaseTime(time) => {
                let mut result = vec![OptionCode::LeaseTime as u8, 4];
                result.extend_from_slice(&time.to_be_bytes());
                result
            }
            Self::MessageType(msg_type) => {
                vec![OptionCode::MessageType as u8, 1, *msg_type as u8]
            }
            Self::ServerIdentifier(addr) => {
                let mut result = vec![OptionCode::ServerIdentifier as u8, 4];
                result.extend_from_slice(&addr.octets());
                result
            }
            Self::Unknown(code, data) => {
                if matches!(
                    OptionCode::try_from(*code),
                    Ok(OptionCode::Pad | OptionCode::End)
                ) {
                    return Err(Error::InvalidOption(format!(
                        "code {} is framing, not an option",
                        code
                    )));
                }
                let len = u8::try_from(data.len()).map_err(|_| {
                    Error::InvalidOption(format!(
                        "option {} carries {} bytes, limit is {}",
                        code,
                        data.len(),
                        MAX_OPTION_DATA
                    ))
                })?;
                let mut result = vec![*code, len];
                result.extend_from_slice(data);
                result
            }
        };

        Ok(encoded)
    }
}
