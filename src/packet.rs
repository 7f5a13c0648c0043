//! DHCP packet parsing and encoding per RFC 2131.
//!
//! A DHCP packet consists of a fixed 236-byte header followed by a 4-byte
//! magic cookie and variable-length options. This module handles parsing
//! incoming packets and constructing replies.
//!
//! # Packet Structure
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     op (1)    |   htype (1)   |   hlen (1)    |   hops (1)    |
//! +---------------+---------------+---------------+---------------+
//! |                            xid (4)                            |
//! +-------------------------------+-------------------------------+
//! |           secs (2)            |           flags (2)           |
//! +-------------------------------+-------------------------------+
//! |                          ciaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          yiaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          siaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          giaddr (4)                           |
//! +---------------------------------------------------------------+
//! |                          chaddr (16)                          |
//! +---------------------------------------------------------------+
//! |                          sname (64)                           |
//! +---------------------------------------------------------------+
//! |                          file (128)                           |
//! +---------------------------------------------------------------+
//! |                    magic cookie (4) = 99.130.83.99            |
//! +---------------------------------------------------------------+
//! |                          options (variable)                   |
//! +---------------------------------------------------------------+
//! ```
//!
//! Only Ethernet clients are understood. Replies always carry `htype` 1,
//! `hlen` 6, and zero `hops`, `secs`, `flags` and `sname`.
//!
//! # References
//!
//! - RFC 2131: Dynamic Host Configuration Protocol

use std::fmt::Write;
use std::net::Ipv4Addr;

use crate::error::{Error, Result};
use crate::mac::{MAC_LEN, MacAddress};
use crate::options::{DhcpOption, MessageType, OptionCode};

/// DHCP magic cookie that identifies DHCP packets (vs BOOTP).
const DHCP_MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

const DHCP_OP_HTYPE_HLEN_HOPS_SIZE: usize = 4;
const DHCP_XID_SIZE: usize = 4;
const DHCP_SECS_SIZE: usize = 2;
const DHCP_FLAGS_SIZE: usize = 2;
const DHCP_CIADDR_SIZE: usize = 4;
const DHCP_YIADDR_SIZE: usize = 4;
const DHCP_SIADDR_SIZE: usize = 4;
const DHCP_GIADDR_SIZE: usize = 4;
const DHCP_CHADDR_SIZE: usize = 16;
const DHCP_SNAME_SIZE: usize = 64;

/// Size of the legacy `file` header field, which carries the boot filename.
pub const DHCP_FILE_SIZE: usize = 128;

const DHCP_CHADDR_OFFSET: usize = DHCP_OP_HTYPE_HLEN_HOPS_SIZE
    + DHCP_XID_SIZE
    + DHCP_SECS_SIZE
    + DHCP_FLAGS_SIZE
    + DHCP_CIADDR_SIZE
    + DHCP_YIADDR_SIZE
    + DHCP_SIADDR_SIZE
    + DHCP_GIADDR_SIZE;

const DHCP_SNAME_OFFSET: usize = DHCP_CHADDR_OFFSET + DHCP_CHADDR_SIZE;

const DHCP_FILE_OFFSET: usize = DHCP_SNAME_OFFSET + DHCP_SNAME_SIZE;

const DHCP_MAGIC_COOKIE_OFFSET: usize = DHCP_FILE_OFFSET + DHCP_FILE_SIZE;

/// Size of the fixed header portion including magic cookie.
pub const DHCP_FIXED_HEADER_SIZE: usize = DHCP_MAGIC_COOKIE_OFFSET + DHCP_MAGIC_COOKIE.len();

/// Initial capacity for packet encoding buffer.
///
/// 576 bytes is the minimum MTU that all hosts must accept per RFC 791.
const DHCP_ENCODE_CAPACITY: usize = 576;

/// BOOTP/DHCP operation code for client requests.
pub const BOOTREQUEST: u8 = 1;

/// BOOTP/DHCP operation code for server replies.
pub const BOOTREPLY: u8 = 2;

/// Hardware type for Ethernet.
pub const HTYPE_ETHERNET: u8 = 1;

/// Hardware address length for Ethernet (6 bytes).
pub const HLEN_ETHERNET: u8 = MAC_LEN as u8;

/// Bytes per row in [`hex_dump`] output.
const HEX_DUMP_ROW: usize = 32;

/// A parsed DHCP packet.
///
/// This struct represents both client requests and server replies.
/// Use [`parse`](Self::parse) to parse incoming packets and
/// [`create_reply`](Self::create_reply) to construct responses.
///
/// Header fields the server never varies (`htype`, `hlen`, `hops`, `secs`,
/// `flags`, `sname`) are not stored; [`encode`](Self::encode) writes them
/// with their fixed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpPacket {
    /// Operation code: [`BOOTREQUEST`] (1) or [`BOOTREPLY`] (2).
    pub op: u8,

    /// Transaction ID chosen by client, echoed in replies.
    pub xid: u32,

    /// Client IP address (set by a client that already owns an address).
    pub ciaddr: Ipv4Addr,

    /// "Your" IP address - the address being assigned to the client.
    pub yiaddr: Ipv4Addr,

    /// Server IP address (next server for PXE booting).
    pub siaddr: Ipv4Addr,

    /// Gateway IP address - set by relay agents.
    pub giaddr: Ipv4Addr,

    /// Client hardware address.
    pub chaddr: MacAddress,

    /// Boot file name field, zero-filled when unused.
    pub file: [u8; DHCP_FILE_SIZE],

    /// DHCP options in wire order.
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Parses a DHCP packet from raw bytes.
    ///
    /// Bytes after the End option are ignored, so padded datagrams are
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPacket`] if:
    /// - Packet is shorter than 240 bytes (fixed header + magic cookie)
    /// - Magic cookie is invalid (not 99.130.83.99)
    /// - Hardware type/length is not Ethernet/6
    /// - An option is truncated (missing length byte or data)
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < DHCP_FIXED_HEADER_SIZE {
            return Err(Error::InvalidPacket(format!(
                "Packet too short: {} bytes (minimum {})",
                data.len(),
                DHCP_FIXED_HEADER_SIZE
            )));
        }

        let magic_cookie = &data[DHCP_MAGIC_COOKIE_OFFSET..DHCP_FIXED_HEADER_SIZE];
        if magic_cookie != DHCP_MAGIC_COOKIE {
            return Err(Error::InvalidPacket("Invalid magic cookie".to_string()));
        }

        let op = data[0];
        let htype = data[1];
        let hlen = data[2];

        if htype != HTYPE_ETHERNET || hlen != HLEN_ETHERNET {
            return Err(Error::InvalidPacket(format!(
                "Unsupported hardware type {} / length {} (expected {} / {})",
                htype, hlen, HTYPE_ETHERNET, HLEN_ETHERNET
            )));
        }

        let xid = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

        let ciaddr = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
        let yiaddr = Ipv4Addr::new(data[16], data[17], data[18], data[19]);
        let siaddr = Ipv4Addr::new(data[20], data[21], data[22], data[23]);
        let giaddr = Ipv4Addr::new(data[24], data[25], data[26], data[27]);

        let chaddr = MacAddress::try_from(&data[DHCP_CHADDR_OFFSET..DHCP_CHADDR_OFFSET + MAC_LEN])?;

        let mut file = [0u8; DHCP_FILE_SIZE];
        file.copy_from_slice(&data[DHCP_FILE_OFFSET..DHCP_FILE_OFFSET + DHCP_FILE_SIZE]);

        let options = Self::parse_options(&data[DHCP_FIXED_HEADER_SIZE..])?;

        Ok(Self {
            op,
            xid,
            ciaddr,
            yiaddr,
            siaddr,
            giaddr,
            chaddr,
            file,
            options,
        })
    }

    fn parse_options(data: &[u8]) -> Result<Vec<DhcpOption>> {
        let mut options = Vec::new();
        let mut index = 0;

        while index < data.len() {
            let code = data[index];

            if code == OptionCode::Pad as u8 {
                index += 1;
                continue;
            }

            if code == OptionCode::End as u8 {
                break;
            }

            if index + 1 >= data.len() {
                return Err(Error::InvalidPacket(format!(
                    "Option {} length missing",
                    code
                )));
            }

            let length = data[index + 1] as usize;

            if index + 2 + length > data.len() {
                return Err(Error::InvalidPacket(format!(
                    "Option {} data truncated: declared {} bytes, {} available",
                    code,
                    length,
                    data.len() - index - 2
                )));
            }

            let option_data = &data[index + 2..index + 2 + length];
            options.push(DhcpOption::parse(code, option_data));

            index += 2 + length;
        }

        Ok(options)
    }

    /// Encodes the packet to bytes for transmission.
    ///
    /// Options are written in order, followed by a single End marker. No
    /// padding is appended.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOption`] if any option has no faithful wire
    /// form; see [`DhcpOption::encode`].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut packet = Vec::with_capacity(DHCP_ENCODE_CAPACITY);

        packet.push(self.op);
        packet.push(HTYPE_ETHERNET);
        packet.push(HLEN_ETHERNET);
        packet.push(0);

        packet.extend_from_slice(&self.xid.to_be_bytes());
        packet.extend_from_slice(&[0u8; DHCP_SECS_SIZE + DHCP_FLAGS_SIZE]);

        packet.extend_from_slice(&self.ciaddr.octets());
        packet.extend_from_slice(&self.yiaddr.octets());
        packet.extend_from_slice(&self.siaddr.octets());
        packet.extend_from_slice(&self.giaddr.octets());

        let mut chaddr = [0u8; DHCP_CHADDR_SIZE];
        chaddr[..MAC_LEN].copy_from_slice(&self.chaddr.octets());
        packet.extend_from_slice(&chaddr);
        packet.extend_from_slice(&[0u8; DHCP_SNAME_SIZE]);
        packet.extend_from_slice(&self.file);

        packet.extend_from_slice(&DHCP_MAGIC_COOKIE);

        for option in &self.options {
            packet.extend_from_slice(&option.encode()?);
        }

        packet.push(OptionCode::End as u8);

        Ok(packet)
    }

    /// Returns the DHCP message type (Option 53) if present.
    ///
    /// Only the first Option 53 counts; if it is malformed the packet has no
    /// usable message type.
    pub fn message_type(&self) -> Option<MessageType> {
        match self.find(OptionCode::MessageType)? {
            DhcpOption::MessageType(t) => Some(*t),
            _ => None,
        }
    }

    /// Returns the server identifier (Option 54) if present.
    pub fn server_identifier(&self) -> Option<Ipv4Addr> {
        match self.find(OptionCode::ServerIdentifier)? {
            DhcpOption::ServerIdentifier(ip) => Some(*ip),
            _ => None,
        }
    }

    /// Returns the lease time (Option 51) if present.
    pub fn lease_time(&self) -> Option<u32> {
        match self.find(OptionCode::LeaseTime)? {
            DhcpOption::LeaseTime(time) => Some(*time),
            _ => None,
        }
    }

    /// Returns the subnet mask (Option 1) if present.
    pub fn subnet_mask(&self) -> Option<Ipv4Addr> {
        match self.find(OptionCode::SubnetMask)? {
            DhcpOption::SubnetMask(mask) => Some(*mask),
            _ => None,
        }
    }

    /// Returns the default gateway, the first address of Option 3.
    pub fn router(&self) -> Option<Ipv4Addr> {
        match self.find(OptionCode::Router)? {
            DhcpOption::Router(routers) => routers.first().copied(),
            _ => None,
        }
    }

    fn find(&self, code: OptionCode) -> Option<&DhcpOption> {
        self.options
            .iter()
            .find(|opt| opt.option_code() == code as u8)
    }

    /// Creates a reply packet (OFFER or ACK) from a request.
    ///
    /// `xid`, `giaddr` and `chaddr` are copied from the request. The message
    /// type is expected to be among `options`.
    pub fn create_reply(
        request: &DhcpPacket,
        your_ip: Ipv4Addr,
        server_ip: Ipv4Addr,
        file: [u8; DHCP_FILE_SIZE],
        options: Vec<DhcpOption>,
    ) -> Self {
        Self {
            op: BOOTREPLY,
            xid: request.xid,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: your_ip,
            siaddr: server_ip,
            giaddr: request.giaddr,
            chaddr: request.chaddr,
            file,
            options,
        }
    }
}

/// Formats a datagram as rows of hex bytes prefixed with their decimal offset.
///
/// ```text
/// 0000 : 01 01 06 00 ...
/// 0032 : ...
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    if data.is_empty() {
        return "<empty packet>".to_string();
    }

    let mut result = String::with_capacity(data.len() * 3 + data.len() / HEX_DUMP_ROW * 8);
    for (row, chunk) in data.chunks(HEX_DUMP_ROW).enumerate() {
        if row > 0 {
            result.push('\n');
        }
        let _ = write!(result, "{:04} :", row * HEX_DUMP_ROW);
        for byte in chunk {
            let _ = write!(result, " {:02X}", byte);
        }
    }
    result
}
