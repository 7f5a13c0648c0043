//! The DISCOVER→OFFER / REQUEST→ACK handshake for the one configured client.
//!
//! The handshake is stateless between datagrams: each inbound message is
//! judged on its own, and the only thing carried into the reply is the
//! request's transaction ID and hardware address. Anything that is not a
//! DISCOVER or REQUEST from the target MAC is silently ignored. There is
//! no NAK, so the server stays invisible to every other device on the
//! segment.

use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::builder::{boot_file_field, reply_options};
use crate::error::Result;
use crate::options::MessageType;
use crate::packet::{BOOTREQUEST, DhcpPacket};
use crate::policy::ServerPolicy;
use crate::transport::Destination;

/// An outbound message and where to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub packet: DhcpPacket,
    pub destination: Destination,
}

/// Answers DHCP requests from the single client named by a [`ServerPolicy`].
pub struct Handshake {
    policy: ServerPolicy,
}

impl Handshake {
    pub fn new(policy: ServerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ServerPolicy {
        &self.policy
    }

    /// Decodes `data` and answers it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPacket`](crate::Error::InvalidPacket) if the
    /// datagram cannot be decoded. The caller drops it and keeps listening.
    pub fn handle_datagram(&self, data: &[u8]) -> Result<Option<Reply>> {
        let request = DhcpPacket::parse(data)?;
        Ok(self.respond(&request))
    }

    /// Returns the reply to `request`, or `None` if it is to be ignored.
    pub fn respond(&self, request: &DhcpPacket) -> Option<Reply> {
        if request.op != BOOTREQUEST {
            debug!("Ignoring non-request op {} from {}", request.op, request.chaddr);
            return None;
        }

        if request.chaddr != self.policy.mac_address {
            debug!(
                "Ignoring packet from {}: not {}",
                request.chaddr, self.policy.mac_address
            );
            return None;
        }

        let Some(message_type) = request.message_type() else {
            debug!("Ignoring packet from {}: no DHCP message type", request.chaddr);
            return None;
        };

        let reply_type = match message_type {
            MessageType::Discover => MessageType::Offer,
            MessageType::Request => MessageType::Ack,
            other => {
                debug!("Ignoring {} from {}: not supported", other, request.chaddr);
                return None;
            }
        };

        info!(
            "{} from {} (xid {:#010x})",
            message_type, request.chaddr, request.xid
        );

        let packet = DhcpPacket::create_reply(
            request,
            self.policy.offered_address,
            self.policy.server_address,
            boot_file_field(&self.policy),
            reply_options(&self.policy, reply_type),
        );

        let destination = if request.ciaddr == Ipv4Addr::UNSPECIFIED {
            Destination::Broadcast
        } else {
            Destination::Unicast(request.ciaddr)
        };

        Some(Reply {
            packet,
            destination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mac::MacAddress;
    use crate::options::DhcpOption;
    use crate::packet::{BOOTREPLY, DHCP_FILE_SIZE};
    use crate::policy::LEASE_TIME_SECONDS;

    const TARGET_MAC: [u8; 6] = [0xb8, 0x27, 0xeb, 0xc3, 0x27, 0xb5];
    const OTHER_MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];

    fn test_policy() -> ServerPolicy {
        ServerPolicy {
            mac_address: MacAddress::new(TARGET_MAC),
            server_address: Ipv4Addr::new(192, 168, 1, 53),
            offered_address: Ipv4Addr::new(192, 168, 1, 100),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: None,
            boot_file: None,
        }
    }

    fn request(message_type: MessageType, mac: [u8; 6], xid: u32) -> DhcpPacket {
        DhcpPacket {
            op: BOOTREQUEST,
            xid,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: MacAddress::new(mac),
            file: [0u8; DHCP_FILE_SIZE],
            options: vec![DhcpOption::MessageType(message_type)],
        }
    }

    #[test]
    fn test_discover_gets_offer() {
        let handshake = Handshake::new(test_policy());
        let reply = handshake
            .respond(&request(MessageType::Discover, TARGET_MAC, 0x1234))
            .unwrap();

        assert_eq!(reply.destination, Destination::Broadcast);
        assert_eq!(reply.packet.op, BOOTREPLY);
        assert_eq!(reply.packet.xid, 0x1234);
        assert_eq!(reply.packet.chaddr, MacAddress::new(TARGET_MAC));
        assert_eq!(reply.packet.yiaddr, Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(reply.packet.siaddr, Ipv4Addr::new(192, 168, 1, 53));
        assert_eq!(reply.packet.message_type(), Some(MessageType::Offer));
        assert_eq!(
            reply.packet.server_identifier(),
            Some(Ipv4Addr::new(192, 168, 1, 53))
        );
    }

    #[test]
    fn test_request_gets_ack() {
        let handshake = Handshake::new(test_policy());
        let reply = handshake
            .respond(&request(MessageType::Request, TARGET_MAC, 0x5678))
            .unwrap();

        assert_eq!(reply.packet.xid, 0x5678);
        assert_eq!(reply.packet.message_type(), Some(MessageType::Ack));
        assert_eq!(reply.packet.yiaddr, Ipv4Addr::new(192, 168, 1, 100));
        assert_eq!(reply.packet.lease_time(), Some(LEASE_TIME_SECONDS));
    }

    #[test]
    fn test_other_mac_ignored() {
        let handshake = Handshake::new(test_policy());
        assert!(
            handshake
                .respond(&request(MessageType::Discover, OTHER_MAC, 1))
                .is_none()
        );
        assert!(
            handshake
                .respond(&request(MessageType::Request, OTHER_MAC, 1))
                .is_none()
        );
    }

    #[test]
    fn test_unsupported_types_ignored() {
        let handshake = Handshake::new(test_policy());
        for message_type in [
            MessageType::Decline,
            MessageType::Release,
            MessageType::Inform,
            MessageType::Offer,
            MessageType::Ack,
            MessageType::Nak,
        ] {
            assert!(
                handshake
                    .respond(&request(message_type, TARGET_MAC, 1))
                    .is_none(),
                "{} was answered",
                message_type
            );
        }
    }

    #[test]
    fn test_missing_message_type_ignored() {
        let handshake = Handshake::new(test_policy());
        let mut bootp = request(MessageType::Discover, TARGET_MAC, 1);
        bootp.options.clear();
        assert!(handshake.respond(&bootp).is_none());
    }

    #[test]
    fn test_boot_reply_ignored() {
        let handshake = Handshake::new(test_policy());
        let mut packet = request(MessageType::Discover, TARGET_MAC, 1);
        packet.op = BOOTREPLY;
        assert!(handshake.respond(&packet).is_none());
    }

    #[test]
    fn test_repeated_discover_gets_identical_offer() {
        let handshake = Handshake::new(test_policy());
        let discover = request(MessageType::Discover, TARGET_MAC, 42);
        assert_eq!(handshake.respond(&discover), handshake.respond(&discover));
    }

    #[test]
    fn test_client_with_address_gets_unicast() {
        let handshake = Handshake::new(test_policy());
        let mut renewing = request(MessageType::Request, TARGET_MAC, 7);
        renewing.ciaddr = Ipv4Addr::new(192, 168, 1, 100);

        let reply = handshake.respond(&renewing).unwrap();
        assert_eq!(
            reply.destination,
            Destination::Unicast(Ipv4Addr::new(192, 168, 1, 100))
        );
        assert_eq!(reply.packet.ciaddr, Ipv4Addr::UNSPECIFIED);
    }

    #[test]
    fn test_reply_carries_boot_file_and_gateway() {
        let policy = ServerPolicy {
            gateway: Some(Ipv4Addr::new(192, 168, 1, 254)),
            boot_file: Some("pxelinux.0".parse().unwrap()),
            ..test_policy()
        };
        let handshake = Handshake::new(policy);
        let reply = handshake
            .respond(&request(MessageType::Discover, TARGET_MAC, 1))
            .unwrap();

        assert_eq!(&reply.packet.file[..10], b"pxelinux.0");
        assert_eq!(reply.packet.router(), Some(Ipv4Addr::new(192, 168, 1, 254)));
    }

    #[test]
    fn test_handle_datagram_rejects_garbage() {
        let handshake = Handshake::new(test_policy());
        assert!(handshake.handle_datagram(&[0u8; 64]).is_err());
    }

    #[test]
    fn test_handle_datagram_decodes_and_responds() {
        let handshake = Handshake::new(test_policy());
        let data = request(MessageType::Discover, TARGET_MAC, 9)
            .encode()
            .unwrap();
        let reply = handshake.handle_datagram(&data).unwrap().unwrap();
        assert_eq!(reply.packet.message_type(), Some(MessageType::Offer));
    }
}
