//! Builds the options and boot-file field of OFFER and ACK replies.
//!
//! Option order is fixed: message type, server identifier, lease time,
//! subnet mask, then router when a gateway is configured. Some PXE ROMs are
//! picky about this, so present options always keep this relative order.

use crate::options::{DhcpOption, MessageType};
use crate::packet::DHCP_FILE_SIZE;
use crate::policy::{LEASE_TIME_SECONDS, ServerPolicy};

/// Returns the ordered reply options for `message_type` (OFFER or ACK).
pub fn reply_options(policy: &ServerPolicy, message_type: MessageType) -> Vec<DhcpOption> {
    let mut options = vec![
        DhcpOption::MessageType(message_type),
        DhcpOption::ServerIdentifier(policy.server_address),
        DhcpOption::LeaseTime(LEASE_TIME_SECONDS),
        DhcpOption::SubnetMask(policy.subnet_mask),
    ];

    if let Some(gateway) = policy.gateway {
        options.push(DhcpOption::Router(vec![gateway]));
    }

    options
}

/// Returns the 128-byte `file` header field for the policy's boot filename.
///
/// The name is copied verbatim and the rest of the field is zero.
pub fn boot_file_field(policy: &ServerPolicy) -> [u8; DHCP_FILE_SIZE] {
    let mut field = [0u8; DHCP_FILE_SIZE];

    let Some(boot_file) = &policy.boot_file else {
        return field;
    };

    // A terminated name is at most 127 bytes (see `BootFile::from_str`), so
    // the zero fill always leaves its NUL in place.
    let name = boot_file.name().as_bytes();
    field[..name.len()].copy_from_slice(name);

    field
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::options::OptionCode;

    fn test_policy() -> ServerPolicy {
        ServerPolicy {
            mac_address: "b8:27:eb:c3:27:b5".parse().unwrap(),
            server_address: Ipv4Addr::new(192, 168, 1, 53),
            offered_address: Ipv4Addr::new(192, 168, 1, 100),
            subnet_mask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: None,
            boot_file: None,
        }
    }

    fn codes(options: &[DhcpOption]) -> Vec<u8> {
        options.iter().map(DhcpOption::option_code).collect()
    }

    #[test]
    fn test_offer_options_without_gateway() {
        let options = reply_options(&test_policy(), MessageType::Offer);

        assert_eq!(
            options,
            vec![
                DhcpOption::MessageType(MessageType::Offer),
                DhcpOption::ServerIdentifier(Ipv4Addr::new(192, 168, 1, 53)),
                DhcpOption::LeaseTime(86400),
                DhcpOption::SubnetMask(Ipv4Addr::new(255, 255, 255, 0)),
            ]
        );
        assert!(!codes(&options).contains(&(OptionCode::Router as u8)));
    }

    #[test]
    fn test_ack_options_with_gateway() {
        let policy = ServerPolicy {
            gateway: Some(Ipv4Addr::new(192, 168, 1, 254)),
            ..test_policy()
        };
        let options = reply_options(&policy, MessageType::Ack);

        assert_eq!(codes(&options), vec![53, 54, 51, 1, 3]);
        assert_eq!(options[0], DhcpOption::MessageType(MessageType::Ack));
        assert_eq!(
            options[4],
            DhcpOption::Router(vec![Ipv4Addr::new(192, 168, 1, 254)])
        );
    }

    #[test]
    fn test_exactly_one_message_type() {
        for message_type in [MessageType::Offer, MessageType::Ack] {
            let options = reply_options(&test_policy(), message_type);
            let types: Vec<_> = options
                .iter()
                .filter(|opt| opt.option_code() == OptionCode::MessageType as u8)
                .collect();
            assert_eq!(types, vec![&DhcpOption::MessageType(message_type)]);
        }
    }

    #[test]
    fn test_no_boot_file_leaves_field_empty() {
        assert_eq!(boot_file_field(&test_policy()), [0u8; DHCP_FILE_SIZE]);
    }

    #[test]
    fn test_plain_boot_file_field() {
        let policy = ServerPolicy {
            boot_file: Some("pxeboot".parse().unwrap()),
            ..test_policy()
        };
        let field = boot_file_field(&policy);

        assert_eq!(&field[..7], b"pxeboot");
        assert!(field[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_terminated_boot_file_field() {
        let policy = ServerPolicy {
            boot_file: Some("pxeboot/".parse().unwrap()),
            ..test_policy()
        };
        let field = boot_file_field(&policy);

        assert_eq!(&field[..7], b"pxeboot");
        assert_eq!(field[7], 0);
        assert!(!field.contains(&b'/'));
        assert!(field[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_full_width_boot_file_field() {
        let name = "x".repeat(DHCP_FILE_SIZE);
        let policy = ServerPolicy {
            boot_file: Some(name.parse().unwrap()),
            ..test_policy()
        };
        assert_eq!(boot_file_field(&policy), [b'x'; DHCP_FILE_SIZE]);
    }

    #[test]
    fn test_longest_terminated_boot_file_keeps_nul() {
        let name = "x".repeat(DHCP_FILE_SIZE - 1);
        let policy = ServerPolicy {
            boot_file: Some(format!("{}/", name).parse().unwrap()),
            ..test_policy()
        };
        let field = boot_file_field(&policy);

        assert_eq!(&field[..DHCP_FILE_SIZE - 1], name.as_bytes());
        assert_eq!(field[DHCP_FILE_SIZE - 1], 0);
    }
}
