//! # solodhcp
//!
//! A DHCP server that hands exactly one IPv4 address to exactly one host,
//! identified by its MAC address, and ignores everything else on the wire.
//!
//! Meant for bring-up work such as configuring a headless board or PXE
//! booting a single machine: there is no lease pool, no lease database, and
//! no renew/release handling.
//!
//! ## Quick Start
//!
//! ```no_run
//! use solodhcp::{Config, DhcpServer, ServerPolicy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> solodhcp::Result<()> {
//!     let config = Config::load("solodhcp.json")?;
//!     let server = DhcpServer::new(ServerPolicy::from_config(&config)?).await?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     server.run(shutdown_rx).await
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`DhcpPacket`] / [`DhcpOption`] - packet parsing and encoding
//! - [`builder`] - OFFER/ACK options and the boot-file header field
//! - [`Handshake`] - MAC filter and DISCOVER→OFFER, REQUEST→ACK
//! - [`ServerPolicy`] - the validated, immutable configuration
//! - [`Transport`] / [`UdpTransport`] - datagram I/O
//! - [`DhcpServer`] - the receive/respond loop with cooperative shutdown

pub mod builder;
pub mod config;
pub mod error;
pub mod handshake;
pub mod mac;
pub mod options;
pub mod packet;
pub mod policy;
pub mod server;
pub mod transport;

pub use config::{Config, PartialConfig};
pub use error::{Error, Result};
pub use handshake::{Handshake, Reply};
pub use mac::MacAddress;
pub use options::{DhcpOption, MessageType};
pub use packet::DhcpPacket;
pub use policy::{BootFile, LEASE_TIME_SECONDS, ServerPolicy};
pub use server::DhcpServer;
pub use transport::{Destination, Transport, UdpTransport};
