use std::net::SocketAddr;

use tokio::sync::watch;
use tracing::{error, info, trace, warn};

use crate::error::Result;
use crate::handshake::{Handshake, Reply};
use crate::packet::hex_dump;
use crate::policy::ServerPolicy;
use crate::transport::{DHCP_SERVER_PORT, Transport, UdpTransport};

/// Answers the configured client until told to stop.
///
/// Datagrams are handled one at a time on the calling task: decode, respond
/// and send all complete before the next receive.
pub struct DhcpServer<T = UdpTransport> {
    handshake: Handshake,
    transport: T,
}

impl DhcpServer<UdpTransport> {
    pub async fn new(policy: ServerPolicy) -> Result<Self> {
        let transport = UdpTransport::bind(policy.server_address)?;

        info!(
            "DHCP server listening on port {}, replying from {}",
            DHCP_SERVER_PORT, policy.server_address
        );

        Ok(Self::with_transport(policy, transport))
    }
}

impl<T: Transport> DhcpServer<T> {
    pub fn with_transport(policy: ServerPolicy, transport: T) -> Self {
        Self {
            handshake: Handshake::new(policy),
            transport,
        }
    }

    pub fn policy(&self) -> &ServerPolicy {
        self.handshake.policy()
    }

    /// Runs the receive/respond loop.
    ///
    /// Returns `Ok(())` once `shutdown` becomes `true` or its sender is
    /// dropped. Shutdown is only observed while waiting for a datagram.
    ///
    /// # Errors
    ///
    /// A receive failure ends the loop with
    /// [`Error::Transport`](crate::Error::Transport). Decode and send
    /// failures are logged and the loop continues.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        if *shutdown.borrow_and_update() {
            return Ok(());
        }

        info!("DHCP server ready and listening");

        loop {
            let received = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        info!("Shutdown requested, stopping server");
                        return Ok(());
                    }
                    continue;
                }
                received = self.transport.receive() => received,
            };

            let (data, source) = received.inspect_err(|error| {
                error!("Error receiving packet: {}", error);
            })?;

            self.handle_datagram(&data, source).await;
        }
    }

    async fn handle_datagram(&self, data: &[u8], source: SocketAddr) {
        trace!(
            "Received {} bytes from {}\n{}",
            data.len(),
            source,
            hex_dump(data)
        );

        let reply = match self.handshake.handle_datagram(data) {
            Ok(Some(reply)) => reply,
            Ok(None) => return,
            Err(error) => {
                warn!("Dropping packet from {}: {}", source, error);
                return;
            }
        };

        self.send_reply(&reply).await;
    }

    async fn send_reply(&self, reply: &Reply) {
        let message_type = reply
            .packet
            .message_type()
            .map_or_else(|| "reply".to_string(), |t| t.to_string());

        let encoded = match reply.packet.encode() {
            Ok(encoded) => encoded,
            Err(error) => {
                error!(
                    "Cannot encode {} for {}: {}",
                    message_type, reply.packet.chaddr, error
                );
                return;
            }
        };

        trace!("Sending {} bytes\n{}", encoded.len(), hex_dump(&encoded));

        match self.transport.send(&encoded, reply.destination).await {
            Ok(sent) => info!(
                "{} {} to {} via {} ({} bytes)",
                message_type,
                reply.packet.yiaddr,
                reply.packet.chaddr,
                reply.destination.address(),
                sent
            ),
            Err(error) => error!(
                "Failed to send {} to {}: {}",
                message_type, reply.packet.chaddr, error
            ),
        }
    }
}
