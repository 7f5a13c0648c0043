//! Datagram transport between the handshake and the network.
//!
//! [`Transport`] is the seam the server loop talks to. [`UdpTransport`] is
//! the real implementation: one socket listening on the DHCP server port,
//! and one bound to the operator's address for sending replies.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};

pub const DHCP_SERVER_PORT: u16 = 67;
pub const DHCP_CLIENT_PORT: u16 = 68;
/// Largest possible UDP payload, so no datagram is ever cut short.
const RECV_BUFFER_SIZE: usize = 65535;

/// Where a reply goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Limited broadcast (255.255.255.255) on the client port.
    Broadcast,
    /// A client that already owns this address.
    Unicast(Ipv4Addr),
}

impl Destination {
    pub fn address(&self) -> Ipv4Addr {
        match self {
            Self::Broadcast => Ipv4Addr::BROADCAST,
            Self::Unicast(ip) => *ip,
        }
    }
}

/// Receives and sends raw DHCP datagrams.
///
/// `receive` waits without a timeout; callers that need to stop waiting
/// race it against a shutdown signal. It must be cancel-safe.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn receive(&self) -> Result<(Vec<u8>, SocketAddr)>;

    async fn send(&self, datagram: &[u8], destination: Destination) -> Result<usize>;
}

/// [`Transport`] over two UDP sockets: one listening, one sending.
pub struct UdpTransport {
    receiver: UdpSocket,
    sender: UdpSocket,
    client_port: u16,
}

impl UdpTransport {
    /// Binds the standard DHCP ports, sending from `bind_address`.
    pub fn bind(bind_address: Ipv4Addr) -> Result<Self> {
        Self::bind_ports(bind_address, DHCP_SERVER_PORT, DHCP_CLIENT_PORT)
    }

    /// Listens on `0.0.0.0:server_port` and sends from `bind_address` to
    /// `client_port`.
    ///
    /// The listening socket is not bound to `bind_address` because a socket
    /// bound to a unicast address never sees a client's limited broadcast.
    pub fn bind_ports(bind_address: Ipv4Addr, server_port: u16, client_port: u16) -> Result<Self> {
        let receiver = Self::create_socket(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, server_port))?;
        let sender = Self::create_socket(SocketAddrV4::new(bind_address, 0))?;

        Ok(Self {
            receiver,
            sender,
            client_port,
        })
    }

    fn create_socket(bind_addr: SocketAddrV4) -> Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|error| Error::Socket(format!("Failed to create socket: {}", error)))?;

        socket
            .set_reuse_address(true)
            .map_err(|error| Error::Socket(format!("Failed to set SO_REUSEADDR: {}", error)))?;

        socket
            .set_broadcast(true)
            .map_err(|error| Error::Socket(format!("Failed to set SO_BROADCAST: {}", error)))?;

        socket
            .set_nonblocking(true)
            .map_err(|error| Error::Socket(format!("Failed to set non-blocking: {}", error)))?;

        socket.bind(&bind_addr.into()).map_err(|error| {
            Error::Socket(format!("Failed to bind to {}: {}", bind_addr, error))
        })?;

        let std_socket: std::net::UdpSocket = socket.into();
        let tokio_socket = UdpSocket::from_std(std_socket).map_err(|error| {
            Error::Socket(format!("Failed to convert to tokio socket: {}", error))
        })?;

        Ok(tokio_socket)
    }

    /// Address the listening socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.receiver.local_addr().map_err(Error::Transport)
    }
}

impl Transport for UdpTransport {
    async fn receive(&self) -> Result<(Vec<u8>, SocketAddr)> {
        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        let (size, source) = self
            .receiver
            .recv_from(&mut buffer)
            .await
            .map_err(Error::Transport)?;
        buffer.truncate(size);
        Ok((buffer, source))
    }

    async fn send(&self, datagram: &[u8], destination: Destination) -> Result<usize> {
        let target = SocketAddr::new(IpAddr::V4(destination.address()), self.client_port);
        self.sender
            .send_to(datagram, target)
            .await
            .map_err(Error::Transport)
    }
}
