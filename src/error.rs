//! Error types for the server.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants.

/// Errors that can occur while configuring or running the server.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error (config file).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed DHCP packet received.
    ///
    /// Covers packets that are too short, carry a bad magic cookie, use a
    /// non-Ethernet hardware type, or declare an option running past the
    /// end of the buffer. The server drops the datagram and keeps listening.
    #[error("Invalid DHCP packet: {0}")]
    InvalidPacket(String),

    /// An option that cannot be written as a single TLV.
    ///
    /// Pad and End are framing bytes, an empty Router list has no wire
    /// form, and no payload may exceed 255 bytes.
    #[error("Invalid DHCP option: {0}")]
    InvalidOption(String),

    /// An address has the wrong length or cannot be parsed.
    ///
    /// Raised when building a [`MacAddress`](crate::MacAddress) from
    /// anything other than exactly six octets.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Invalid server configuration.
    ///
    /// Returned by [`Config::validate`](crate::Config::validate) before the
    /// server opens any socket.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Socket creation or configuration error.
    ///
    /// Typically occurs when binding to port 67 without root privileges, or
    /// when the bind address is not assigned to a local interface.
    #[error("Socket error: {0}")]
    Socket(String),

    /// Sending or receiving a datagram failed.
    #[error("Transport error: {0}")]
    Transport(#[source] std::io::Error),
}

/// A specialized Result type for server operations.
pub type Result<T> = std::result::Result<T, Error>;
