use std::net::SocketAddr;

use tapkiosk_core::PeerAddress;
use tapkiosk_hardware::HardwareError;
use thiserror::Error;

/// Errors from the UDP transport.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The local socket could not be bound.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// No socket route exists for this peer.
    #[error("No route to peer {0}")]
    UnknownPeer(PeerAddress),

    /// A configured socket address did not parse.
    #[error("Invalid socket address '{0}'")]
    InvalidAddress(String),

    /// Frame-level error from the codec.
    #[error("Protocol error: {0}")]
    Protocol(#[from] tapkiosk_core::Error),

    /// Low-level I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl From<NetworkError> for HardwareError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::UnknownPeer(peer) => HardwareError::peer_not_registered(peer),
            NetworkError::Io(e) => HardwareError::Io(e),
            other => HardwareError::send_failed(other.to_string()),
        }
    }
}
