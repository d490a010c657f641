//! Error types for collaborator operations.
//!
//! None of these errors is fatal to the controller: a failed send is logged
//! and the session moves on, a reader fault counts as "no tag" for that tick.

use tapkiosk_core::PeerAddress;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors reported by the tag reader, button or wireless link.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The link could not accept a frame for transmission.
    #[error("Send failed: {message}")]
    SendFailed { message: String },

    /// A send was attempted before the peer was registered with the link.
    #[error("Peer not registered: {peer}")]
    PeerNotRegistered { peer: PeerAddress },

    /// The tag reader reported a fault.
    #[error("Reader fault: {message}")]
    ReaderFault { message: String },

    /// Invalid data received from device.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    /// Create a new send failure.
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Create a new unregistered peer error.
    pub fn peer_not_registered(peer: PeerAddress) -> Self {
        Self::PeerNotRegistered { peer }
    }

    /// Create a new reader fault.
    pub fn reader_fault(message: impl Into<String>) -> Self {
        Self::ReaderFault {
            message: message.into(),
        }
    }

    /// Create a new invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether this error came from the outbound path of the link.
    pub fn is_send_error(&self) -> bool {
        matches!(
            self,
            Self::SendFailed { .. } | Self::PeerNotRegistered { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_failed_error() {
        let error = HardwareError::send_failed("radio busy");
        assert!(error.is_send_error());
        assert_eq!(error.to_string(), "Send failed: radio busy");
    }

    #[test]
    fn test_peer_not_registered_error() {
        let peer = PeerAddress::new([0xE8, 0x6B, 0xEA, 0x22, 0x59, 0x88]);
        let error = HardwareError::peer_not_registered(peer);
        assert!(error.is_send_error());
        assert_eq!(error.to_string(), "Peer not registered: E8:6B:EA:22:59:88");
    }

    #[test]
    fn test_reader_fault_error() {
        let error = HardwareError::reader_fault("SPI timeout");
        assert!(!error.is_send_error());
        assert_eq!(error.to_string(), "Reader fault: SPI timeout");
    }
}
