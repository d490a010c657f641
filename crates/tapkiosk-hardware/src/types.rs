//! Common types shared across collaborator implementations.

use serde::{Deserialize, Serialize};
use std::fmt;
use tapkiosk_core::PeerAddress;

/// Tag reader information.
///
/// Logged once at startup so the diagnostics show which reader is in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    /// Reader name (e.g., "MFRC522").
    pub name: String,

    /// Supported protocols (e.g., ["ISO14443A"]).
    pub protocols: Vec<String>,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl ReaderInfo {
    /// Create a new ReaderInfo.
    pub fn new(name: impl Into<String>, protocols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            protocols,
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Outcome of a transmission as reported by the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// The frame reached the peer (or left the device, for links
    /// without acknowledgements).
    Delivered,

    /// The link gave up on the frame.
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Asynchronous delivery confirmation for one sent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Destination of the frame.
    pub peer: PeerAddress,

    /// Whether it was delivered.
    pub status: DeliveryStatus,
}

impl SendReport {
    pub fn new(peer: PeerAddress, status: DeliveryStatus) -> Self {
        Self { peer, status }
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_info_builder() {
        let info = ReaderInfo::new("MFRC522", vec!["ISO14443A".to_string()])
            .with_firmware_version("v2.0");

        assert_eq!(info.name, "MFRC522");
        assert_eq!(info.protocols, vec!["ISO14443A"]);
        assert_eq!(info.firmware_version, Some("v2.0".to_string()));
    }

    #[test]
    fn test_delivery_status_serialization() {
        let json = serde_json::to_string(&DeliveryStatus::Delivered).unwrap();
        assert_eq!(json, "\"delivered\"");
        let back: DeliveryStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DeliveryStatus::Delivered);
    }

    #[test]
    fn test_send_report() {
        let peer = PeerAddress::new([1, 2, 3, 4, 5, 6]);
        assert!(SendReport::new(peer, DeliveryStatus::Delivered).is_delivered());
        assert!(!SendReport::new(peer, DeliveryStatus::Failed).is_delivered());
        assert_eq!(DeliveryStatus::Failed.to_string(), "failed");
    }
}
