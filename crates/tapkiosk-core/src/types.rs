use crate::{
    Result,
    constants::{MAX_UID_LENGTH, MIN_UID_LENGTH, PEER_ADDRESS_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of the remote peer (MAC-48, `AA:BB:CC:DD:EE:FF`).
///
/// Configured once at startup and immutable for the lifetime of the
/// process. Serialized as its colon-separated string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerAddress([u8; PEER_ADDRESS_LENGTH]);

impl PeerAddress {
    /// Create a peer address from its raw bytes.
    #[must_use]
    pub const fn new(bytes: [u8; PEER_ADDRESS_LENGTH]) -> Self {
        PeerAddress(bytes)
    }

    /// Get the raw address bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PEER_ADDRESS_LENGTH] {
        &self.0
    }

    /// Check if this is the broadcast address (`FF:FF:FF:FF:FF:FF`).
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.0.iter().all(|b| *b == 0xFF)
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02X}:{b:02X}:{c:02X}:{d:02X}:{e:02X}:{g:02X}")
    }
}

impl std::str::FromStr for PeerAddress {
    type Err = Error;

    /// Parse `AA:BB:CC:DD:EE:FF` (also accepts `-` as separator).
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split([':', '-']).collect();
        if parts.len() != PEER_ADDRESS_LENGTH {
            return Err(Error::InvalidPeerAddress(format!(
                "expected {PEER_ADDRESS_LENGTH} octets, got {} in '{s}'",
                parts.len()
            )));
        }

        let mut bytes = [0u8; PEER_ADDRESS_LENGTH];
        for (slot, part) in bytes.iter_mut().zip(&parts) {
            if part.len() != 2 {
                return Err(Error::InvalidPeerAddress(format!(
                    "octet '{part}' must be two hex digits"
                )));
            }
            *slot = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidPeerAddress(format!("octet '{part}' is not hex")))?;
        }

        Ok(PeerAddress(bytes))
    }
}

impl TryFrom<String> for PeerAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PeerAddress> for String {
    fn from(value: PeerAddress) -> Self {
        value.to_string()
    }
}

/// Identifier of an RFID/NFC tag (4-10 bytes per ISO 14443).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagUid(Vec<u8>);

impl TagUid {
    /// Create a tag UID with length validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidTagUid` if the UID is not 4-10 bytes long.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        let len = bytes.len();
        if !(MIN_UID_LENGTH..=MAX_UID_LENGTH).contains(&len) {
            return Err(Error::InvalidTagUid(format!(
                "UID must be {MIN_UID_LENGTH}-{MAX_UID_LENGTH} bytes, got {len}"
            )));
        }
        Ok(TagUid(bytes))
    }

    /// Parse a UID from a hex string (`04ABCDEF`, whitespace and `:` ignored).
    ///
    /// # Errors
    /// Returns `Error::InvalidTagUid` for odd-length or non-hex input, or a
    /// UID outside the valid length range.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits: String = hex
            .chars()
            .filter(|c| !c.is_whitespace() && *c != ':')
            .collect();

        if digits.len() % 2 != 0 {
            return Err(Error::InvalidTagUid(format!(
                "odd number of hex digits in '{hex}'"
            )));
        }

        let bytes = (0..digits.len())
            .step_by(2)
            .map(|i| {
                digits
                    .get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| Error::InvalidTagUid(format!("'{hex}' is not hex")))
            })
            .collect::<Result<Vec<u8>>>()?;

        TagUid::new(bytes)
    }

    /// Get the raw UID bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the UID as an upper-case hex string without separators.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02X}")).collect()
    }
}

impl fmt::Display for TagUid {
    /// Space-separated hex octets, e.g. `04 AB CD EF`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let octets: Vec<String> = self.0.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{}", octets.join(" "))
    }
}

impl std::str::FromStr for TagUid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TagUid::from_hex(s)
    }
}
