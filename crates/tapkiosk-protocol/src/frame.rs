//! Fixed-size frame carrying one ASCII token.
//!
//! ```text
//! C O U N T D O W N 00 00 00 00 00 00 00
//! |<------ token --->|<--- padding ---->|
//! ```
//!
//! Outgoing frames are always [`FRAME_SIZE`] bytes. Incoming payloads are
//! accepted with or without padding, since a peer may send the bare token.

use bytes::Bytes;
use std::fmt;
use tapkiosk_core::{Error, Result, constants::*};

/// A single protocol frame.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Token bytes followed by padding.
    data: [u8; FRAME_SIZE],

    /// Length of the token (without padding).
    len: usize,
}

impl Frame {
    /// Build a frame from a token string.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidToken` if the token is empty, not ASCII or
    /// contains the padding byte, and `Error::FrameTooLarge` if it does not
    /// fit in [`FRAME_SIZE`] bytes.
    ///
    /// # Example
    ///
    /// ```
    /// use tapkiosk_protocol::Frame;
    ///
    /// let frame = Frame::from_token("FINISH").unwrap();
    /// assert_eq!(frame.token(), b"FINISH");
    /// assert_eq!(frame.as_wire().len(), 16);
    /// ```
    pub fn from_token(token: &str) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::InvalidToken("token is empty".to_string()));
        }
        if !token.is_ascii() || token.as_bytes().contains(&FRAME_PADDING) {
            return Err(Error::InvalidToken(format!(
                "token {token:?} must be ASCII without NUL bytes"
            )));
        }
        Self::pad(token.as_bytes())
    }

    /// Build a frame from a received payload.
    ///
    /// Trailing padding is stripped first, so both `b"FINISH"` and a full
    /// 16-byte padded frame are accepted. The remaining bytes are kept as-is;
    /// interpretation is up to the message layer.
    ///
    /// # Errors
    ///
    /// Returns `Error::FrameTooLarge` if the unpadded payload exceeds
    /// [`FRAME_SIZE`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::pad(strip_padding(bytes))
    }

    /// Build a frame from one of the protocol's own tokens.
    ///
    /// Callers guarantee the token fits; it is truncated otherwise.
    pub(crate) fn from_known_token(token: &'static str) -> Self {
        debug_assert!(token.len() <= FRAME_SIZE, "token {token} exceeds frame");
        let len = token.len().min(FRAME_SIZE);
        let mut data = [FRAME_PADDING; FRAME_SIZE];
        data[..len].copy_from_slice(&token.as_bytes()[..len]);
        Frame { data, len }
    }

    fn pad(token: &[u8]) -> Result<Self> {
        if token.len() > FRAME_SIZE {
            return Err(Error::FrameTooLarge {
                len: token.len(),
                max: FRAME_SIZE,
            });
        }

        let mut data = [FRAME_PADDING; FRAME_SIZE];
        data[..token.len()].copy_from_slice(token);

        Ok(Frame {
            data,
            len: token.len(),
        })
    }

    /// Token bytes without padding.
    pub fn token(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Token as a string slice, if it is valid UTF-8.
    pub fn token_str(&self) -> Option<&str> {
        std::str::from_utf8(self.token()).ok()
    }

    /// The full padded frame as sent on the wire.
    pub fn as_wire(&self) -> &[u8; FRAME_SIZE] {
        &self.data
    }

    /// Copy of the wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.data)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("token", &String::from_utf8_lossy(self.token()))
            .finish()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.token()))
    }
}

/// Strip trailing padding bytes from a payload.
pub(crate) fn strip_padding(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| *b != FRAME_PADDING)
        .map_or(0, |i| i + 1);
    &bytes[..end]
}
