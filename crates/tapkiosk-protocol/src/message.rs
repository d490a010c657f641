use crate::frame::{Frame, strip_padding};
use bytes::Bytes;
use std::fmt;
use tapkiosk_core::constants::{TOKEN_COUNTDOWN, TOKEN_FAILED, TOKEN_FINISH, TOKEN_SUCCESS};

/// Message sent by the device to the remote peer.
///
/// Each session produces exactly one `Countdown` followed by exactly one
/// terminal message (`Success` or `Failed`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundMessage {
    /// A read session started; the peer may begin its countdown display.
    Countdown,
    /// A tag was read within the read window.
    Success,
    /// The read window elapsed without a tag.
    Failed,
}

impl OutboundMessage {
    /// Wire token for this message.
    pub fn token(&self) -> &'static str {
        match self {
            OutboundMessage::Countdown => TOKEN_COUNTDOWN,
            OutboundMessage::Success => TOKEN_SUCCESS,
            OutboundMessage::Failed => TOKEN_FAILED,
        }
    }

    /// Encode into a fixed-size frame. Deterministic and side-effect free.
    pub fn to_frame(&self) -> Frame {
        Frame::from_known_token(self.token())
    }

    /// Whether this message ends a session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OutboundMessage::Success | OutboundMessage::Failed)
    }

    /// Interpret a frame received from a device (peer side).
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        match frame.token() {
            t if t == TOKEN_COUNTDOWN.as_bytes() => Some(OutboundMessage::Countdown),
            t if t == TOKEN_SUCCESS.as_bytes() => Some(OutboundMessage::Success),
            t if t == TOKEN_FAILED.as_bytes() => Some(OutboundMessage::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Message received by the device from the remote peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Re-arm the device and start a new read session.
    Finish,
    /// Anything else; carries the raw payload for diagnostics.
    Unknown(Bytes),
}

impl InboundMessage {
    /// Decode a received payload. Never fails.
    ///
    /// Trailing padding is ignored; the remaining bytes must equal the
    /// `FINISH` token exactly; any other payload decodes to `Unknown`.
    ///
    /// # Example
    ///
    /// ```
    /// use tapkiosk_protocol::InboundMessage;
    ///
    /// assert_eq!(InboundMessage::decode(b"FINISH"), InboundMessage::Finish);
    /// assert_eq!(InboundMessage::decode(b"FINISH\0\0\0"), InboundMessage::Finish);
    /// assert!(!InboundMessage::decode(b"finish").is_finish());
    /// ```
    pub fn decode(payload: &[u8]) -> Self {
        if strip_padding(payload) == TOKEN_FINISH.as_bytes() {
            InboundMessage::Finish
        } else {
            InboundMessage::Unknown(Bytes::copy_from_slice(payload))
        }
    }

    /// Interpret an already framed payload.
    pub fn from_frame(frame: &Frame) -> Self {
        Self::decode(frame.token())
    }

    /// Frame carrying the `FINISH` token (peer side).
    pub fn finish_frame() -> Frame {
        Frame::from_known_token(TOKEN_FINISH)
    }

    pub fn is_finish(&self) -> bool {
        matches!(self, InboundMessage::Finish)
    }
}

impl fmt::Display for InboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InboundMessage::Finish => write!(f, "{TOKEN_FINISH}"),
            InboundMessage::Unknown(bytes) => {
                write!(f, "Unknown({:?})", String::from_utf8_lossy(bytes))
            }
        }
    }
}
