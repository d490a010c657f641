//! Wire protocol between the kiosk device and its remote peer.
//!
//! The protocol is a handful of ASCII tokens, each carried in a fixed-size,
//! zero-padded [`Frame`]. The device sends [`OutboundMessage`]s and accepts
//! [`InboundMessage`]s; decoding of inbound payloads never fails, anything
//! that is not a recognized token becomes [`InboundMessage::Unknown`].

pub mod codec;
pub mod frame;
pub mod message;

pub use codec::FrameCodec;
pub use frame::Frame;
pub use message::{InboundMessage, OutboundMessage};
