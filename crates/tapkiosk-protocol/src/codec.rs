//! Tokio codec for datagram transports.
//!
//! `FrameCodec` plugs the fixed-size [`Frame`] format into Tokio's codec
//! traits, so a UDP socket can be driven with `UdpFramed`:
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use tokio::net::UdpSocket;
//! use tokio_util::udp::UdpFramed;
//! use tapkiosk_protocol::{FrameCodec, InboundMessage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let socket = UdpSocket::bind("127.0.0.1:47001").await?;
//! let mut framed = UdpFramed::new(socket, FrameCodec::new());
//!
//! framed
//!     .send((InboundMessage::finish_frame(), "127.0.0.1:47000".parse()?))
//!     .await?;
//!
//! while let Some(Ok((frame, from))) = framed.next().await {
//!     println!("{from}: {frame}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Datagram Semantics
//!
//! Each datagram is exactly one frame. The decoder consumes the whole
//! buffer on every call; oversized datagrams are rejected with
//! `Error::FrameTooLarge` and the stream carries on with the next one.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::Frame;
use tapkiosk_core::{Error, Result};

/// Codec mapping one datagram to one [`Frame`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameCodec;

impl FrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }

        let datagram = src.split();
        Frame::from_bytes(&datagram).map(Some)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(item.as_wire());
        Ok(())
    }
}
