//! Collaborator trait definitions.
//!
//! These traits are the contract between the session controller and the
//! peripherals it drives: the tag reader, the arming button and the
//! wireless link to the remote peer.
//!
//! # Polling Contract
//!
//! Unlike a typical async device API, every method here is synchronous and
//! must return promptly. The controller samples the button and the reader
//! once per tick from a single loop, and a tick must never block waiting on
//! hardware. Implementations backed by slow buses should cache state and
//! refresh it elsewhere.
//!
//! # Callbacks
//!
//! The wireless link reports two kinds of asynchronous events through
//! callbacks that may run on a different thread than the tick:
//!
//! - send completion ([`SendCallback`]), purely diagnostic;
//! - inbound payloads ([`ReceiveCallback`]), which the controller queues and
//!   drains at the next tick.

use std::sync::Arc;

use crate::error::Result;
use crate::types::{ReaderInfo, SendReport};
use tapkiosk_core::{PeerAddress, TagUid};

/// Callback invoked when the link knows the fate of a sent frame.
pub type SendCallback = Arc<dyn Fn(SendReport) + Send + Sync>;

/// Callback invoked for every payload received from any peer.
pub type ReceiveCallback = Arc<dyn Fn(&PeerAddress, &[u8]) + Send + Sync>;

/// RFID/NFC tag reader.
///
/// # Examples
///
/// ```
/// use tapkiosk_hardware::traits::TagReader;
/// use tapkiosk_hardware::Result;
/// use tapkiosk_core::TagUid;
///
/// fn poll_once<R: TagReader>(reader: &mut R) -> Result<Option<TagUid>> {
///     if !reader.card_present()? {
///         return Ok(None);
///     }
///     let uid = reader.read_uid()?;
///     if uid.is_some() {
///         reader.release()?;
///     }
///     Ok(uid)
/// }
/// ```
pub trait TagReader: Send {
    /// Check whether a tag is in the field. Non-blocking and idempotent.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::ReaderFault` if the reader cannot be queried.
    fn card_present(&mut self) -> Result<bool>;

    /// Read the identifier of the tag in the field.
    ///
    /// Returns the UID once per physical presentation; subsequent calls
    /// return `Ok(None)` until the tag is presented again.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::ReaderFault` if the read fails.
    fn read_uid(&mut self) -> Result<Option<TagUid>>;

    /// Halt the tag that was just read so it can be presented again.
    ///
    /// Must be called once per successful read.
    fn release(&mut self) -> Result<()>;

    /// Get reader information.
    fn reader_info(&self) -> ReaderInfo;
}

/// The arming button.
///
/// Debouncing at the driver layer is optional; the long-press threshold
/// absorbs contact bounce.
pub trait ButtonInput: Send {
    /// Current level of the button.
    fn is_pressed(&mut self) -> bool;
}

/// Short-range wireless link to the remote peer.
///
/// # Examples
///
/// ```
/// use tapkiosk_hardware::mock::MockLink;
/// use tapkiosk_hardware::traits::WirelessLink;
/// use tapkiosk_core::PeerAddress;
///
/// # fn example() -> tapkiosk_hardware::Result<()> {
/// let (mut link, handle) = MockLink::new();
/// let peer = PeerAddress::new([0xE8, 0x6B, 0xEA, 0x22, 0x59, 0x88]);
///
/// link.register_peer(peer)?;
/// link.send(&peer, b"COUNTDOWN")?;
///
/// assert_eq!(handle.sent_tokens(), vec!["COUNTDOWN"]);
/// # Ok(())
/// # }
/// ```
pub trait WirelessLink: Send {
    /// Register a peer. Must happen before the first send to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot add the peer.
    fn register_peer(&mut self, peer: PeerAddress) -> Result<()>;

    /// Queue a frame for transmission. Fire-and-forget: returns as soon as
    /// the link accepted (or refused) the frame.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::SendFailed` if the link refused the frame and
    /// `HardwareError::PeerNotRegistered` for an unknown peer.
    fn send(&mut self, peer: &PeerAddress, frame: &[u8]) -> Result<()>;

    /// Install the send-completion callback, replacing any previous one.
    fn on_send_complete(&mut self, callback: SendCallback);

    /// Install the receive callback, replacing any previous one.
    fn on_message_received(&mut self, callback: ReceiveCallback);
}
