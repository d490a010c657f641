//! Mock wireless link.
//!
//! Records every frame the controller sends, lets a test inject inbound
//! payloads through the receive callback, and can be told to refuse sends
//! to exercise the best-effort delivery path.

use crate::{
    HardwareError, Result,
    mock::lock,
    traits::{ReceiveCallback, SendCallback, WirelessLink},
    types::{DeliveryStatus, SendReport},
};
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use tapkiosk_core::PeerAddress;

/// One frame accepted by the mock link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub peer: PeerAddress,
    pub payload: Bytes,
}

impl SentFrame {
    /// Payload with trailing zero padding removed, as a lossy string.
    pub fn token(&self) -> String {
        let end = self
            .payload
            .iter()
            .rposition(|b| *b != 0)
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&self.payload[..end]).into_owned()
    }
}

#[derive(Default)]
struct LinkState {
    peers: Vec<PeerAddress>,
    sent: Vec<SentFrame>,
    attempts: usize,
    refuse_all: bool,
    refuse_next: usize,
    auto_confirm: bool,
    send_callback: Option<SendCallback>,
    receive_callback: Option<ReceiveCallback>,
}

/// Mock link handed to the controller.
///
/// # Examples
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tapkiosk_hardware::mock::MockLink;
/// use tapkiosk_hardware::traits::WirelessLink;
/// use tapkiosk_core::PeerAddress;
///
/// let (mut link, handle) = MockLink::new();
/// let received = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&received);
/// link.on_message_received(Arc::new(move |_from: &PeerAddress, payload: &[u8]| {
///     sink.lock().unwrap().push(payload.to_vec());
/// }));
///
/// let peer = PeerAddress::new([1, 2, 3, 4, 5, 6]);
/// assert!(handle.inject(peer, b"FINISH"));
/// assert_eq!(received.lock().unwrap().len(), 1);
/// ```
pub struct MockLink {
    shared: Arc<Mutex<LinkState>>,
}

impl MockLink {
    /// Create a link that confirms every accepted frame as delivered.
    pub fn new() -> (Self, MockLinkHandle) {
        let state = LinkState {
            auto_confirm: true,
            ..LinkState::default()
        };
        let shared = Arc::new(Mutex::new(state));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            MockLinkHandle { shared },
        )
    }
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink").finish_non_exhaustive()
    }
}

impl WirelessLink for MockLink {
    fn register_peer(&mut self, peer: PeerAddress) -> Result<()> {
        let mut state = lock(&self.shared);
        if !state.peers.contains(&peer) {
            state.peers.push(peer);
        }
        Ok(())
    }

    fn send(&mut self, peer: &PeerAddress, frame: &[u8]) -> Result<()> {
        let confirm = {
            let mut state = lock(&self.shared);
            state.attempts += 1;

            if !state.peers.contains(peer) {
                return Err(HardwareError::peer_not_registered(*peer));
            }
            if state.refuse_all {
                return Err(HardwareError::send_failed("link refusing frames"));
            }
            if state.refuse_next > 0 {
                state.refuse_next -= 1;
                return Err(HardwareError::send_failed("radio busy"));
            }

            state.sent.push(SentFrame {
                peer: *peer,
                payload: Bytes::copy_from_slice(frame),
            });

            if state.auto_confirm {
                state.send_callback.clone()
            } else {
                None
            }
        };

        // Callbacks run outside the lock so they may call back into the link.
        if let Some(callback) = confirm {
            callback(SendReport::new(*peer, DeliveryStatus::Delivered));
        }
        Ok(())
    }

    fn on_send_complete(&mut self, callback: SendCallback) {
        lock(&self.shared).send_callback = Some(callback);
    }

    fn on_message_received(&mut self, callback: ReceiveCallback) {
        lock(&self.shared).receive_callback = Some(callback);
    }
}

/// Handle for inspecting and driving a [`MockLink`].
#[derive(Clone)]
pub struct MockLinkHandle {
    shared: Arc<Mutex<LinkState>>,
}

impl std::fmt::Debug for MockLinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLinkHandle").finish_non_exhaustive()
    }
}

impl MockLinkHandle {
    /// Deliver a payload as if it arrived over the air.
    ///
    /// Returns `false` if no receive callback is installed.
    pub fn inject(&self, from: PeerAddress, payload: &[u8]) -> bool {
        let callback = lock(&self.shared).receive_callback.clone();
        match callback {
            Some(callback) => {
                callback(&from, payload);
                true
            }
            None => false,
        }
    }

    /// Report a delivery status through the send callback.
    ///
    /// Returns `false` if no send callback is installed.
    pub fn confirm(&self, report: SendReport) -> bool {
        let callback = lock(&self.shared).send_callback.clone();
        match callback {
            Some(callback) => {
                callback(report);
                true
            }
            None => false,
        }
    }

    /// Frames accepted so far.
    pub fn sent(&self) -> Vec<SentFrame> {
        lock(&self.shared).sent.clone()
    }

    /// Tokens of the frames accepted so far, in order.
    pub fn sent_tokens(&self) -> Vec<String> {
        lock(&self.shared).sent.iter().map(SentFrame::token).collect()
    }

    /// Number of accepted frames carrying `token`.
    pub fn count(&self, token: &str) -> usize {
        lock(&self.shared)
            .sent
            .iter()
            .filter(|frame| frame.token() == token)
            .count()
    }

    pub fn clear_sent(&self) {
        lock(&self.shared).sent.clear();
    }

    /// Number of `send` calls, including refused ones.
    pub fn attempts(&self) -> usize {
        lock(&self.shared).attempts
    }

    /// Refuse every send until called again with `false`.
    pub fn refuse_sends(&self, refuse: bool) {
        lock(&self.shared).refuse_all = refuse;
    }

    /// Refuse the next `count` sends.
    pub fn refuse_next(&self, count: usize) {
        lock(&self.shared).refuse_next = count;
    }

    /// Enable or disable automatic delivery confirmation.
    pub fn set_auto_confirm(&self, enabled: bool) {
        lock(&self.shared).auto_confirm = enabled;
    }

    pub fn registered_peers(&self) -> Vec<PeerAddress> {
        lock(&self.shared).peers.clone()
    }
}
