//! Inbound message queue.
//!
//! The link's receive callback may run on any thread. It only decodes the
//! payload and pushes it into a bounded queue; the controller drains the
//! queue at the start of each tick, so every state change happens inside
//! the tick in a single total order.
//!
//! ```text
//! radio task ──callback──► InboundSender
//!                              │ mpsc
//!                              ▼
//!                          InboundReceiver ──tick──► state
//! ```

use std::sync::Arc;

use tapkiosk_core::PeerAddress;
use tapkiosk_hardware::ReceiveCallback;
use tapkiosk_protocol::InboundMessage;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// A decoded inbound message and its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEnvelope {
    pub from: PeerAddress,
    pub message: InboundMessage,
}

/// Create a bounded inbound queue.
///
/// A capacity of zero is raised to one.
pub fn channel(capacity: usize) -> (InboundSender, InboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (InboundSender { tx }, InboundReceiver { rx })
}

/// Producer side, safe to call from any thread.
#[derive(Debug, Clone)]
pub struct InboundSender {
    tx: mpsc::Sender<InboundEnvelope>,
}

impl InboundSender {
    /// Decode `payload` and queue it. Never blocks.
    ///
    /// Returns `false` if the message was dropped because the queue is full
    /// or the controller is gone.
    pub fn push(&self, from: PeerAddress, payload: &[u8]) -> bool {
        let message = InboundMessage::decode(payload);
        match self.tx.try_send(InboundEnvelope { from, message }) {
            Ok(()) => true,
            Err(TrySendError::Full(envelope)) => {
                warn!(
                    from = %envelope.from,
                    "Inbound queue full, dropping {}", envelope.message
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Inbound queue closed, controller is gone");
                false
            }
        }
    }

    /// Wrap this sender into a link receive callback.
    pub fn into_callback(self) -> ReceiveCallback {
        Arc::new(move |from: &PeerAddress, payload: &[u8]| {
            self.push(*from, payload);
        })
    }
}

/// Consumer side, owned by the controller.
#[derive(Debug)]
pub struct InboundReceiver {
    rx: mpsc::Receiver<InboundEnvelope>,
}

impl InboundReceiver {
    /// Next queued message, without waiting.
    pub fn try_next(&mut self) -> Option<InboundEnvelope> {
        self.rx.try_recv().ok()
    }

    /// Number of messages waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEER: PeerAddress = PeerAddress::new([0xE8, 0x6B, 0xEA, 0x22, 0x59, 0x88]);

    #[test]
    fn test_push_decodes_payload() {
        let (tx, mut rx) = channel(4);

        assert!(tx.push(PEER, b"FINISH"));
        assert!(tx.push(PEER, b"HELLO"));
        assert_eq!(rx.len(), 2);

        let first = rx.try_next().unwrap();
        assert_eq!(first.from, PEER);
        assert_eq!(first.message, InboundMessage::Finish);

        let second = rx.try_next().unwrap();
        assert!(matches!(second.message, InboundMessage::Unknown(_)));

        assert!(rx.try_next().is_none());
        assert!(rx.is_empty());
    }

    #[test]
    fn test_full_queue_drops() {
        let (tx, mut rx) = channel(1);

        assert!(tx.push(PEER, b"FINISH"));
        assert!(!tx.push(PEER, b"FINISH"));

        assert!(rx.try_next().is_some());
        assert!(rx.try_next().is_none());
    }

    #[test]
    fn test_closed_queue_drops() {
        let (tx, rx) = channel(4);
        drop(rx);
        assert!(!tx.push(PEER, b"FINISH"));
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let (tx, mut rx) = channel(0);
        assert!(tx.push(PEER, b"FINISH"));
        assert!(rx.try_next().is_some());
    }

    #[test]
    fn test_callback_pushes_from_other_thread() {
        let (tx, mut rx) = channel(4);
        let callback = tx.into_callback();

        std::thread::spawn(move || callback(&PEER, b"FINISH"))
            .join()
            .unwrap();

        assert_eq!(rx.try_next().unwrap().message, InboundMessage::Finish);
    }
}
