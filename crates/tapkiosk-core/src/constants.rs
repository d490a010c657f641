//! Core constants for the kiosk session protocol.
//!
//! This module defines the wire tokens, frame layout and session timing
//! defaults shared by every crate in the workspace.
//!
//! # Wire Format
//!
//! Every payload exchanged with the remote peer is a short ASCII token
//! placed at the start of a fixed-size frame and padded with zero bytes:
//!
//! ```text
//! +---------------------------+----------------------+
//! | token (ASCII, 1..=16 B)   | 0x00 padding         |
//! +---------------------------+----------------------+
//! |<------------------- FRAME_SIZE ----------------->|
//! ```
//!
//! | Direction | Token | Meaning |
//! |-----------|-------|---------|
//! | device → peer | `COUNTDOWN` | A read session started |
//! | device → peer | `SUCCESS` | A tag was read within the window |
//! | device → peer | `FAILED` | The read window elapsed without a tag |
//! | peer → device | `FINISH` | Re-arm the device remotely |
//!
//! # Usage
//!
//! ```
//! use tapkiosk_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(TOKEN_FINISH, "FINISH");
//! assert!(TOKEN_COUNTDOWN.len() <= FRAME_SIZE);
//!
//! let threshold = Duration::from_millis(DEFAULT_ARM_THRESHOLD_MS);
//! assert_eq!(threshold.as_secs(), 3);
//! ```

// ============================================================================
// Wire Tokens
// ============================================================================

/// Sent once when a read session starts.
pub const TOKEN_COUNTDOWN: &str = "COUNTDOWN";

/// Sent once when a tag was read within the read window.
pub const TOKEN_SUCCESS: &str = "SUCCESS";

/// Sent once when the read window elapsed without a tag.
pub const TOKEN_FAILED: &str = "FAILED";

/// Received from the peer to re-arm the device.
pub const TOKEN_FINISH: &str = "FINISH";

// ============================================================================
// Frame Layout
// ============================================================================

/// Size of every frame on the wire, in bytes.
///
/// Large enough for the longest token (`COUNTDOWN`, 9 bytes) and well below
/// the payload limit of short-range radio links (250 bytes for ESP-NOW).
pub const FRAME_SIZE: usize = 16;

/// Byte used to pad a token up to [`FRAME_SIZE`].
pub const FRAME_PADDING: u8 = 0x00;

// ============================================================================
// Session Timing
// ============================================================================

/// How long the button must be held before a read session starts (ms).
pub const DEFAULT_ARM_THRESHOLD_MS: u64 = 3000;

/// How long a read session accepts a tag before reporting failure (ms).
pub const DEFAULT_READ_WINDOW_MS: u64 = 10;

/// Default interval between controller ticks (ms).
///
/// Must stay below the read window so expiry is observed promptly.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1;

// ============================================================================
// Addressing
// ============================================================================

/// Length of a peer address in bytes (MAC-48).
pub const PEER_ADDRESS_LENGTH: usize = 6;

/// Peer the device reports to when no configuration overrides it.
pub const DEFAULT_PEER_ADDRESS: [u8; PEER_ADDRESS_LENGTH] = [0xE8, 0x6B, 0xEA, 0x22, 0x59, 0x88];

// ============================================================================
// Tag Identifiers
// ============================================================================

/// Minimum UID length in bytes (ISO 14443 single-size UID).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum UID length in bytes (ISO 14443 triple-size UID).
pub const MAX_UID_LENGTH: usize = 10;

// ============================================================================
// Queues
// ============================================================================

/// Default capacity of the inbound message queue.
pub const DEFAULT_INBOUND_QUEUE_CAPACITY: usize = 16;

// ============================================================================
// Development Link (UDP)
// ============================================================================

/// Local address the device binds when running over UDP.
pub const DEFAULT_DEVICE_BIND_ADDR: &str = "0.0.0.0:47000";

/// Address of the peer simulator when running over UDP.
pub const DEFAULT_PEER_SOCKET_ADDR: &str = "127.0.0.1:47001";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_fit_in_frame() {
        for token in [TOKEN_COUNTDOWN, TOKEN_SUCCESS, TOKEN_FAILED, TOKEN_FINISH] {
            assert!(token.len() <= FRAME_SIZE, "{token} does not fit");
            assert!(token.is_ascii());
        }
    }

    #[test]
    fn test_tick_interval_below_read_window() {
        assert!(DEFAULT_TICK_INTERVAL_MS < DEFAULT_READ_WINDOW_MS);
    }

    #[test]
    fn test_uid_bounds() {
        assert!(MIN_UID_LENGTH < MAX_UID_LENGTH);
    }
}
