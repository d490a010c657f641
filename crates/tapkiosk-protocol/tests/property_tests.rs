//! Property-based tests for frame handling and inbound decoding.
//!
//! Inbound payloads come from the radio and may be arbitrary; these tests
//! check that decoding is total and only ever recognizes the exact token.

use bytes::BytesMut;
use proptest::prelude::*;
use tapkiosk_core::constants::{FRAME_PADDING, FRAME_SIZE, TOKEN_FINISH};
use tapkiosk_protocol::{Frame, FrameCodec, InboundMessage, OutboundMessage};
use tokio_util::codec::Decoder;

/// Strategy for valid tokens (printable ASCII, 1..=FRAME_SIZE chars).
fn valid_token() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{1,16}").expect("Failed to create token regex strategy")
}

fn strip(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| *b != FRAME_PADDING)
        .map_or(0, |i| i + 1);
    &bytes[..end]
}

proptest! {
    /// Property: decoding never panics and recognizes FINISH only when the
    /// unpadded payload is exactly the token.
    #[test]
    fn prop_inbound_decode_is_total(payload in prop::collection::vec(any::<u8>(), 0..64)) {
        let msg = InboundMessage::decode(&payload);
        let is_finish = strip(&payload) == TOKEN_FINISH.as_bytes();

        prop_assert_eq!(msg.is_finish(), is_finish);
        if let InboundMessage::Unknown(bytes) = msg {
            prop_assert_eq!(&bytes[..], &payload[..]);
        }
    }

    /// Property: any amount of trailing padding after FINISH still decodes.
    #[test]
    fn prop_finish_with_padding(padding in 0usize..32) {
        let mut payload = TOKEN_FINISH.as_bytes().to_vec();
        payload.extend(std::iter::repeat_n(FRAME_PADDING, padding));
        prop_assert!(InboundMessage::decode(&payload).is_finish());
    }

    /// Property: a valid token always produces a full-size frame whose
    /// token bytes match the input.
    #[test]
    fn prop_token_frame(token in valid_token()) {
        let frame = Frame::from_token(&token).unwrap();
        prop_assert_eq!(frame.as_wire().len(), FRAME_SIZE);
        prop_assert_eq!(frame.token(), token.as_bytes());
        prop_assert_eq!(Frame::from_bytes(frame.as_wire()).unwrap(), frame);
    }

    /// Property: the codec accepts every datagram up to the frame size and
    /// rejects every larger one without leaving bytes behind.
    #[test]
    fn prop_codec_datagram_limits(datagram in prop::collection::vec(1u8..=255, 1..40)) {
        let mut codec = FrameCodec::new();
        let mut buf = BytesMut::from(&datagram[..]);

        let result = codec.decode(&mut buf);
        prop_assert!(buf.is_empty());
        prop_assert_eq!(result.is_ok(), datagram.len() <= FRAME_SIZE);
    }
}

#[test]
fn outbound_frames_never_decode_as_finish() {
    for msg in [
        OutboundMessage::Countdown,
        OutboundMessage::Success,
        OutboundMessage::Failed,
    ] {
        let frame = msg.to_frame();
        assert!(!InboundMessage::decode(frame.as_wire()).is_finish());
    }
}
