//! Session controller.
//!
//! [`SessionController`] owns the session state and every collaborator. It is
//! advanced by calling [`SessionController::tick`] with the current time;
//! nothing else mutates the state.
//!
//! # Tick Order
//!
//! 1. Drain the inbound queue, applying messages in arrival order.
//! 2. Evaluate the current state:
//!    - `Idle`: sample the button; pressed → `Arming`
//!    - `Arming`: sample the button; released → `Idle`; held for the arm
//!      threshold → `Reading` and send `COUNTDOWN`
//!    - `Reading`: poll the tag reader first, then check the read window.
//!      A tag seen in the tick the window expires still wins.
//!
//! The button is not sampled while `Reading`.
//!
//! # Examples
//!
//! ```
//! use std::time::{Duration, Instant};
//! use tapkiosk_controller::{ControllerConfig, SessionController, SessionOutcome};
//! use tapkiosk_hardware::mock::{MockButton, MockLink, MockTagReader};
//!
//! # fn main() -> tapkiosk_hardware::Result<()> {
//! let (reader, tag) = MockTagReader::new();
//! let (button, _button) = MockButton::new();
//! let (link, radio) = MockLink::new();
//! let mut controller = SessionController::new(reader, button, link, ControllerConfig::default())?;
//!
//! let t0 = Instant::now();
//! radio.inject(controller.peer(), b"FINISH");
//! assert!(controller.tick(t0).is_none());
//! assert!(controller.state().is_reading());
//!
//! tag.present_hex("04A1B2C3")?;
//! let outcome = controller.tick(t0 + Duration::from_millis(1));
//! assert!(matches!(outcome, Some(SessionOutcome::Success { .. })));
//! assert_eq!(radio.sent_tokens(), vec!["COUNTDOWN", "SUCCESS"]);
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;
use tapkiosk_core::{
    KioskConfig, PeerAddress, TagUid,
    constants::{
        DEFAULT_ARM_THRESHOLD_MS, DEFAULT_INBOUND_QUEUE_CAPACITY, DEFAULT_PEER_ADDRESS,
        DEFAULT_READ_WINDOW_MS,
    },
};
use tapkiosk_hardware::{ButtonInput, ReaderInfo, TagReader, WirelessLink};
use tapkiosk_protocol::{InboundMessage, OutboundMessage};
use tracing::{debug, info, trace, warn};

use crate::delivery::{DeliveryMonitor, DeliveryStats};
use crate::inbound::{self, InboundEnvelope, InboundReceiver, InboundSender};
use crate::state::{MAX_HISTORY_SIZE, SessionPhase, SessionState, StateTransition};

/// Timing and addressing parameters of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Peer that receives every outbound message.
    pub peer: PeerAddress,
    /// Minimum continuous hold before a button session starts.
    pub arm_threshold: Duration,
    /// How long a session waits for a tag.
    pub read_window: Duration,
    /// Capacity of the inbound queue; also the per-tick drain limit.
    pub inbound_queue_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            peer: PeerAddress::new(DEFAULT_PEER_ADDRESS),
            arm_threshold: Duration::from_millis(DEFAULT_ARM_THRESHOLD_MS),
            read_window: Duration::from_millis(DEFAULT_READ_WINDOW_MS),
            inbound_queue_capacity: DEFAULT_INBOUND_QUEUE_CAPACITY,
        }
    }
}

impl From<&KioskConfig> for ControllerConfig {
    fn from(config: &KioskConfig) -> Self {
        Self {
            peer: config.peer,
            arm_threshold: config.arm_threshold(),
            read_window: config.read_window(),
            inbound_queue_capacity: config.inbound_queue_capacity,
        }
    }
}

/// What started a read session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTrigger {
    /// Button held for the arm threshold.
    Button,
    /// `FINISH` received from the peer.
    Remote,
}

impl fmt::Display for SessionTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionTrigger::Button => write!(f, "button"),
            SessionTrigger::Remote => write!(f, "remote"),
        }
    }
}

/// Result of a finished read session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A tag was read inside the window.
    Success { uid: TagUid },
    /// The window elapsed without a tag.
    Failed,
}

impl SessionOutcome {
    /// Terminal message reported to the peer.
    pub fn message(&self) -> OutboundMessage {
        match self {
            SessionOutcome::Success { .. } => OutboundMessage::Success,
            SessionOutcome::Failed => OutboundMessage::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SessionOutcome::Success { .. })
    }

    pub fn uid(&self) -> Option<&TagUid> {
        match self {
            SessionOutcome::Success { uid } => Some(uid),
            SessionOutcome::Failed => None,
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::Success { uid } => write!(f, "success (UID {})", uid.to_hex()),
            SessionOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// Counters kept by the controller.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub sessions_started: u64,
    pub started_by_button: u64,
    pub started_remotely: u64,
    pub succeeded: u64,
    pub failed: u64,
    /// Frames accepted by the link.
    pub frames_sent: u64,
    /// Frames the link refused.
    pub send_failures: u64,
    pub inbound_unknown: u64,
    /// `FINISH` messages received while a session was already open.
    pub inbound_ignored: u64,
    pub reader_faults: u64,
}

impl SessionStats {
    /// Sessions that have sent their terminal message.
    pub fn sessions_finished(&self) -> u64 {
        self.succeeded + self.failed
    }
}

/// The kiosk session state machine and its collaborators.
pub struct SessionController<R, B, L> {
    reader: R,
    button: B,
    link: L,
    config: ControllerConfig,
    state: SessionState,
    history: VecDeque<StateTransition>,
    inbound_tx: InboundSender,
    inbound_rx: InboundReceiver,
    delivery: DeliveryMonitor,
    stats: SessionStats,
}

impl<R, B, L> SessionController<R, B, L>
where
    R: TagReader,
    B: ButtonInput,
    L: WirelessLink,
{
    /// Create a controller in `Idle`.
    ///
    /// Registers the configured peer with the link and installs the
    /// send-complete and receive callbacks.
    ///
    /// # Errors
    ///
    /// Returns the link's error if the peer cannot be registered.
    pub fn new(
        reader: R,
        button: B,
        mut link: L,
        config: ControllerConfig,
    ) -> tapkiosk_hardware::Result<Self> {
        link.register_peer(config.peer)?;

        let delivery = DeliveryMonitor::new();
        let (inbound_tx, inbound_rx) = inbound::channel(config.inbound_queue_capacity);

        link.on_send_complete(delivery.callback());
        link.on_message_received(inbound_tx.clone().into_callback());

        info!(
            peer = %config.peer,
            reader = %reader.reader_info().name,
            arm_threshold_ms = config.arm_threshold.as_millis() as u64,
            read_window_ms = config.read_window.as_millis() as u64,
            "Session controller ready"
        );

        Ok(Self {
            reader,
            button,
            link,
            config,
            state: SessionState::Idle,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            inbound_tx,
            inbound_rx,
            delivery,
            stats: SessionStats::default(),
        })
    }

    /// Advance the state machine to `now`.
    ///
    /// Returns the outcome if a session finished during this tick. Never
    /// blocks and never fails; collaborator errors are logged and counted.
    pub fn tick(&mut self, now: Instant) -> Option<SessionOutcome> {
        self.drain_inbound(now);

        match self.state {
            SessionState::Idle => {
                if self.button.is_pressed() {
                    trace!("Button pressed, arming");
                    self.set_state(SessionState::Arming { since: now }, now);
                }
                None
            }
            SessionState::Arming { since } => {
                if !self.button.is_pressed() {
                    debug!(
                        held_ms = now.saturating_duration_since(since).as_millis() as u64,
                        "Button released before arm threshold"
                    );
                    self.set_state(SessionState::Idle, now);
                } else if now.saturating_duration_since(since) >= self.config.arm_threshold {
                    self.begin_session(SessionTrigger::Button, now);
                }
                None
            }
            SessionState::Reading { .. } => self.poll_reading(now),
        }
    }

    fn drain_inbound(&mut self, now: Instant) {
        let limit = self.config.inbound_queue_capacity.max(1);
        for _ in 0..limit {
            let Some(envelope) = self.inbound_rx.try_next() else {
                break;
            };
            self.apply_inbound(envelope, now);
        }
    }

    fn apply_inbound(&mut self, envelope: InboundEnvelope, now: Instant) {
        match envelope.message {
            InboundMessage::Finish => match self.state {
                SessionState::Idle | SessionState::Arming { .. } => {
                    self.begin_session(SessionTrigger::Remote, now);
                }
                SessionState::Reading { .. } => {
                    self.stats.inbound_ignored += 1;
                    debug!(from = %envelope.from, "FINISH ignored, session already open");
                }
            },
            InboundMessage::Unknown(payload) => {
                self.stats.inbound_unknown += 1;
                debug!(
                    from = %envelope.from,
                    len = payload.len(),
                    "Unrecognized inbound payload: {:?}",
                    String::from_utf8_lossy(&payload)
                );
            }
        }
    }

    fn begin_session(&mut self, trigger: SessionTrigger, now: Instant) {
        self.stats.sessions_started += 1;
        match trigger {
            SessionTrigger::Button => self.stats.started_by_button += 1,
            SessionTrigger::Remote => self.stats.started_remotely += 1,
        }

        info!(%trigger, peer = %self.config.peer, "Read session started");
        self.set_state(
            SessionState::Reading {
                started: now,
                reported: false,
            },
            now,
        );
        self.dispatch(OutboundMessage::Countdown);
    }

    fn poll_reading(&mut self, now: Instant) -> Option<SessionOutcome> {
        let SessionState::Reading { started, reported } = self.state else {
            return None;
        };
        if reported {
            return None;
        }

        // Tag first: a read in the expiry tick counts as success.
        if let Some(uid) = self.try_read_tag() {
            return Some(self.complete_session(SessionOutcome::Success { uid }, now));
        }

        if now.saturating_duration_since(started) > self.config.read_window {
            return Some(self.complete_session(SessionOutcome::Failed, now));
        }
        None
    }

    fn try_read_tag(&mut self) -> Option<TagUid> {
        let present = match self.reader.card_present() {
            Ok(present) => present,
            Err(e) => {
                self.stats.reader_faults += 1;
                warn!(error = %e, "Tag reader fault while polling");
                return None;
            }
        };
        if !present {
            return None;
        }

        match self.reader.read_uid() {
            Ok(Some(uid)) => Some(uid),
            Ok(None) => {
                trace!("Card present but no UID read");
                None
            }
            Err(e) => {
                self.stats.reader_faults += 1;
                warn!(error = %e, "Tag reader fault while reading UID");
                None
            }
        }
    }

    fn complete_session(&mut self, outcome: SessionOutcome, now: Instant) -> SessionOutcome {
        if let SessionState::Reading { reported, .. } = &mut self.state {
            *reported = true;
        }
        self.dispatch(outcome.message());

        match &outcome {
            SessionOutcome::Success { uid } => {
                self.stats.succeeded += 1;
                info!(uid = %uid.to_hex(), "Tag read");
                if let Err(e) = self.reader.release() {
                    warn!(error = %e, "Failed to release tag reader");
                }
            }
            SessionOutcome::Failed => {
                self.stats.failed += 1;
                info!(
                    window_ms = self.config.read_window.as_millis() as u64,
                    "Read window expired without a tag"
                );
            }
        }

        self.set_state(SessionState::Idle, now);
        outcome
    }

    /// Hand a message to the link without waiting for delivery.
    fn dispatch(&mut self, message: OutboundMessage) {
        let frame = message.to_frame();
        match self.link.send(&self.config.peer, frame.as_wire()) {
            Ok(()) => {
                self.stats.frames_sent += 1;
                debug!(peer = %self.config.peer, %message, "Frame sent");
            }
            Err(e) => {
                self.stats.send_failures += 1;
                warn!(peer = %self.config.peer, %message, error = %e, "Send failed");
            }
        }
    }

    fn set_state(&mut self, next: SessionState, now: Instant) {
        let from = self.state.phase();
        let to = next.phase();
        self.state = next;

        if from == to {
            return;
        }
        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(StateTransition::new(from, to, now));
    }
}

impl<R, B, L> SessionController<R, B, L>
where
    R: TagReader,
{
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase()
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).copied().collect()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Delivery reports seen on the send-complete callback.
    pub fn delivery_stats(&self) -> DeliveryStats {
        self.delivery.snapshot()
    }

    pub fn peer(&self) -> PeerAddress {
        self.config.peer
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn reader_info(&self) -> ReaderInfo {
        self.reader.reader_info()
    }

    /// Producer for the inbound queue, for feeding messages that do not
    /// come through the link.
    pub fn inbound_sender(&self) -> InboundSender {
        self.inbound_tx.clone()
    }
}

impl<R, B, L> fmt::Debug for SessionController<R, B, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tapkiosk_hardware::mock::{
        MockButton, MockButtonHandle, MockLink, MockLinkHandle, MockTagReader,
        MockTagReaderHandle,
    };

    type Controller = SessionController<MockTagReader, MockButton, MockLink>;

    struct Rig {
        controller: Controller,
        button: MockButtonHandle,
        tag: MockTagReaderHandle,
        radio: MockLinkHandle,
        t0: Instant,
    }

    impl Rig {
        fn new() -> Self {
            Self::with_config(ControllerConfig::default())
        }

        fn with_config(config: ControllerConfig) -> Self {
            let (reader, tag) = MockTagReader::new();
            let (button, button_handle) = MockButton::new();
            let (link, radio) = MockLink::new();
            let controller = SessionController::new(reader, button, link, config).unwrap();
            Self {
                controller,
                button: button_handle,
                tag,
                radio,
                t0: Instant::now(),
            }
        }

        fn tick_at(&mut self, ms: u64) -> Option<SessionOutcome> {
            self.controller.tick(self.t0 + Duration::from_millis(ms))
        }

        fn finish(&self) {
            assert!(self.radio.inject(self.controller.peer(), b"FINISH"));
        }
    }

    #[test]
    fn test_new_registers_peer() {
        let rig = Rig::new();
        assert_eq!(
            rig.radio.registered_peers(),
            vec![PeerAddress::new(DEFAULT_PEER_ADDRESS)]
        );
        assert!(rig.controller.state().is_idle());
        assert!(rig.controller.history().is_empty());
    }

    #[test]
    fn test_press_arms_and_release_disarms() {
        let mut rig = Rig::new();

        rig.button.press();
        rig.tick_at(0);
        assert_eq!(rig.controller.phase(), SessionPhase::Arming);

        rig.button.release();
        rig.tick_at(100);
        assert_eq!(rig.controller.phase(), SessionPhase::Idle);
        assert!(rig.radio.sent().is_empty());
    }

    #[test]
    fn test_threshold_opens_session() {
        let mut rig = Rig::new();
        rig.button.press();

        rig.tick_at(0);
        rig.tick_at(2999);
        assert!(rig.controller.state().is_arming());
        assert!(rig.radio.sent().is_empty());

        rig.tick_at(3000);
        assert!(rig.controller.state().is_reading());
        assert_eq!(rig.radio.sent_tokens(), vec!["COUNTDOWN"]);
        assert_eq!(rig.controller.stats().started_by_button, 1);
    }

    #[test]
    fn test_button_not_sampled_while_reading() {
        let mut rig = Rig::new();
        rig.finish();
        rig.tick_at(0);
        assert!(rig.controller.state().is_reading());

        let samples = rig.button.samples();
        rig.tick_at(1);
        rig.tick_at(2);
        assert_eq!(rig.button.samples(), samples);
    }

    #[test]
    fn test_success_releases_reader() {
        let mut rig = Rig::new();
        rig.tag.present_hex("04A1B2C3D4").unwrap();
        rig.finish();

        let outcome = rig.tick_at(0).unwrap();
        assert_eq!(outcome.uid().unwrap().to_hex(), "04A1B2C3D4");
        assert_eq!(outcome.message(), OutboundMessage::Success);
        assert_eq!(rig.radio.sent_tokens(), vec!["COUNTDOWN", "SUCCESS"]);
        assert_eq!(rig.tag.releases(), 1);
        assert!(rig.controller.state().is_idle());
    }

    #[test]
    fn test_expiry_is_strictly_after_window() {
        let mut rig = Rig::new();
        rig.finish();
        rig.tick_at(0);

        assert!(rig.tick_at(10).is_none());
        assert!(rig.controller.state().is_reading());

        assert_eq!(rig.tick_at(11), Some(SessionOutcome::Failed));
        assert!(rig.controller.state().is_idle());
        assert_eq!(rig.radio.sent_tokens(), vec!["COUNTDOWN", "FAILED"]);
    }

    #[test]
    fn test_finish_while_arming_opens_session() {
        let mut rig = Rig::new();
        rig.button.press();
        rig.tick_at(0);
        assert!(rig.controller.state().is_arming());

        rig.finish();
        rig.tick_at(5);
        assert!(rig.controller.state().is_reading());
        assert_eq!(rig.controller.stats().started_remotely, 1);
        assert_eq!(rig.radio.count("COUNTDOWN"), 1);
    }

    #[test]
    fn test_second_finish_in_same_tick_is_ignored() {
        let mut rig = Rig::new();
        rig.finish();
        rig.finish();
        rig.tick_at(0);

        assert_eq!(rig.radio.count("COUNTDOWN"), 1);
        assert_eq!(rig.controller.stats().inbound_ignored, 1);
    }

    #[rstest]
    #[case::lowercase(b"finish".as_slice())]
    #[case::prefix(b"FINISHED".as_slice())]
    #[case::empty(b"".as_slice())]
    #[case::garbage(&[0xFF, 0x00, 0x13])]
    fn test_unknown_inbound_is_counted(#[case] payload: &[u8]) {
        let mut rig = Rig::new();
        assert!(rig.radio.inject(rig.controller.peer(), payload));
        rig.tick_at(0);

        assert!(rig.controller.state().is_idle());
        assert_eq!(rig.controller.stats().inbound_unknown, 1);
        assert!(rig.radio.sent().is_empty());
    }

    /// Reader whose answers are fixed by the test.
    struct ScriptedReader {
        present: bool,
        uid: Option<TagUid>,
        release_fails: bool,
    }

    impl TagReader for ScriptedReader {
        fn card_present(&mut self) -> tapkiosk_hardware::Result<bool> {
            Ok(self.present)
        }

        fn read_uid(&mut self) -> tapkiosk_hardware::Result<Option<TagUid>> {
            Ok(self.uid.clone())
        }

        fn release(&mut self) -> tapkiosk_hardware::Result<()> {
            if self.release_fails {
                Err(tapkiosk_hardware::HardwareError::reader_fault("halt rejected"))
            } else {
                Ok(())
            }
        }

        fn reader_info(&self) -> ReaderInfo {
            ReaderInfo::new("scripted", vec![])
        }
    }

    fn scripted(
        reader: ScriptedReader,
    ) -> (SessionController<ScriptedReader, MockButton, MockLink>, MockLinkHandle) {
        let (button, _) = MockButton::new();
        let (link, radio) = MockLink::new();
        let controller =
            SessionController::new(reader, button, link, ControllerConfig::default()).unwrap();
        (controller, radio)
    }

    #[test]
    fn test_card_present_without_uid_is_no_tag() {
        let (mut controller, radio) = scripted(ScriptedReader {
            present: true,
            uid: None,
            release_fails: false,
        });
        let t0 = Instant::now();

        radio.inject(controller.peer(), b"FINISH");
        assert!(controller.tick(t0).is_none());
        assert!(controller.tick(t0 + Duration::from_millis(5)).is_none());
        assert_eq!(
            controller.tick(t0 + Duration::from_millis(11)),
            Some(SessionOutcome::Failed)
        );
        assert_eq!(controller.stats().reader_faults, 0);
    }

    #[test]
    fn test_release_failure_still_succeeds() {
        let uid = TagUid::from_hex("04A1B2C3").unwrap();
        let (mut controller, radio) = scripted(ScriptedReader {
            present: true,
            uid: Some(uid.clone()),
            release_fails: true,
        });

        radio.inject(controller.peer(), b"FINISH");
        let outcome = controller.tick(Instant::now());

        assert_eq!(outcome, Some(SessionOutcome::Success { uid }));
        assert!(controller.state().is_idle());
        assert_eq!(radio.sent_tokens(), vec!["COUNTDOWN", "SUCCESS"]);
    }

    #[test]
    fn test_reader_fault_counts_as_no_tag() {
        let mut rig = Rig::new();
        rig.tag.present_hex("04A1B2C3").unwrap();
        rig.tag.inject_fault("CRC error");
        rig.finish();

        assert!(rig.tick_at(0).is_none());
        assert!(rig.controller.state().is_reading());
        assert_eq!(rig.controller.stats().reader_faults, 1);

        rig.tag.clear_fault();
        assert!(matches!(rig.tick_at(3), Some(SessionOutcome::Success { .. })));
    }

    #[test]
    fn test_history_is_capped() {
        let mut rig = Rig::new();
        for i in 0..100u64 {
            rig.button.set_pressed(i % 2 == 0);
            rig.tick_at(i);
        }

        assert_eq!(rig.controller.history().len(), MAX_HISTORY_SIZE);
        let last = rig.controller.last_transitions(2);
        assert_eq!(last.len(), 2);
        assert_eq!(last[1].to, SessionPhase::Idle);
        assert_eq!(last[0].to, SessionPhase::Arming);
    }

    #[test]
    fn test_config_from_kiosk_config() {
        let kiosk = KioskConfig {
            arm_threshold_ms: 500,
            read_window_ms: 25,
            ..KioskConfig::default()
        };
        let config = ControllerConfig::from(&kiosk);

        assert_eq!(config.arm_threshold, Duration::from_millis(500));
        assert_eq!(config.read_window, Duration::from_millis(25));
        assert_eq!(config.peer, kiosk.peer);
    }

    #[test]
    fn test_stats_serialize() {
        let rig = Rig::new();
        let json = serde_json::to_value(rig.controller.stats()).unwrap();
        assert_eq!(json["sessions_started"], 0);
        assert_eq!(json["send_failures"], 0);
    }
}
