//! Shared fixtures for controller integration tests.
//!
//! [`Kiosk`] wires a [`SessionController`] to mock collaborators and keeps
//! the handles, so a test can drive the button, the tag field and the radio
//! while stepping a virtual clock.

#![allow(dead_code)]

use std::time::{Duration, Instant};

use tapkiosk_controller::{ControllerConfig, SessionController, SessionOutcome};
use tapkiosk_hardware::mock::{
    MockButton, MockButtonHandle, MockLink, MockLinkHandle, MockTagReader, MockTagReaderHandle,
};

pub type MockController = SessionController<MockTagReader, MockButton, MockLink>;

pub struct Kiosk {
    pub controller: MockController,
    pub button: MockButtonHandle,
    pub tag: MockTagReaderHandle,
    pub radio: MockLinkHandle,
    pub t0: Instant,
}

impl Kiosk {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let (reader, tag) = MockTagReader::new();
        let (button, button_handle) = MockButton::new();
        let (link, radio) = MockLink::new();
        let controller = SessionController::new(reader, button, link, config)
            .expect("mock link accepts any peer");

        Self {
            controller,
            button: button_handle,
            tag,
            radio,
            t0: Instant::now(),
        }
    }

    /// Tick at `ms` milliseconds after the fixture's epoch.
    pub fn tick_at(&mut self, ms: u64) -> Option<SessionOutcome> {
        self.controller.tick(self.at(ms))
    }

    /// Tick every `step_ms` from `from_ms` up to and including `to_ms`,
    /// collecting outcomes with their tick time.
    pub fn tick_range(
        &mut self,
        from_ms: u64,
        to_ms: u64,
        step_ms: u64,
    ) -> Vec<(u64, SessionOutcome)> {
        let mut outcomes = Vec::new();
        let mut ms = from_ms;
        while ms <= to_ms {
            if let Some(outcome) = self.tick_at(ms) {
                outcomes.push((ms, outcome));
            }
            ms += step_ms;
        }
        outcomes
    }

    pub fn at(&self, ms: u64) -> Instant {
        self.t0 + Duration::from_millis(ms)
    }

    /// Deliver `FINISH` from the configured peer.
    pub fn send_finish(&self) {
        assert!(self.radio.inject(self.controller.peer(), b"FINISH"));
    }

    /// Open a session via `FINISH` at `ms`.
    pub fn open_session_at(&mut self, ms: u64) {
        self.send_finish();
        assert!(self.tick_at(ms).is_none(), "no tag expected when opening");
        assert!(self.controller.state().is_reading());
    }

    pub fn tokens(&self) -> Vec<String> {
        self.radio.sent_tokens()
    }
}

/// Assert that `tokens` is a sequence of complete or in-progress sessions:
/// every `COUNTDOWN` is followed by exactly one terminal token before the
/// next `COUNTDOWN`, and no terminal token appears outside a session.
pub fn assert_session_pairing(tokens: &[String]) {
    let mut open = false;
    for (i, token) in tokens.iter().enumerate() {
        match token.as_str() {
            "COUNTDOWN" => {
                assert!(!open, "COUNTDOWN at {i} while a session is open: {tokens:?}");
                open = true;
            }
            "SUCCESS" | "FAILED" => {
                assert!(open, "{token} at {i} without a session: {tokens:?}");
                open = false;
            }
            other => panic!("unexpected token {other:?} in {tokens:?}"),
        }
    }
}
