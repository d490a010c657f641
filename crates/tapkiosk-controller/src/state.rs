//! Session state and transition records.
//!
//! # States
//!
//! - `Idle`: waiting for the button or a remote `FINISH`
//! - `Arming`: button held, hold threshold not reached yet
//! - `Reading`: read window open, waiting for a tag
//!
//! # Valid Transitions
//!
//! - Idle → Arming → Reading → Idle
//! - Arming → Idle (button released early)
//! - Idle/Arming → Reading (remote `FINISH`)

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Maximum number of state transitions kept in history.
///
/// A complete session is three transitions, so this covers the last
/// twenty-odd sessions.
pub const MAX_HISTORY_SIZE: usize = 64;

/// State of the session controller.
///
/// Exactly one instance exists, owned by the controller. It is never
/// persisted; the device always boots into `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session; button released.
    #[default]
    Idle,

    /// Button held since `since`; the session starts once the hold reaches
    /// the arm threshold.
    Arming { since: Instant },

    /// Read window opened at `started`. `reported` turns true once the
    /// terminal message for this session has been dispatched.
    Reading { started: Instant, reported: bool },
}

impl SessionState {
    /// Fieldless phase of this state.
    pub fn phase(&self) -> SessionPhase {
        match self {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Arming { .. } => SessionPhase::Arming,
            SessionState::Reading { .. } => SessionPhase::Reading,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    pub fn is_arming(&self) -> bool {
        matches!(self, SessionState::Arming { .. })
    }

    pub fn is_reading(&self) -> bool {
        matches!(self, SessionState::Reading { .. })
    }

    /// How long the button has been held, if arming.
    pub fn held_for(&self, now: Instant) -> Option<Duration> {
        match self {
            SessionState::Arming { since } => Some(now.saturating_duration_since(*since)),
            _ => None,
        }
    }

    /// How long the read window has been open, if reading.
    pub fn reading_for(&self, now: Instant) -> Option<Duration> {
        match self {
            SessionState::Reading { started, .. } => Some(now.saturating_duration_since(*started)),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.phase())
    }
}

/// Phase of the session without timing data.
///
/// Used in transition history, logs and status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Arming,
    Reading,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Arming => "Arming",
            SessionPhase::Reading => "Reading",
        };
        write!(f, "{phase}")
    }
}

/// A single state transition with timestamp.
///
/// # Serialization Note
///
/// `at` is not serialized as `Instant` is process-specific; it is set to
/// the time of deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The phase transitioned from.
    pub from: SessionPhase,

    /// The phase transitioned to.
    pub to: SessionPhase,

    /// When the transition happened (tick time).
    #[serde(skip, default = "Instant::now")]
    pub at: Instant,
}

impl StateTransition {
    pub fn new(from: SessionPhase, to: SessionPhase, at: Instant) -> Self {
        Self { from, to, at }
    }
}

impl fmt::Display for StateTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}
