//! Kiosk session controller.
//!
//! A held button (or a remote `FINISH`) opens a short tag read session; the
//! outcome is reported to a remote peer over a wireless link. This crate
//! holds the state machine and the loop that drives it:
//!
//! - [`state`]: `SessionState` and transition records
//! - [`controller`]: `SessionController`, the owner of all session state
//! - [`inbound`]: queue between the link's receive callback and the tick
//! - [`delivery`]: sink for send-completion reports
//! - [`runtime`]: tokio tick loop

pub mod controller;
pub mod delivery;
pub mod inbound;
pub mod runtime;
pub mod state;

pub use controller::{
    ControllerConfig, SessionController, SessionOutcome, SessionStats, SessionTrigger,
};
pub use delivery::{DeliveryMonitor, DeliveryStats};
pub use inbound::{InboundEnvelope, InboundReceiver, InboundSender};
pub use runtime::run_session_loop;
pub use state::{MAX_HISTORY_SIZE, SessionPhase, SessionState, StateTransition};
