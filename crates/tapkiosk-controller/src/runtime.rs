//! Tick loop driving a [`SessionController`].

use std::time::{Duration, Instant};

use tapkiosk_hardware::{ButtonInput, TagReader, WirelessLink};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::controller::{SessionController, SessionOutcome, SessionStats};

/// Tick `controller` every `tick_interval` until `shutdown` turns true or
/// its sender is dropped.
///
/// Late ticks are skipped rather than replayed. Every tick reads the clock
/// itself instead of trusting the interval's scheduled instant, which lags
/// behind after a stall, so the read window is measured against real time.
///
/// Returns the controller's counters at shutdown.
pub async fn run_session_loop<R, B, L>(
    controller: &mut SessionController<R, B, L>,
    tick_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> SessionStats
where
    R: TagReader,
    B: ButtonInput,
    L: WirelessLink,
{
    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        tick_interval_us = tick_interval.as_micros() as u64,
        "Session loop started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(outcome) = controller.tick(Instant::now()) {
                    report(&outcome);
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    let stats = controller.stats();
    info!(
        sessions = stats.sessions_started,
        succeeded = stats.succeeded,
        failed = stats.failed,
        send_failures = stats.send_failures,
        "Session loop stopped"
    );
    stats
}

fn report(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Success { uid } => info!(uid = %uid.to_hex(), "Session succeeded"),
        SessionOutcome::Failed => debug!("Session failed"),
    }
}
