//! Delivery confirmation sink.
//!
//! The link reports the fate of every sent frame through its send-complete
//! callback. Those reports are diagnostics only: they are logged and counted
//! here and never reach the session state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tapkiosk_hardware::{DeliveryStatus, SendCallback, SendReport};
use tracing::{debug, warn};

/// Counters for delivery reports.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeliveryStats {
    pub delivered: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    failed: AtomicU64,
}

/// Observability sink for send-completion callbacks.
#[derive(Debug, Default, Clone)]
pub struct DeliveryMonitor {
    counters: Arc<Counters>,
}

impl DeliveryMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and count one report.
    pub fn record(&self, report: SendReport) {
        match report.status {
            DeliveryStatus::Delivered => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(peer = %report.peer, "Delivery confirmed");
            }
            DeliveryStatus::Failed => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(peer = %report.peer, "Delivery failed");
            }
        }
    }

    /// Callback to install on the link.
    pub fn callback(&self) -> SendCallback {
        let monitor = self.clone();
        Arc::new(move |report: SendReport| monitor.record(report))
    }

    pub fn snapshot(&self) -> DeliveryStats {
        DeliveryStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapkiosk_core::PeerAddress;

    #[test]
    fn test_counts_reports() {
        let monitor = DeliveryMonitor::new();
        let peer = PeerAddress::new([1, 2, 3, 4, 5, 6]);

        let callback = monitor.callback();
        callback(SendReport::new(peer, DeliveryStatus::Delivered));
        callback(SendReport::new(peer, DeliveryStatus::Delivered));
        monitor.record(SendReport::new(peer, DeliveryStatus::Failed));

        assert_eq!(
            monitor.snapshot(),
            DeliveryStats {
                delivered: 2,
                failed: 1
            }
        );
    }
}
