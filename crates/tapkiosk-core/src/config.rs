//! Device configuration.
//!
//! The configuration is a small JSON document. Every field has a default,
//! so an empty object (`{}`) is a valid configuration:
//!
//! ```json
//! {
//!   "peer": "E8:6B:EA:22:59:88",
//!   "arm_threshold_ms": 3000,
//!   "read_window_ms": 10,
//!   "tick_interval_ms": 1,
//!   "inbound_queue_capacity": 16,
//!   "link": {
//!     "bind_addr": "0.0.0.0:47000",
//!     "peer_addr": "127.0.0.1:47001"
//!   }
//! }
//! ```

use crate::{
    Result,
    constants::{
        DEFAULT_ARM_THRESHOLD_MS, DEFAULT_DEVICE_BIND_ADDR, DEFAULT_INBOUND_QUEUE_CAPACITY,
        DEFAULT_PEER_ADDRESS, DEFAULT_PEER_SOCKET_ADDR, DEFAULT_READ_WINDOW_MS,
        DEFAULT_TICK_INTERVAL_MS,
    },
    error::Error,
    types::PeerAddress,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Remote peer that receives session reports.
    pub peer: PeerAddress,

    /// Button hold time before a read session starts.
    pub arm_threshold_ms: u64,

    /// Time a read session accepts a tag before reporting failure.
    pub read_window_ms: u64,

    /// Interval between controller ticks.
    pub tick_interval_ms: u64,

    /// Capacity of the inbound message queue.
    pub inbound_queue_capacity: usize,

    /// Development transport settings.
    pub link: LinkConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            peer: PeerAddress::new(DEFAULT_PEER_ADDRESS),
            arm_threshold_ms: DEFAULT_ARM_THRESHOLD_MS,
            read_window_ms: DEFAULT_READ_WINDOW_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            inbound_queue_capacity: DEFAULT_INBOUND_QUEUE_CAPACITY,
            link: LinkConfig::default(),
        }
    }
}

impl KioskConfig {
    /// Read, parse and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::Json` if it is
    /// not valid JSON for this schema, and `Error::Config` if validation fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self> {
        let config: KioskConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the timing and queue settings for consistency.
    ///
    /// # Errors
    /// Returns `Error::Config` if any duration is zero, the tick interval is
    /// not shorter than the read window, or the queue capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.arm_threshold_ms == 0 {
            return Err(Error::Config("arm_threshold_ms must be > 0".to_string()));
        }
        if self.read_window_ms == 0 {
            return Err(Error::Config("read_window_ms must be > 0".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(Error::Config("tick_interval_ms must be > 0".to_string()));
        }
        if self.tick_interval_ms >= self.read_window_ms {
            return Err(Error::Config(format!(
                "tick_interval_ms ({}) must be shorter than read_window_ms ({})",
                self.tick_interval_ms, self.read_window_ms
            )));
        }
        if self.inbound_queue_capacity == 0 {
            return Err(Error::Config(
                "inbound_queue_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn arm_threshold(&self) -> Duration {
        Duration::from_millis(self.arm_threshold_ms)
    }

    #[must_use]
    pub fn read_window(&self) -> Duration {
        Duration::from_millis(self.read_window_ms)
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Socket settings for the UDP development link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Local address the device binds.
    pub bind_addr: String,

    /// Socket address the configured peer is reachable at.
    pub peer_addr: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_DEVICE_BIND_ADDR.to_string(),
            peer_addr: DEFAULT_PEER_SOCKET_ADDR.to_string(),
        }
    }
}
