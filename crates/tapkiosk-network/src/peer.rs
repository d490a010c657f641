//! Remote peer simulator.
//!
//! Plays the other end of the link: receives the device's `COUNTDOWN`,
//! `SUCCESS` and `FAILED` frames, logs them, and sends `FINISH` on request.
//! With `auto_rearm` set it re-arms the device a fixed delay after every
//! terminal report, which keeps a device cycling through sessions unattended.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tapkiosk_protocol::{Frame, FrameCodec, InboundMessage, OutboundMessage};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::udp::UdpFramed;
use tracing::{debug, info, warn};

use crate::error::{NetworkError, Result};

/// Settings for a [`PeerSimulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerSimulatorConfig {
    /// Local address to bind.
    pub bind_addr: SocketAddr,
    /// Address of the device's link socket.
    pub device_addr: SocketAddr,
    /// Send `FINISH` this long after each terminal report.
    pub auto_rearm: Option<Duration>,
}

/// Commands accepted by [`PeerSimulator::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerCommand {
    /// Send `FINISH` now.
    Finish,
    /// Stop the simulator.
    Shutdown,
}

/// Counters kept by the simulator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PeerStats {
    pub countdowns: u64,
    pub successes: u64,
    pub failures: u64,
    /// Datagrams that were not a device report.
    pub unrecognized: u64,
    pub finishes_sent: u64,
}

impl PeerStats {
    fn record(&mut self, message: OutboundMessage) {
        match message {
            OutboundMessage::Countdown => self.countdowns += 1,
            OutboundMessage::Success => self.successes += 1,
            OutboundMessage::Failed => self.failures += 1,
        }
    }
}

/// The remote end of the link.
pub struct PeerSimulator {
    framed: UdpFramed<FrameCodec>,
    device_addr: SocketAddr,
    auto_rearm: Option<Duration>,
    stats: PeerStats,
}

impl PeerSimulator {
    /// Bind the simulator's socket.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Bind` if the socket cannot be bound.
    pub async fn bind(config: PeerSimulatorConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| NetworkError::Bind {
                addr: config.bind_addr,
                source,
            })?;

        info!(
            local = %socket.local_addr()?,
            device = %config.device_addr,
            auto_rearm_ms = config.auto_rearm.map(|d| d.as_millis() as u64),
            "Peer simulator bound"
        );

        Ok(Self {
            framed: UdpFramed::new(socket, FrameCodec::new()),
            device_addr: config.device_addr,
            auto_rearm: config.auto_rearm,
            stats: PeerStats::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.framed.get_ref().local_addr()?)
    }

    pub fn stats(&self) -> PeerStats {
        self.stats
    }

    /// Send `FINISH` to the device.
    pub async fn send_finish(&mut self) -> Result<()> {
        self.framed
            .send((InboundMessage::finish_frame(), self.device_addr))
            .await?;
        self.stats.finishes_sent += 1;
        info!(device = %self.device_addr, "FINISH sent");
        Ok(())
    }

    /// Wait for the next report from the device.
    ///
    /// Datagrams that are not a report are logged, counted and skipped.
    /// Returns `None` if the socket stream ends.
    pub async fn recv(&mut self) -> Option<OutboundMessage> {
        loop {
            let item = self.framed.next().await?;
            if let Some(message) = self.handle_datagram(item) {
                return Some(message);
            }
        }
    }

    /// Serve until [`PeerCommand::Shutdown`] arrives or the command channel
    /// closes. Returns the final counters.
    pub async fn run(mut self, mut commands: mpsc::Receiver<PeerCommand>) -> Result<PeerStats> {
        let mut rearm_at: Option<Instant> = None;

        loop {
            tokio::select! {
                item = self.framed.next() => {
                    let Some(item) = item else { break };
                    if let Some(message) = self.handle_datagram(item)
                        && message.is_terminal()
                        && let Some(delay) = self.auto_rearm
                    {
                        debug!(delay_ms = delay.as_millis() as u64, "Re-arm scheduled");
                        rearm_at = Some(Instant::now() + delay);
                    }
                }
                () = sleep_until(rearm_at), if rearm_at.is_some() => {
                    rearm_at = None;
                    self.send_finish().await?;
                }
                command = commands.recv() => match command {
                    Some(PeerCommand::Finish) => self.send_finish().await?,
                    Some(PeerCommand::Shutdown) | None => break,
                },
            }
        }

        info!(
            countdowns = self.stats.countdowns,
            successes = self.stats.successes,
            failures = self.stats.failures,
            "Peer simulator stopped"
        );
        Ok(self.stats)
    }

    fn handle_datagram(
        &mut self,
        item: std::result::Result<(Frame, SocketAddr), tapkiosk_core::Error>,
    ) -> Option<OutboundMessage> {
        let (frame, from) = match item {
            Ok(received) => received,
            Err(e) => {
                self.stats.unrecognized += 1;
                warn!(error = %e, "Bad datagram");
                return None;
            }
        };

        match OutboundMessage::from_frame(&frame) {
            Some(message) => {
                self.stats.record(message);
                info!(%from, "Device reported {message}");
                Some(message)
            }
            None => {
                self.stats.unrecognized += 1;
                debug!(%from, "Unrecognized frame {frame}");
                None
            }
        }
    }
}

impl std::fmt::Debug for PeerSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerSimulator")
            .field("device_addr", &self.device_addr)
            .field("auto_rearm", &self.auto_rearm)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
