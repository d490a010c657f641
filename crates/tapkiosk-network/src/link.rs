//! UDP-backed wireless link.
//!
//! # Architecture
//!
//! ```text
//! SessionController
//!     │
//!     └─> UdpLink ──(UDP datagram, one frame)──> PeerSimulator
//!            ▲                                        │
//!            └──── receive task ◄──── FINISH ─────────┘
//! ```
//!
//! UDP has no hardware addresses, so the link keeps a route table from
//! [`PeerAddress`] to socket address. `register_peer` routes a peer to the
//! configured peer socket unless a route was added explicitly. Datagrams
//! from sockets with no route are dropped.
//!
//! Sends never wait: `send` uses `try_send_to` and reports `Delivered` as
//! soon as the datagram is handed to the OS.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tapkiosk_core::{LinkConfig, PeerAddress};
use tapkiosk_hardware::{
    DeliveryStatus, HardwareError, ReceiveCallback, SendCallback, SendReport, WirelessLink,
};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::error::{NetworkError, Result};

/// Largest datagram the receive task accepts; anything longer is truncated
/// by the OS and then rejected by the decoder as not `FINISH`.
const RECV_BUFFER_SIZE: usize = 512;

/// Socket addresses for a [`UdpLink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpLinkConfig {
    /// Local address to bind.
    pub bind_addr: SocketAddr,
    /// Socket address registered peers are routed to by default.
    pub peer_addr: SocketAddr,
}

impl TryFrom<&LinkConfig> for UdpLinkConfig {
    type Error = NetworkError;

    fn try_from(config: &LinkConfig) -> Result<Self> {
        let parse = |raw: &str| {
            raw.parse::<SocketAddr>()
                .map_err(|_| NetworkError::InvalidAddress(raw.to_string()))
        };
        Ok(Self {
            bind_addr: parse(&config.bind_addr)?,
            peer_addr: parse(&config.peer_addr)?,
        })
    }
}

#[derive(Default)]
struct Routes {
    by_peer: HashMap<PeerAddress, SocketAddr>,
    by_socket: HashMap<SocketAddr, PeerAddress>,
    registered: Vec<PeerAddress>,
    receive_callback: Option<ReceiveCallback>,
}

impl Routes {
    fn insert(&mut self, peer: PeerAddress, addr: SocketAddr) {
        if let Some(old) = self.by_peer.insert(peer, addr) {
            self.by_socket.remove(&old);
        }
        self.by_socket.insert(addr, peer);
    }
}

fn lock(routes: &Mutex<Routes>) -> MutexGuard<'_, Routes> {
    routes.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`WirelessLink`] over a UDP socket.
pub struct UdpLink {
    socket: Arc<UdpSocket>,
    default_peer_addr: SocketAddr,
    routes: Arc<Mutex<Routes>>,
    send_callback: Option<SendCallback>,
    recv_task: JoinHandle<()>,
}

impl UdpLink {
    /// Bind the local socket and start the receive task.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Bind` if the socket cannot be bound.
    pub async fn bind(config: UdpLinkConfig) -> Result<Self> {
        let socket = UdpSocket::bind(config.bind_addr)
            .await
            .map_err(|source| NetworkError::Bind {
                addr: config.bind_addr,
                source,
            })?;
        let socket = Arc::new(socket);

        info!(
            local = %socket.local_addr()?,
            peer = %config.peer_addr,
            "UDP link bound"
        );

        let routes = Arc::new(Mutex::new(Routes::default()));
        let recv_task = tokio::spawn(receive_loop(Arc::clone(&socket), Arc::clone(&routes)));

        Ok(Self {
            socket,
            default_peer_addr: config.peer_addr,
            routes,
            send_callback: None,
            recv_task,
        })
    }

    /// Route `peer` to `addr` instead of the default peer socket.
    pub fn add_route(&mut self, peer: PeerAddress, addr: SocketAddr) {
        debug!(%peer, %addr, "Route added");
        lock(&self.routes).insert(peer, addr);
    }

    /// Socket address frames for `peer` are sent to.
    pub fn route(&self, peer: &PeerAddress) -> Option<SocketAddr> {
        lock(&self.routes).by_peer.get(peer).copied()
    }

    /// Address the local socket is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    fn resolve(&self, peer: &PeerAddress) -> Result<SocketAddr> {
        let routes = lock(&self.routes);
        if !routes.registered.contains(peer) {
            return Err(NetworkError::UnknownPeer(*peer));
        }
        routes
            .by_peer
            .get(peer)
            .copied()
            .ok_or(NetworkError::UnknownPeer(*peer))
    }
}

impl std::fmt::Debug for UdpLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpLink")
            .field("socket", &self.socket)
            .field("default_peer_addr", &self.default_peer_addr)
            .finish_non_exhaustive()
    }
}

impl WirelessLink for UdpLink {
    fn register_peer(&mut self, peer: PeerAddress) -> tapkiosk_hardware::Result<()> {
        let mut routes = lock(&self.routes);
        if !routes.by_peer.contains_key(&peer) {
            routes.insert(peer, self.default_peer_addr);
        }
        if !routes.registered.contains(&peer) {
            routes.registered.push(peer);
        }
        info!(%peer, addr = ?routes.by_peer.get(&peer), "Peer registered");
        Ok(())
    }

    fn send(&mut self, peer: &PeerAddress, frame: &[u8]) -> tapkiosk_hardware::Result<()> {
        let addr = self.resolve(peer)?;

        match self.socket.try_send_to(frame, addr) {
            Ok(written) if written == frame.len() => {
                trace!(%peer, %addr, len = written, "Datagram sent");
            }
            Ok(written) => {
                return Err(HardwareError::send_failed(format!(
                    "short write to {addr}: {written} of {} bytes",
                    frame.len()
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                return Err(HardwareError::send_failed("socket not ready"));
            }
            Err(e) => {
                return Err(HardwareError::send_failed(format!("send to {addr}: {e}")));
            }
        }

        if let Some(callback) = &self.send_callback {
            callback(SendReport::new(*peer, DeliveryStatus::Delivered));
        }
        Ok(())
    }

    fn on_send_complete(&mut self, callback: SendCallback) {
        self.send_callback = Some(callback);
    }

    fn on_message_received(&mut self, callback: ReceiveCallback) {
        lock(&self.routes).receive_callback = Some(callback);
    }
}

impl Drop for UdpLink {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, routes: Arc<Mutex<Routes>>) {
    let mut buf = [0u8; RECV_BUFFER_SIZE];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                // ICMP errors from earlier sends surface here on some
                // platforms; the socket stays usable.
                debug!(error = %e, "UDP receive error");
                continue;
            }
        };

        let (peer, callback) = {
            let routes = lock(&routes);
            (routes.by_socket.get(&from).copied(), routes.receive_callback.clone())
        };

        let Some(peer) = peer else {
            debug!(%from, len, "Datagram from unrouted socket dropped");
            continue;
        };

        match callback {
            Some(callback) => callback(&peer, &buf[..len]),
            None => warn!(%peer, len, "Datagram received before a callback was installed"),
        }
    }
}
