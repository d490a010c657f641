//! UDP transport for the kiosk.
//!
//! Real deployments use a short-range radio; on a development host the same
//! fixed-size frames travel over UDP instead.
//!
//! # Components
//!
//! - **UdpLink**: a [`WirelessLink`](tapkiosk_hardware::WirelessLink) backed
//!   by a UDP socket, used by the device
//! - **PeerSimulator**: the remote peer; logs the device's reports and sends
//!   `FINISH` to re-arm it
//!
//! # Example
//!
//! ```no_run
//! use tapkiosk_core::PeerAddress;
//! use tapkiosk_hardware::WirelessLink;
//! use tapkiosk_network::{UdpLink, UdpLinkConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UdpLinkConfig {
//!     bind_addr: "0.0.0.0:47000".parse()?,
//!     peer_addr: "127.0.0.1:47001".parse()?,
//! };
//!
//! let mut link = UdpLink::bind(config).await?;
//! let peer: PeerAddress = "E8:6B:EA:22:59:88".parse()?;
//! link.register_peer(peer)?;
//! link.send(&peer, b"COUNTDOWN")?;
//! # Ok(())
//! # }
//! ```

mod error;
mod link;
mod peer;

pub use error::{NetworkError, Result};
pub use link::{UdpLink, UdpLinkConfig};
pub use peer::{PeerCommand, PeerSimulator, PeerSimulatorConfig, PeerStats};
