//! `tapkiosk` binary.
//!
//! # Usage
//!
//! ```bash
//! # Device side: controller on a UDP link, button and tag driven from stdin
//! tapkiosk device --config kiosk.json
//!
//! # Peer side: log device reports, re-arm 2 s after each result
//! tapkiosk peer --bind 127.0.0.1:47001 --device 127.0.0.1:47000 --auto-rearm-ms 2000
//! ```

mod console;
mod device;
mod peer;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tapkiosk_core::constants::DEFAULT_PEER_SOCKET_ADDR;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tap-to-read kiosk controller
#[derive(Parser, Debug)]
#[command(name = "tapkiosk")]
#[command(about = "Button-armed tag reader that reports to a remote peer")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the kiosk device
    ///
    /// Stdin commands: press, release, tag <hex uid>, remove, status, quit
    Device {
        /// Path to the JSON configuration; defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run the remote peer simulator
    ///
    /// Stdin commands: finish, status, quit
    Peer {
        /// Address to bind to
        #[arg(short, long, default_value = DEFAULT_PEER_SOCKET_ADDR)]
        bind: SocketAddr,

        /// Address of the device's link socket
        #[arg(short, long, default_value = "127.0.0.1:47000")]
        device: SocketAddr,

        /// Send FINISH this many milliseconds after each result
        #[arg(long)]
        auto_rearm_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(version = tapkiosk_core::VERSION, "tapkiosk starting");

    match args.command {
        Command::Device { config } => device::run(config).await,
        Command::Peer {
            bind,
            device,
            auto_rearm_ms,
        } => peer::run(bind, device, auto_rearm_ms).await,
    }
}
