//! `tapkiosk peer`: the remote peer simulator.

use std::net::SocketAddr;
use std::time::Duration;

use tapkiosk_network::{PeerCommand, PeerSimulator, PeerSimulatorConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::console::{ConsoleCommand, spawn_stdin_reader};

pub async fn run(
    bind: SocketAddr,
    device: SocketAddr,
    auto_rearm_ms: Option<u64>,
) -> anyhow::Result<()> {
    let simulator = PeerSimulator::bind(PeerSimulatorConfig {
        bind_addr: bind,
        device_addr: device,
        auto_rearm: auto_rearm_ms.map(Duration::from_millis),
    })
    .await?;

    info!(local = %simulator.local_addr()?, "Peer running; type 'finish' or 'quit'");

    let (tx, rx) = mpsc::channel(16);
    let console = tokio::spawn(forward_console(spawn_stdin_reader(), tx.clone()));
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            let _ = tx.send(PeerCommand::Shutdown).await;
        }
    });

    let stats = simulator.run(rx).await?;
    console.abort();
    ctrl_c.abort();

    info!(
        countdowns = stats.countdowns,
        successes = stats.successes,
        failures = stats.failures,
        finishes_sent = stats.finishes_sent,
        "Peer stopped"
    );
    Ok(())
}

/// Forward console commands to the simulator.
///
/// End of input only stops the forwarding; with `--auto-rearm-ms` the peer
/// keeps cycling the device until `quit` or ctrl-c.
async fn forward_console(
    mut commands: mpsc::Receiver<ConsoleCommand>,
    peer: mpsc::Sender<PeerCommand>,
) {
    while let Some(command) = commands.recv().await {
        let forwarded = match command {
            ConsoleCommand::Finish => PeerCommand::Finish,
            ConsoleCommand::Quit => PeerCommand::Shutdown,
            ConsoleCommand::Status => {
                info!("Peer is listening");
                continue;
            }
            other => {
                warn!("{other:?} is a device command");
                continue;
            }
        };
        if peer.send(forwarded).await.is_err() {
            return;
        }
    }

    info!("End of input; running until ctrl-c");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn spawn_simulator(
        commands: mpsc::Receiver<PeerCommand>,
    ) -> tokio::task::JoinHandle<tapkiosk_network::Result<tapkiosk_network::PeerStats>> {
        let simulator = PeerSimulator::bind(PeerSimulatorConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            device_addr: "127.0.0.1:9".parse().unwrap(),
            auto_rearm: Some(Duration::from_millis(10)),
        })
        .await
        .unwrap();
        tokio::spawn(simulator.run(commands))
    }

    #[tokio::test]
    async fn test_end_of_input_keeps_peer_running() {
        let (tx, rx) = mpsc::channel(4);
        let running = spawn_simulator(rx).await;

        let (console_tx, console_rx) = mpsc::channel(4);
        drop(console_tx);
        forward_console(console_rx, tx.clone()).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!running.is_finished());

        tx.send(PeerCommand::Shutdown).await.unwrap();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_quit_stops_peer() {
        let (tx, rx) = mpsc::channel(4);
        let running = spawn_simulator(rx).await;

        let (console_tx, console_rx) = mpsc::channel(4);
        console_tx.send(ConsoleCommand::Quit).await.unwrap();
        let forwarding = tokio::spawn(forward_console(console_rx, tx));

        let stats = running.await.unwrap().unwrap();
        assert_eq!(stats.finishes_sent, 0);
        drop(console_tx);
        forwarding.await.unwrap();
    }
}
