//! `tapkiosk device`: the session controller on a UDP link.
//!
//! The button and tag reader are mock devices driven from stdin.

use std::path::PathBuf;

use anyhow::Context;
use tapkiosk_controller::{ControllerConfig, SessionController, run_session_loop};
use tapkiosk_core::KioskConfig;
use tapkiosk_hardware::mock::{MockButton, MockButtonHandle, MockTagReader, MockTagReaderHandle};
use tapkiosk_network::{UdpLink, UdpLinkConfig};
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::console::{ConsoleCommand, spawn_stdin_reader};

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => KioskConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => {
            info!("No config file given, using defaults");
            KioskConfig::default()
        }
    };

    let link = UdpLink::bind(UdpLinkConfig::try_from(&config.link)?).await?;

    let (reader, tag) = MockTagReader::new();
    let (button, button_handle) = MockButton::new();
    let mut controller =
        SessionController::new(reader, button, link, ControllerConfig::from(&config))
            .context("failed to register peer")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let console = tokio::spawn(drive_inputs(
        spawn_stdin_reader(),
        button_handle,
        tag,
        shutdown_tx.clone(),
    ));
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(peer = %controller.peer(), "Device running; type 'press', 'tag <uid>' or 'quit'");
    let stats = run_session_loop(&mut controller, config.tick_interval(), shutdown_rx).await;

    console.abort();
    ctrl_c.abort();

    info!(
        stats = %serde_json::to_string(&stats)?,
        delivery = %serde_json::to_string(&controller.delivery_stats())?,
        "Device stopped"
    );
    Ok(())
}

/// Apply console commands to the mock button and tag field.
///
/// Only `quit` requests shutdown. At end of input the device keeps running
/// until ctrl-c, so it can run detached from a terminal.
async fn drive_inputs(
    mut commands: mpsc::Receiver<ConsoleCommand>,
    button: MockButtonHandle,
    tag: MockTagReaderHandle,
    shutdown: watch::Sender<bool>,
) {
    while let Some(command) = commands.recv().await {
        match command {
            ConsoleCommand::Press => {
                button.press();
                info!("Button pressed");
            }
            ConsoleCommand::Release => {
                button.release();
                info!("Button released");
            }
            ConsoleCommand::Tag(uid) => {
                info!(uid = %uid.to_hex(), "Tag placed in field");
                tag.present(uid);
            }
            ConsoleCommand::Remove => {
                tag.remove();
                info!("Tag removed");
            }
            ConsoleCommand::Status => {
                let held = if button.is_pressed() { "held" } else { "released" };
                let current = tag.current_tag().map(|uid| uid.to_hex());
                info!(
                    button = held,
                    tag = current.as_deref().unwrap_or("none"),
                    reads = tag.reads(),
                    "Input status"
                );
            }
            ConsoleCommand::Finish => warn!("'finish' is a peer command"),
            ConsoleCommand::Quit => {
                let _ = shutdown.send(true);
                return;
            }
        }
    }

    info!("End of input; running until ctrl-c");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tapkiosk_hardware::mock::MockLink;

    fn spawn_device(
        shutdown: watch::Receiver<bool>,
    ) -> (
        tokio::task::JoinHandle<tapkiosk_controller::SessionStats>,
        MockButtonHandle,
        MockTagReaderHandle,
    ) {
        let (reader, tag) = MockTagReader::new();
        let (button, button_handle) = MockButton::new();
        let session = tokio::spawn(async move {
            let (link, _radio) = MockLink::new();
            let mut controller =
                SessionController::new(reader, button, link, ControllerConfig::default())
                    .unwrap();
            run_session_loop(&mut controller, Duration::from_millis(1), shutdown).await
        });
        (session, button_handle, tag)
    }

    #[tokio::test]
    async fn test_end_of_input_keeps_device_running() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (session, button, tag) = spawn_device(shutdown_rx);

        let (console_tx, console_rx) = mpsc::channel(4);
        drop(console_tx);
        drive_inputs(console_rx, button, tag, shutdown_tx.clone()).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!*shutdown_tx.borrow());
        assert!(!session.is_finished());

        shutdown_tx.send(true).unwrap();
        session.await.unwrap();
    }

    #[tokio::test]
    async fn test_quit_stops_device() {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (session, button, tag) = spawn_device(shutdown_rx);

        let (console_tx, console_rx) = mpsc::channel(4);
        console_tx.send(ConsoleCommand::Press).await.unwrap();
        console_tx.send(ConsoleCommand::Quit).await.unwrap();
        drive_inputs(console_rx, button.clone(), tag, shutdown_tx.clone()).await;

        assert!(*shutdown_tx.borrow());
        assert!(button.is_pressed());
        session.await.unwrap();
    }
}
