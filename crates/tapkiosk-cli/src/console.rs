//! Line-oriented stdin commands.
//!
//! Stdin is read on a dedicated OS thread so a pending read never holds up
//! runtime shutdown; parsed commands are forwarded over a channel.

use std::io::BufRead;
use std::str::FromStr;

use anyhow::{Context, bail};
use tapkiosk_core::TagUid;
use tokio::sync::mpsc;
use tracing::warn;

/// A command typed on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Press,
    Release,
    Tag(TagUid),
    Remove,
    Finish,
    Status,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

        let command = match word.to_ascii_lowercase().as_str() {
            "press" => ConsoleCommand::Press,
            "release" => ConsoleCommand::Release,
            "tag" => {
                let uid = TagUid::from_hex(rest).with_context(|| format!("bad tag UID '{rest}'"))?;
                ConsoleCommand::Tag(uid)
            }
            "remove" => ConsoleCommand::Remove,
            "finish" => ConsoleCommand::Finish,
            "status" => ConsoleCommand::Status,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => bail!("unknown command '{other}'"),
        };
        Ok(command)
    }
}

/// Start reading stdin. The channel closes at end of input.
pub fn spawn_stdin_reader() -> mpsc::Receiver<ConsoleCommand> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<ConsoleCommand>() {
                Ok(command) => {
                    if tx.blocking_send(command).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{e:#}"),
            }
        }
    });

    rx
}
