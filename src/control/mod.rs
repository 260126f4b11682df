//! Remote command surface.
//!
//! The original device accepted one-line commands over a serial Bluetooth
//! link (`ligar`, `desligar`, `parar`, …). The host build keeps the same
//! wire strings and drives them from stdin; any other line-based transport
//! can implement [`ControlLink`].
//!
//! Commands are polled non-blockingly once per loop iteration, never
//! mid-window, so they cannot interleave with acquisition.

use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A parsed remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resume monitoring (`ligar`).
    Enable,
    /// Suspend monitoring (`desligar`).
    Disable,
    /// Stop any melody playback (`parar`).
    StopMelody,
    /// Report whether monitoring is active (`status`).
    Status,
    /// Show a free-form message on the display (`msg:<text>`).
    Message(String),
    /// Run one acquisition + classification and report it (`leitura`).
    ForceReading,
    /// Set melody volume in percent (`volume:<0-100>`).
    SetVolume(u8),
    /// Shut the monitor down (`sair`).
    Quit,
}

// ---------------------------------------------------------------------------
// parse_command
// ---------------------------------------------------------------------------

/// Parse one command line into a [`Command`].
///
/// Keywords are case-insensitive; the `msg:` payload keeps its original
/// case. Returns `None` for unknown commands and out-of-range volumes.
///
/// ```
/// use acalanto::control::{parse_command, Command};
///
/// assert_eq!(parse_command("ligar"), Some(Command::Enable));
/// assert_eq!(parse_command("volume:40"), Some(Command::SetVolume(40)));
/// assert_eq!(parse_command("volume:140"), None);
/// assert_eq!(parse_command("reboot"), None);
/// ```
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    let lower = line.to_lowercase();

    match lower.as_str() {
        "ligar" => Some(Command::Enable),
        "desligar" => Some(Command::Disable),
        "parar" => Some(Command::StopMelody),
        "status" => Some(Command::Status),
        "leitura" => Some(Command::ForceReading),
        "sair" => Some(Command::Quit),
        _ if lower.starts_with("msg:") => line
            .get(4..)
            .map(|payload| Command::Message(payload.trim().to_string())),
        _ if lower.starts_with("volume:") => lower[7..]
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|v| *v <= 100)
            .map(Command::SetVolume),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ControlLink trait
// ---------------------------------------------------------------------------

/// A line-based remote control transport.
pub trait ControlLink: Send {
    /// Return the next pending command, if any, without blocking.
    fn poll(&mut self) -> Option<Command>;

    /// Send a human-readable response back over the link. Best-effort.
    fn reply(&mut self, message: &str);
}

// ---------------------------------------------------------------------------
// StdinLink
// ---------------------------------------------------------------------------

/// [`ControlLink`] over standard input.
///
/// A reader thread forwards lines through a channel; [`poll`] drains it
/// without blocking. Unknown commands are logged and dropped.
///
/// [`poll`]: ControlLink::poll
pub struct StdinLink {
    rx: Receiver<String>,
}

impl StdinLink {
    /// Spawn the stdin reader thread.
    pub fn start() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::Builder::new()
            .name("control-stdin".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    match line {
                        Ok(line) => {
                            if tx.send(line).is_err() {
                                return; // monitor gone
                            }
                        }
                        Err(e) => {
                            log::warn!("control: stdin read failed: {e}");
                            return;
                        }
                    }
                }
            })
            .expect("failed to spawn control-stdin thread");

        Self { rx }
    }
}

impl ControlLink for StdinLink {
    fn poll(&mut self) -> Option<Command> {
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    if let Some(cmd) = parse_command(&line) {
                        return Some(cmd);
                    }
                    if !line.trim().is_empty() {
                        log::warn!("control: unknown command {line:?}");
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    fn reply(&mut self, message: &str) {
        println!("{message}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_keywords() {
        assert_eq!(parse_command("ligar"), Some(Command::Enable));
        assert_eq!(parse_command("desligar"), Some(Command::Disable));
        assert_eq!(parse_command("parar"), Some(Command::StopMelody));
        assert_eq!(parse_command("status"), Some(Command::Status));
        assert_eq!(parse_command("leitura"), Some(Command::ForceReading));
        assert_eq!(parse_command("sair"), Some(Command::Quit));
    }

    #[test]
    fn keywords_are_case_insensitive_and_trimmed() {
        assert_eq!(parse_command("  LIGAR  "), Some(Command::Enable));
        assert_eq!(parse_command("Status"), Some(Command::Status));
    }

    #[test]
    fn message_payload_keeps_its_case() {
        assert_eq!(
            parse_command("msg: Boa Noite "),
            Some(Command::Message("Boa Noite".into()))
        );
        assert_eq!(
            parse_command("MSG:oi"),
            Some(Command::Message("oi".into()))
        );
    }

    #[test]
    fn empty_message_is_allowed() {
        assert_eq!(parse_command("msg:"), Some(Command::Message(String::new())));
    }

    #[test]
    fn volume_parses_within_range() {
        assert_eq!(parse_command("volume:0"), Some(Command::SetVolume(0)));
        assert_eq!(parse_command("volume:100"), Some(Command::SetVolume(100)));
        assert_eq!(parse_command("volume: 40"), Some(Command::SetVolume(40)));
    }

    #[test]
    fn volume_out_of_range_or_garbage_is_rejected() {
        assert_eq!(parse_command("volume:101"), None);
        assert_eq!(parse_command("volume:-1"), None);
        assert_eq!(parse_command("volume:loud"), None);
        assert_eq!(parse_command("volume:"), None);
    }

    #[test]
    fn unknown_commands_are_rejected() {
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("reboot"), None);
        assert_eq!(parse_command("ligar agora"), None);
    }
}
