// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Line oriented operator console
//!
//! Commands, one per line:
//!
//! ```text
//! heating 30      set a setpoint (also: stirring 800, ph 5.5)
//! status          current values, setpoints and elapsed time
//! log             recent data log lines, newest first
//! help            this list
//! quit            stop the controller
//! ```

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fmt::Write;
use std::io::BufRead;
use std::thread;
use tokio::sync::mpsc;

use crate::bioreactor::{BioreactorController, BioreactorState, LinkStatus, Subsystem, LOG_HEADER};

const HELP: &str = "Commands:
  heating <value>   set the temperature setpoint (°C)
  stirring <value>  set the stirring setpoint (RPM)
  ph <value>        set the pH setpoint
  status            show current values and setpoints
  log               show recent data log lines
  help              show this help
  quit              stop the controller";

/// One parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    SetSetpoint { subsystem: Subsystem, value: String },
    Status,
    Log,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line; blank lines yield `None`
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "status" | "st" => ConsoleCommand::Status,
            "log" => ConsoleCommand::Log,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => {
                let subsystem: Subsystem = other
                    .parse()
                    .map_err(|_| format!("unknown command '{}', try 'help'", verb))?;
                let value = words
                    .next()
                    .ok_or_else(|| format!("missing value for {} setpoint", subsystem))?;
                if words.next().is_some() {
                    return Err(format!("expected a single value for {} setpoint", subsystem));
                }
                ConsoleCommand::SetSetpoint {
                    subsystem,
                    value: value.to_string(),
                }
            }
        };
        Ok(Some(command))
    }
}

/// Render the status panel
pub fn render_status(state: &BioreactorState) -> String {
    let mut out = String::new();
    let link = match &state.link_status {
        LinkStatus::Unknown => "waiting".to_string(),
        LinkStatus::Connected => "connected".to_string(),
        LinkStatus::Error { message } => format!("error ({})", message),
    };
    let _ = writeln!(out, "Time {}  link {}", state.elapsed, link);
    for subsystem in Subsystem::ALL {
        let s = state.subsystem(subsystem);
        let _ = writeln!(
            out,
            "{:<9} current {:<7} setpoint {:<7} range [{}, {}]",
            subsystem.to_string(),
            s.current_value.as_deref().unwrap_or("-"),
            s.setpoint.to_string(),
            s.limits.min,
            s.limits.max
        );
    }
    let stats = &state.statistics;
    let _ = write!(
        out,
        "{} frames, {} ignored, {} decode errors, {} transport errors, {} log errors",
        stats.frames,
        stats.ignored_lines,
        stats.decode_errors,
        stats.transport_errors,
        stats.persistence_errors
    );
    out
}

/// Render the recent data log, newest first
pub fn render_log(state: &BioreactorState) -> String {
    let mut out = String::from(LOG_HEADER);
    for record in &state.recent_records {
        out.push('\n');
        out.push_str(&record.to_display_line());
    }
    out
}

/// Execute one command and return the text to print, or `None` on quit
pub async fn execute(controller: &BioreactorController, command: ConsoleCommand) -> Option<String> {
    let reply = match command {
        ConsoleCommand::SetSetpoint { subsystem, value } => {
            match controller.submit_setpoint(subsystem, &value).await {
                Ok(sent) => format!("{} setpoint set to {} (sent {})", subsystem, sent.value, sent),
                Err(e) => format!("Setpoint refused: {}", e),
            }
        }
        ConsoleCommand::Status => render_status(&controller.snapshot().await),
        ConsoleCommand::Log => render_log(&controller.snapshot().await),
        ConsoleCommand::Help => HELP.to_string(),
        ConsoleCommand::Quit => return None,
    };
    Some(reply)
}

/// Read stdin on a dedicated thread and forward its lines.
///
/// A blocked stdin read cannot be cancelled, so it stays off the runtime;
/// the thread ends with stdin or when the receiver is dropped.
pub fn spawn_stdin_reader() -> Result<mpsc::UnboundedReceiver<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Console input failed: {}", e);
                        break;
                    }
                }
            }
            debug!("Console input closed");
        })
        .context("Failed to start the console input thread")?;
    Ok(rx)
}

/// Execute console lines until `quit` or end of input
pub async fn run_console(
    controller: BioreactorController,
    mut lines: mpsc::UnboundedReceiver<String>,
) -> Result<()> {
    println!("{}", HELP);
    while let Some(line) = lines.recv().await {
        match ConsoleCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(command)) => match execute(&controller, command).await {
                Some(reply) => println!("{}", reply),
                None => break,
            },
            Err(message) => println!("{}", message),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SubsystemsConfig;

    #[test]
    fn test_parse_commands() {
        assert_eq!(ConsoleCommand::parse("   "), Ok(None));
        assert_eq!(ConsoleCommand::parse("STATUS"), Ok(Some(ConsoleCommand::Status)));
        assert_eq!(ConsoleCommand::parse("quit"), Ok(Some(ConsoleCommand::Quit)));
        assert_eq!(
            ConsoleCommand::parse("heating 30"),
            Ok(Some(ConsoleCommand::SetSetpoint {
                subsystem: Subsystem::Heating,
                value: "30".to_string()
            }))
        );
        assert_eq!(
            ConsoleCommand::parse("rpm 800"),
            Ok(Some(ConsoleCommand::SetSetpoint {
                subsystem: Subsystem::Stirring,
                value: "800".to_string()
            }))
        );
        assert!(ConsoleCommand::parse("ph").is_err());
        assert!(ConsoleCommand::parse("ph 5 6").is_err());
        assert!(ConsoleCommand::parse("reboot").is_err());
    }

    #[test]
    fn test_render_status_before_first_frame() {
        let state = BioreactorState::new(&SubsystemsConfig::default());
        let text = render_status(&state);
        assert!(text.starts_with("Time 0:00:00  link waiting"));
        assert!(text.contains("heating   current -       setpoint 25.0"));
        assert!(text.contains("stirring  current -       setpoint 750"));
    }

    #[tokio::test]
    async fn test_console_stops_at_quit() {
        let (commands, mut link_rx) = mpsc::unbounded_channel();
        let controller = BioreactorController::new(
            crate::bioreactor::SetpointValidator::default(),
            commands,
            BioreactorState::shared(&SubsystemsConfig::default()),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        for line in ["heating 40", "status", "quit", "heating 30"] {
            tx.send(line.to_string()).unwrap();
        }

        run_console(controller, rx).await.unwrap();
        // 40 is out of range and nothing after quit is executed
        assert!(link_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_console_ends_with_input() {
        let (commands, _link_rx) = mpsc::unbounded_channel();
        let controller = BioreactorController::new(
            crate::bioreactor::SetpointValidator::default(),
            commands,
            BioreactorState::shared(&SubsystemsConfig::default()),
        );
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        drop(tx);
        assert!(run_console(controller, rx).await.is_ok());
    }

    #[test]
    fn test_render_empty_log() {
        let state = BioreactorState::new(&SubsystemsConfig::default());
        assert_eq!(render_log(&state), LOG_HEADER);
    }
}
