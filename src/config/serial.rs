// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial link configuration
//!
//! Selects the link driver and the parameters of the serial endpoint the
//! bioreactor firmware is attached to.

use serde::{Deserialize, Serialize};

/// Serial link driver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialDriverType {
    /// Real serial device opened through `tokio-serial`
    Native,
    /// Simulated bioreactor, no hardware required
    Mock,
}

/// Configuration for the serial endpoint.
///
/// # Example
///
/// ```
/// use rust_bioreactor::config::{SerialConfig, SerialDriverType};
///
/// let serial = SerialConfig {
///     driver: SerialDriverType::Native,
///     device: "/dev/ttyACM0".to_string(),
///     baud_rate: 9600,
///     read_timeout_ms: 2000,
///     write_retries: 1,
/// };
/// assert_eq!(serial.read_timeout().as_millis(), 2000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Link driver to use.
    #[serde(default = "default_driver")]
    pub driver: SerialDriverType,

    /// Device path of the serial endpoint (e.g. "/dev/ttyACM0").
    ///
    /// The default matches the simavr UART pseudo-terminal used during
    /// firmware development.
    #[serde(default = "default_device")]
    pub device: String,

    /// Line speed in bauds. The firmware runs at 9600.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound for a single telemetry line read, in milliseconds.
    ///
    /// A read that does not complete a line within this delay is abandoned
    /// and the poll cycle is skipped.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Number of additional attempts for a setpoint write that failed at the
    /// transport level. `0` disables retrying.
    #[serde(default)]
    pub write_retries: u32,
}

fn default_driver() -> SerialDriverType {
    SerialDriverType::Native
}

fn default_device() -> String {
    "/tmp/simavr-uart0".to_string()
}

fn default_baud_rate() -> u32 {
    9600
}

fn default_read_timeout_ms() -> u64 {
    2000
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            device: default_device(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            write_retries: 0,
        }
    }
}

impl SerialConfig {
    /// Read timeout as a [`std::time::Duration`]
    pub fn read_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.read_timeout_ms)
    }
}
