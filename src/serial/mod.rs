// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial link to the bioreactor firmware
//!
//! The link is line oriented and half duplex: the firmware streams telemetry
//! lines terminated by `\n`, the host writes bare setpoint commands. There is
//! no handshake and no acknowledgement.
//!
//! Drivers:
//! - [`native::NativeSerialLink`]: real device through `tokio-serial`
//! - [`mock::MockBioreactorLink`]: simulated bioreactor for development

pub mod mock;
pub mod native;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::{SerialConfig, SerialDriverType, SubsystemsConfig};

pub use mock::MockBioreactorLink;
pub use native::NativeSerialLink;

/// Failure of the serial transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("serial endpoint {device} unavailable: {reason}")]
    Unavailable { device: String, reason: String },
    #[error("no complete line received within {0:?}")]
    Timeout(Duration),
    #[error("serial endpoint closed")]
    Closed,
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serial link driver trait for hardware abstraction
#[async_trait]
pub trait SerialLink: Send {
    /// Read one line, terminator included
    async fn read_line(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Write raw command bytes
    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Human readable description of the endpoint, for logs
    fn description(&self) -> String;
}

/// Create the serial link driver selected by the configuration.
///
/// Native links open the device lazily, so a missing device is reported on
/// the first exchange rather than here.
pub fn create_serial_link(
    config: &SerialConfig,
    limits: &SubsystemsConfig,
) -> Box<dyn SerialLink> {
    match config.driver {
        SerialDriverType::Native => Box::new(NativeSerialLink::new(
            &config.device,
            config.baud_rate,
            config.read_timeout(),
        )),
        SerialDriverType::Mock => Box::new(MockBioreactorLink::new(limits)),
    }
}

/// Names of the serial ports present on this host
pub fn list_ports() -> Result<Vec<String>> {
    let ports = tokio_serial::available_ports().context("Failed to enumerate serial ports")?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
