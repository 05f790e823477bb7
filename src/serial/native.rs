// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Serial link over a real device

use async_trait::async_trait;
use log::{debug, info, warn};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use super::{SerialLink, TransportError};

/// Serial link over a device opened with `tokio-serial`.
///
/// One connection serves both telemetry reads and setpoint writes. The port
/// is opened on first use and dropped after any I/O failure, so the next
/// exchange reopens it once the device is back.
pub struct NativeSerialLink {
    device: String,
    baud_rate: u32,
    read_timeout: Duration,
    port: Option<BufReader<SerialStream>>,
    /// Bytes of a line not yet terminated, kept across timed out reads
    pending: Vec<u8>,
}

impl NativeSerialLink {
    pub fn new(device: &str, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            device: device.to_string(),
            baud_rate,
            read_timeout,
            port: None,
            pending: Vec::new(),
        }
    }

    fn ensure_open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        debug!("Opening serial port {} at {} bauds", self.device, self.baud_rate);
        let stream = tokio_serial::new(&self.device, self.baud_rate)
            .timeout(self.read_timeout)
            .open_native_async()
            .map_err(|e| TransportError::Unavailable {
                device: self.device.clone(),
                reason: e.to_string(),
            })?;
        info!("Serial port {} opened", self.device);
        self.port = Some(BufReader::new(stream));
        self.pending.clear();
        Ok(())
    }

    fn drop_port(&mut self, reason: &str) {
        if self.port.take().is_some() {
            warn!("Closing serial port {}: {}", self.device, reason);
        }
        self.pending.clear();
    }
}

#[async_trait]
impl SerialLink for NativeSerialLink {
    async fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        self.ensure_open()?;
        let timeout = self.read_timeout;
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        let read = tokio::time::timeout(timeout, port.read_until(b'\n', &mut self.pending)).await;
        match read {
            // Partial bytes stay in `pending` and complete on the next read
            Err(_) => Err(TransportError::Timeout(timeout)),
            Ok(Ok(0)) => {
                self.drop_port("end of stream");
                Err(TransportError::Closed)
            }
            Ok(Ok(_)) => Ok(std::mem::take(&mut self.pending)),
            Ok(Err(e)) => {
                self.drop_port(&e.to_string());
                Err(TransportError::Io(e))
            }
        }
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.ensure_open()?;
        let timeout = self.read_timeout;
        let port = self.port.as_mut().ok_or(TransportError::Closed)?;

        let write = async {
            port.get_mut().write_all(bytes).await?;
            port.get_mut().flush().await
        };
        let written = tokio::time::timeout(timeout, write).await;
        match written {
            Err(_) => {
                self.drop_port("write timed out");
                Err(TransportError::Timeout(timeout))
            }
            Ok(Err(e)) => {
                self.drop_port(&e.to_string());
                Err(TransportError::Io(e))
            }
            Ok(Ok(())) => Ok(()),
        }
    }

    fn description(&self) -> String {
        format!("{} @ {} bauds", self.device, self.baud_rate)
    }
}
