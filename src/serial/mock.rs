// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated bioreactor
//!
//! Behaves like the firmware seen from the serial port: a boot banner, then
//! one telemetry line per read, with each reading drifting toward its
//! setpoint plus some noise. Setpoint commands written to the link move the
//! targets.

use async_trait::async_trait;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{SerialLink, TransportError};
use crate::bioreactor::{SetpointCommand, Subsystem};
use crate::config::SubsystemsConfig;

/// First line printed by the firmware after reset
pub const BOOT_BANNER: &str = "Bioreactor firmware ready";

/// Fraction of the distance to the setpoint covered on each sample
const CONVERGENCE_RATE: f64 = 0.2;

/// Starting readings: room temperature, impeller stopped, neutral pH
const AMBIENT: [f64; 3] = [20.0, 0.0, 7.0];

/// Noise amplitude per subsystem, in wire order
const NOISE: [f64; 3] = [0.05, 20.0, 0.02];

pub struct MockBioreactorLink {
    setpoints: [f64; 3],
    readings: [f64; 3],
    rng: StdRng,
    banner_pending: bool,
    /// Report stirring with a fractional part every Nth line, as some
    /// firmware builds do
    fractional_every: u64,
    lines_sent: u64,
}

impl MockBioreactorLink {
    /// Simulator starting at the default setpoints
    pub fn new(limits: &SubsystemsConfig) -> Self {
        Self::with_rng(limits, StdRng::from_os_rng())
    }

    /// Reproducible simulator
    pub fn with_seed(limits: &SubsystemsConfig, seed: u64) -> Self {
        Self::with_rng(limits, StdRng::seed_from_u64(seed))
    }

    fn with_rng(limits: &SubsystemsConfig, rng: StdRng) -> Self {
        let setpoints = Subsystem::ALL.map(|s| limits.limits(s).default_setpoint);
        Self {
            setpoints,
            readings: AMBIENT,
            rng,
            banner_pending: true,
            fractional_every: 7,
            lines_sent: 0,
        }
    }

    /// Current target of `subsystem`
    pub fn setpoint(&self, subsystem: Subsystem) -> f64 {
        self.setpoints[index(subsystem)]
    }

    fn step(&mut self) {
        for i in 0..self.readings.len() {
            let noise = self.rng.random_range(-NOISE[i]..=NOISE[i]);
            let next = self.readings[i] + CONVERGENCE_RATE * (self.setpoints[i] - self.readings[i]);
            self.readings[i] = (next + noise).max(0.0);
        }
    }

    fn telemetry_line(&mut self) -> String {
        self.step();
        self.lines_sent += 1;
        let [heating, stirring, ph] = self.readings;
        let stirring = if self.lines_sent % self.fractional_every == 0 {
            format!("{:.2}", stirring)
        } else {
            format!("{}", stirring.round() as i64)
        };
        format!(
            "{}{:.1};{}{};{}{:.1}\r\n",
            Subsystem::Heating.read_tag(),
            heating,
            Subsystem::Stirring.read_tag(),
            stirring,
            Subsystem::Ph.read_tag(),
            ph
        )
    }
}

fn index(subsystem: Subsystem) -> usize {
    match subsystem {
        Subsystem::Heating => 0,
        Subsystem::Stirring => 1,
        Subsystem::Ph => 2,
    }
}

#[async_trait]
impl SerialLink for MockBioreactorLink {
    async fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.banner_pending {
            self.banner_pending = false;
            return Ok(format!("{}\r\n", BOOT_BANNER).into_bytes());
        }
        Ok(self.telemetry_line().into_bytes())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        match SetpointCommand::parse(bytes) {
            Some(command) => {
                debug!("Mock bioreactor received {}", command);
                self.setpoints[index(command.subsystem)] = command.value.as_f64();
            }
            None => warn!(
                "Mock bioreactor ignored unknown command {:?}",
                String::from_utf8_lossy(bytes)
            ),
        }
        Ok(())
    }

    fn description(&self) -> String {
        "mock bioreactor".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bioreactor::{DecodeOutcome, TelemetryDecoder};
    use std::time::Duration;

    #[tokio::test]
    async fn test_banner_then_telemetry() {
        let mut link = MockBioreactorLink::with_seed(&SubsystemsConfig::default(), 7);
        let banner = link.read_line().await.unwrap();
        assert!(matches!(
            TelemetryDecoder::decode(&banner, Duration::ZERO),
            Ok(DecodeOutcome::Ignored(_))
        ));
        for _ in 0..20 {
            let line = link.read_line().await.unwrap();
            assert!(matches!(
                TelemetryDecoder::decode(&line, Duration::ZERO),
                Ok(DecodeOutcome::Frame(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_readings_follow_written_setpoint() {
        let mut link = MockBioreactorLink::with_seed(&SubsystemsConfig::default(), 42);
        link.write_bytes(b"HW30.0").await.unwrap();
        assert_eq!(link.setpoint(Subsystem::Heating), 30.0);

        let mut last = None;
        for _ in 0..60 {
            let line = link.read_line().await.unwrap();
            if let Ok(DecodeOutcome::Frame(frame)) = TelemetryDecoder::decode(&line, Duration::ZERO)
            {
                last = Some(frame);
            }
        }
        let heating: f64 = last.unwrap().heating.parse().unwrap();
        assert!((heating - 30.0).abs() < 0.5, "heating = {}", heating);
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let mut link = MockBioreactorLink::with_seed(&SubsystemsConfig::default(), 1);
        link.write_bytes(b"ZZ12").await.unwrap();
        assert_eq!(link.setpoint(Subsystem::Stirring), 750.0);
    }
}
