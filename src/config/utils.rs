// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::{Config, SubsystemLimits};

/// Output the embedded JSON schema to the console.
///
/// This function is called when the `--show-config-schema` flag is provided
/// on the command line.
///
/// # Example
///
/// ```bash
/// ./rust_bioreactor --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema_str = include_str!("../../resources/config.schema.json");

    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

fn check_limits(name: &str, limits: &SubsystemLimits) -> Result<()> {
    if !limits.min.is_finite() || !limits.max.is_finite() {
        anyhow::bail!("{} limits must be finite numbers", name);
    }
    if limits.min >= limits.max {
        anyhow::bail!(
            "{} minimum ({}) must be lower than maximum ({})",
            name,
            limits.min,
            limits.max
        );
    }
    if !limits.contains(limits.default_setpoint) {
        anyhow::bail!(
            "{} default setpoint {} is outside [{}, {}]",
            name,
            limits.default_setpoint,
            limits.min,
            limits.max
        );
    }
    Ok(())
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Subsystem limits**: `min < max` and the default setpoint lies inside the range
/// - **Stirring**: bounds and default setpoint are whole RPM values
/// - **Acquisition**: poll interval, display refresh and smoothing window are non zero
/// - **Serial**: baud rate and read timeout are non zero, device path is not empty
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    check_limits("heating", &config.subsystems.heating)?;
    check_limits("stirring", &config.subsystems.stirring)?;
    check_limits("ph", &config.subsystems.ph)?;

    let stirring = &config.subsystems.stirring;
    if [stirring.min, stirring.max, stirring.default_setpoint]
        .iter()
        .any(|v| v.fract() != 0.0)
    {
        anyhow::bail!("stirring limits and default setpoint must be whole RPM values");
    }

    if config.acquisition.poll_interval_secs == 0 {
        anyhow::bail!("acquisition.poll_interval_secs must be at least 1");
    }
    if config.acquisition.display_refresh_ms == 0 {
        anyhow::bail!("acquisition.display_refresh_ms must be at least 1");
    }
    if config.acquisition.smoothing_window == 0 {
        anyhow::bail!("acquisition.smoothing_window must be at least 1");
    }

    if config.serial.baud_rate == 0 {
        anyhow::bail!("serial.baud_rate must be positive");
    }
    if config.serial.read_timeout_ms == 0 {
        anyhow::bail!("serial.read_timeout_ms must be positive");
    }
    if config.serial.device.trim().is_empty() {
        anyhow::bail!("serial.device must not be empty");
    }

    if config.data_log.display_capacity == 0 {
        anyhow::bail!("data_log.display_capacity must be at least 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_specific_rules(&Config::default()).is_ok());
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let mut config = Config::default();
        config.subsystems.ph.min = 8.0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_default_setpoint_outside_range_is_rejected() {
        let mut config = Config::default();
        config.subsystems.heating.default_setpoint = 40.0;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_fractional_stirring_bound_is_rejected() {
        let mut config = Config::default();
        config.subsystems.stirring.max = 1499.5;
        assert!(validate_specific_rules(&config).is_err());
    }

    #[test]
    fn test_zero_window_is_rejected() {
        let mut config = Config::default();
        config.acquisition.smoothing_window = 0;
        assert!(validate_specific_rules(&config).is_err());
    }
}
