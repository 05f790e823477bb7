// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the bioreactor controller
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings. The configuration is backed by a YAML file and
//! validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `serial`: Serial link driver and endpoint parameters
//! - `acquisition`: Telemetry polling cadence and smoothing window
//! - `data_log`: Location of the per-run data log and display history size
//! - `subsystems`: Setpoint ranges and startup setpoints
//!
//! ## Usage
//!
//! ```no_run
//! use rust_bioreactor::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some("/dev/ttyACM0".to_string()), // Serial device
//!     Some(9600),                       // Baud rate
//!     false,                            // Mock driver
//!     Some(2),                          // Poll interval
//!     None,                             // Log directory
//! );
//!
//! println!("Serial device: {}", config.serial.device);
//! ```

pub mod acquisition;
pub mod data_log;
pub mod serial;
pub mod subsystems;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

// Re-export all types for public API
pub use acquisition::AcquisitionConfig;
pub use data_log::DataLogConfig;
pub use serial::{SerialConfig, SerialDriverType};
pub use subsystems::{SubsystemLimits, SubsystemsConfig};
pub use utils::output_config_schema;

/// Root configuration structure for the bioreactor controller.
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, allowing for minimal configuration files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Serial link settings.
    #[serde(default)]
    pub serial: SerialConfig,

    /// Telemetry acquisition settings.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Data log settings.
    #[serde(default)]
    pub data_log: DataLogConfig,

    /// Subsystem setpoint limits.
    #[serde(default)]
    pub subsystems: SubsystemsConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Original path: {:?}, Sample path: {:?}", path, sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with default values. A file failing schema
    /// validation, deserialization or the specific rules of
    /// [`utils::validate_specific_rules`] produces an error and a
    /// `<name>.sample.yaml` file holding the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        Self::from_yaml_str(&contents).or_else(|err| {
            if let Err(e) = Self::create_sample_config(path) {
                error!("Failed to create sample config: {}", e);
            }
            Err(err.context(format!("Invalid configuration in {}", path.display())))
        })
    }

    /// Parse and validate a configuration from YAML text
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;

        // An empty document means "all defaults"
        let json_value = match serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?
        {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            other => other,
        };

        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        debug!("Validating configuration against schema");
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = serde_json::from_value(json_value)
            .context("Failed to deserialize configuration")?;

        utils::validate_specific_rules(&config)?;

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only explicitly provided values override the loaded configuration.
    ///
    /// # Parameters
    ///
    /// * `device` - Serial device path
    /// * `baud_rate` - Serial line speed
    /// * `mock` - If true, forces the simulated bioreactor driver
    /// * `poll_interval_secs` - Seconds between telemetry polls
    /// * `log_directory` - Directory receiving the data log
    pub fn apply_args(
        &mut self,
        device: Option<String>,
        baud_rate: Option<u32>,
        mock: bool,
        poll_interval_secs: Option<u64>,
        log_directory: Option<PathBuf>,
    ) {
        if let Some(device) = device {
            debug!("Overriding serial device from command line: {}", device);
            self.serial.device = device;
        }

        if let Some(baud_rate) = baud_rate {
            debug!("Overriding baud rate from command line: {}", baud_rate);
            self.serial.baud_rate = baud_rate;
        }

        if mock {
            debug!("Using the simulated bioreactor driver");
            self.serial.driver = SerialDriverType::Mock;
        }

        if let Some(interval) = poll_interval_secs {
            debug!("Overriding poll interval from command line: {}s", interval);
            self.acquisition.poll_interval_secs = interval;
        }

        if let Some(dir) = log_directory {
            debug!("Overriding data log directory from command line: {:?}", dir);
            self.data_log.directory = dir.to_string_lossy().to_string();
        }
    }

    /// Validate the configuration against the specific rules
    pub fn validate(&self) -> Result<()> {
        utils::validate_specific_rules(self)
    }
}
