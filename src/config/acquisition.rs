// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use serde::{Deserialize, Serialize};

/// Configuration for the telemetry acquisition process.
///
/// This structure contains settings that control how telemetry is polled
/// from the bioreactor and how often the run clock is refreshed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Enable or disable telemetry polling.
    ///
    /// When set to `false`, setpoints can still be written but no telemetry
    /// line is read. Default is `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between two telemetry polls. Default is 1.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Refresh period of the elapsed run time display, in milliseconds.
    ///
    /// Independent from the telemetry cadence. Default is 100ms.
    #[serde(default = "default_display_refresh_ms")]
    pub display_refresh_ms: u64,

    /// Number of stirring samples averaged by the smoothing filter.
    /// Default is 15.
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_display_refresh_ms() -> u64 {
    100
}

fn default_smoothing_window() -> usize {
    15
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            poll_interval_secs: default_poll_interval_secs(),
            display_refresh_ms: default_display_refresh_ms(),
            smoothing_window: default_smoothing_window(),
        }
    }
}
