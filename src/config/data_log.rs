// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use serde::{Deserialize, Serialize};

/// Configuration for the telemetry data log.
///
/// One log file is created per run inside `directory`, named
/// `<file_prefix>_<startup timestamp>.txt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataLogConfig {
    /// Directory receiving the log files. Created if missing.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// File name prefix of the log files.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Number of most recent records kept in memory for display.
    #[serde(default = "default_display_capacity")]
    pub display_capacity: usize,
}

fn default_directory() -> String {
    ".".to_string()
}

fn default_file_prefix() -> String {
    "data_log".to_string()
}

fn default_display_capacity() -> usize {
    100
}

impl Default for DataLogConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            file_prefix: default_file_prefix(),
            display_capacity: default_display_capacity(),
        }
    }
}
