// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry data log
//!
//! Every completed poll cycle produces one [`LogRecord`], appended to:
//! - a per-run text file, opened once at startup in append mode, starting
//!   with the header line [`LOG_HEADER`], then one `heating,rpm,ph,time` line
//!   per record
//! - a bounded in-memory history used for display, newest record first

use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::DataLogConfig;

/// First line of every data log file
pub const LOG_HEADER: &str = "Temp  RPM  pH   Time";

/// Failure of the durable log
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to open data log {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write data log {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One logged poll cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub heating: String,
    pub stirring_smoothed: i64,
    pub ph: String,
    /// Elapsed run time, `H:MM:SS`
    pub elapsed: String,
}

impl LogRecord {
    /// Line written to the log file
    pub fn to_file_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.heating, self.stirring_smoothed, self.ph, self.elapsed
        )
    }

    /// Line shown in the on-screen history
    pub fn to_display_line(&self) -> String {
        format!(
            "Temp:{} RPM:{} pH:{} Time:{}",
            self.heating, self.stirring_smoothed, self.ph, self.elapsed
        )
    }
}

/// Append-only telemetry logger
#[derive(Debug)]
pub struct TelemetryLogger {
    /// `None` when the durable file could not be opened at startup
    file: Option<(PathBuf, File)>,
    history: VecDeque<LogRecord>,
    history_capacity: usize,
}

impl TelemetryLogger {
    /// Open the log file for a run started at `started_at`.
    ///
    /// The file is `<directory>/<file_prefix>_<YYYY-MM-DD_HH-MM-SS>.txt`.
    pub fn create(
        config: &DataLogConfig,
        started_at: DateTime<Local>,
    ) -> Result<Self, PersistenceError> {
        let directory = Path::new(&config.directory);
        if !directory.exists() {
            debug!("Creating data log directory {:?}", directory);
            fs::create_dir_all(directory).map_err(|source| PersistenceError::Open {
                path: directory.to_path_buf(),
                source,
            })?;
        }
        let file_name = format!(
            "{}_{}.txt",
            config.file_prefix,
            started_at.format("%Y-%m-%d_%H-%M-%S")
        );
        Self::open(directory.join(file_name), config.display_capacity)
    }

    /// Open (or continue) a log at an explicit path and write the header
    pub fn open<P: AsRef<Path>>(
        path: P,
        history_capacity: usize,
    ) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| PersistenceError::Open {
                path: path.clone(),
                source,
            })?;
        writeln!(file, "{}", LOG_HEADER)
            .and_then(|_| file.flush())
            .map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;
        info!("Logging telemetry to {:?}", path);

        Ok(Self {
            file: Some((path, file)),
            history: VecDeque::with_capacity(history_capacity.max(1)),
            history_capacity: history_capacity.max(1),
        })
    }

    /// Logger keeping only the in-memory history
    pub fn display_only(history_capacity: usize) -> Self {
        Self {
            file: None,
            history: VecDeque::with_capacity(history_capacity.max(1)),
            history_capacity: history_capacity.max(1),
        }
    }

    /// Path of the durable log, if any
    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|(path, _)| path.as_path())
    }

    /// Append a record to both sinks.
    ///
    /// The in-memory history is always updated; an error only reports that
    /// the durable write failed.
    pub fn append(&mut self, record: LogRecord) -> Result<(), PersistenceError> {
        let line = record.to_file_line();

        self.history.push_front(record);
        self.history.truncate(self.history_capacity);

        if let Some((path, file)) = self.file.as_mut() {
            writeln!(file, "{}", line)
                .and_then(|_| file.flush())
                .map_err(|source| PersistenceError::Write {
                    path: path.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Recent records, newest first
    pub fn history(&self) -> impl Iterator<Item = &LogRecord> {
        self.history.iter()
    }

    /// Maximum number of records kept in the history
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }
}
