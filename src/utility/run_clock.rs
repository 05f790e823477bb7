// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Run time measurement and formatting
//!
//! The elapsed run time is shown as `H:MM:SS` with sub-second precision
//! dropped. Past one day a `N day, ` / `N days, ` prefix is added, so the
//! hour field stays below 24.

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// Monotonic clock started once when the controller starts
#[derive(Debug, Clone, Copy)]
pub struct RunClock {
    start: Instant,
    started_at: DateTime<Local>,
}

impl RunClock {
    /// Capture the start of the run
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            started_at: Local::now(),
        }
    }

    /// Monotonic instant of the start
    pub fn start_instant(&self) -> Instant {
        self.start
    }

    /// Wall clock time of the start, used to name the data log
    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    /// Time elapsed since the start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Format a run duration as `H:MM:SS`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    match days {
        0 => format!("{}:{:02}:{:02}", hours, minutes, seconds),
        1 => format!("1 day, {}:{:02}:{:02}", hours, minutes, seconds),
        n => format!("{} days, {}:{:02}:{:02}", n, hours, minutes, seconds),
    }
}
