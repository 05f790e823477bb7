// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Daemon Module
//!
//! Runs the background tasks of the controller:
//!
//! * **Poll loop**: owns the serial link, polls telemetry and writes setpoints
//! * **Display clock**: refreshes the elapsed run time several times a second
//! * **Heartbeat**: periodically logs the poll statistics
//!
//! ## Usage
//!
//! ```no_run
//! use rust_bioreactor::{config::Config, daemon::Daemon};
//!
//! async fn run() -> anyhow::Result<()> {
//!     let config = Config::from_file("config.yaml")?;
//!
//!     let mut daemon = Daemon::new();
//!     let controller = daemon.launch(&config)?;
//!     controller.submit_setpoint("heating".parse().unwrap(), "30").await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!
//!     daemon.shutdown();
//!     daemon.join().await?;
//!     Ok(())
//! }
//! ```

pub mod launch_daemon;

pub use launch_daemon::Daemon;
