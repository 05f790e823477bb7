// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

// Main entry point for the bioreactor serial controller
use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use tokio::signal;

use rust_bioreactor::config::{self, Config};
use rust_bioreactor::console::{run_console, spawn_stdin_reader};
use rust_bioreactor::daemon::Daemon;
use rust_bioreactor::serial::list_ports;

/// Host controller for a serial-attached bioreactor
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file (YAML format)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to a configuration to validate and exit
    #[arg(long)]
    validate_config: Option<PathBuf>,

    /// Output the configuration schema as JSON and exit
    #[arg(long)]
    show_config_schema: bool,

    /// Serial device of the bioreactor
    #[arg(short = 'd', long)]
    device: Option<String>,

    /// Serial line speed
    #[arg(short = 'b', long)]
    baud_rate: Option<u32>,

    /// Use the simulated bioreactor instead of a serial device
    #[arg(long)]
    mock: bool,

    /// Seconds between telemetry polls
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Directory receiving the data log
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run without the interactive console, until Ctrl+C
    #[arg(long)]
    headless: bool,

    /// Enable verbose logging (debug level)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Disable all logging output
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// List the serial ports of this host and exit
    #[arg(long = "list-ports", default_value_t = false)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_ports {
        println!("Available serial ports:");
        for port in list_ports()? {
            println!("- {}", port);
        }
        return Ok(());
    }

    // Initialize logger with appropriate level based on verbose and quiet flags
    let log_level = if args.quiet {
        log::LevelFilter::Off
    } else if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if args.show_config_schema {
        return config::output_config_schema();
    }

    if let Some(validate_path) = args.validate_config {
        if !validate_path.exists() {
            return Err(anyhow::anyhow!(
                "Configuration file does not exist: {}",
                validate_path.display()
            ));
        }
        Config::from_file(&validate_path)
            .map_err(|err| anyhow::anyhow!("Configuration validation failed: {:#}", err))?;
        println!("Configuration file is valid: {}", validate_path.display());
        return Ok(());
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("config.yaml"));
    let mut config = Config::from_file(&config_path)?;

    config.apply_args(
        args.device.clone(),
        args.baud_rate,
        args.mock,
        args.poll_interval,
        args.log_dir.clone(),
    );
    config.validate()?;

    info!("Starting bioreactor controller");
    let mut daemon = Daemon::new();
    let controller = daemon.launch(&config)?;

    if args.headless {
        signal::ctrl_c().await?;
        info!("Received shutdown signal, terminating daemon");
    } else {
        let console = run_console(controller.clone(), spawn_stdin_reader()?);
        tokio::select! {
            result = console => {
                result?;
                info!("Console closed, terminating daemon");
            }
            result = signal::ctrl_c() => {
                result?;
                info!("Received shutdown signal, terminating daemon");
            }
        }
    }

    daemon.shutdown();
    daemon.join().await?;
    Ok(())
}
