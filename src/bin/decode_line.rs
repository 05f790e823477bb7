// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//! Telemetry capture decoder
//!
//! Replays a captured serial stream through the telemetry decoder and the
//! stirring moving average, one line per poll period, and prints the
//! resulting data log.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use rust_bioreactor::bioreactor::{
    DecodeOutcome, LogRecord, TelemetryDecoder, TelemetryLogger, LOG_HEADER,
};
use rust_bioreactor::preprocessing::create_moving_average;
use rust_bioreactor::utility::format_elapsed;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Data log lines (`heating,rpm,ph,time`)
    Log,
    /// One JSON object per record
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "decode_line")]
#[command(author = "Ronan Le Meillat")]
#[command(version = "1.0")]
#[command(about = "Decode a captured bioreactor telemetry stream", long_about = None)]
struct Args {
    /// Captured serial output, one line per poll
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Data log file to write (header plus records)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Moving average window applied to stirring
    #[arg(short = 'w', long, default_value_t = 15)]
    window: usize,

    /// Seconds between two captured lines
    #[arg(short = 'p', long, default_value_t = 1)]
    poll_interval: u64,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Log)]
    format: OutputFormat,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let capture = fs::read(&args.input)
        .with_context(|| format!("Failed to read capture {:?}", args.input))?;

    let mut filter = create_moving_average(args.window);
    let mut logger = match &args.output {
        Some(path) => Some(TelemetryLogger::open(path, 1)?),
        None => None,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.format == OutputFormat::Log {
        writeln!(out, "{}", LOG_HEADER)?;
    }

    let (mut frames, mut ignored, mut malformed) = (0u64, 0u64, 0u64);
    for (index, raw) in capture.split_inclusive(|b| *b == b'\n').enumerate() {
        let elapsed = Duration::from_secs((index as u64 + 1) * args.poll_interval);
        match TelemetryDecoder::decode(raw, elapsed) {
            Ok(DecodeOutcome::Frame(frame)) => {
                frames += 1;
                let record = LogRecord {
                    stirring_smoothed: filter.push(frame.stirring),
                    heating: frame.heating,
                    ph: frame.ph,
                    elapsed: format_elapsed(frame.received_at),
                };
                match args.format {
                    OutputFormat::Log => writeln!(out, "{}", record.to_file_line())?,
                    OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&record)?)?,
                }
                if let Some(logger) = logger.as_mut() {
                    logger.append(record)?;
                }
            }
            Ok(DecodeOutcome::Ignored(line)) => {
                ignored += 1;
                log::debug!("line {}: ignored '{}'", index + 1, line);
            }
            Err(e) => {
                malformed += 1;
                log::warn!("line {}: {}", index + 1, e);
            }
        }
    }

    eprintln!(
        "{} frames, {} ignored lines, {} malformed lines",
        frames, ignored, malformed
    );
    Ok(())
}
