// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry line decoding
//!
//! The firmware reports one line per sample:
//!
//! ```text
//! HR23.4;SR712;PR5.1
//! ```
//!
//! Fields are separated by `;` and always appear in the order heating,
//! stirring, pH. Each field starts with a two character read tag followed by
//! the value. Lines that do not start with `H` (boot banner, debug prints)
//! are not telemetry and are ignored.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Number of `;` separated fields in a telemetry line
const FIELD_COUNT: usize = 3;
/// Length of the read tag prefixing each field
const TAG_LEN: usize = 2;

/// Failure to decode a line that looked like telemetry
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("telemetry line is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("malformed telemetry line '{line}': {reason}")]
    Malformed { line: String, reason: String },
}

impl DecodeError {
    fn malformed(line: &str, reason: impl Into<String>) -> Self {
        DecodeError::Malformed {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// One decoded telemetry line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryFrame {
    /// Heating reading, as reported
    pub heating: String,
    /// Raw stirring reading, fractional part truncated
    pub stirring: i64,
    /// pH reading, as reported
    pub ph: String,
    /// Run time elapsed when the line was decoded
    pub received_at: Duration,
}

/// Result of decoding a line that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Frame(TelemetryFrame),
    /// Not a telemetry line; carries the text for diagnostics
    Ignored(String),
}

/// Stateless decoder for inbound telemetry lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryDecoder;

impl TelemetryDecoder {
    /// Decode one raw line read from the serial link.
    ///
    /// Line terminators and surrounding whitespace are trimmed. Nothing is
    /// produced for a malformed line: either a complete frame comes out or
    /// an error does.
    pub fn decode(raw: &[u8], received_at: Duration) -> Result<DecodeOutcome, DecodeError> {
        let line = std::str::from_utf8(raw)?.trim();

        match line.chars().next() {
            None => return Err(DecodeError::malformed(line, "empty line")),
            Some('H') => {}
            Some(_) => return Ok(DecodeOutcome::Ignored(line.to_string())),
        }

        let fields: Vec<&str> = line.split(';').collect();
        if fields.len() != FIELD_COUNT {
            return Err(DecodeError::malformed(
                line,
                format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
            ));
        }

        let heating = field_value(line, fields[0])?;
        let stirring = parse_stirring(line, field_value(line, fields[1])?)?;
        let ph = field_value(line, fields[2])?;

        Ok(DecodeOutcome::Frame(TelemetryFrame {
            heating: heating.to_string(),
            stirring,
            ph: ph.to_string(),
            received_at,
        }))
    }
}

/// Strip the read tag off a field; the value may be empty
fn field_value<'a>(line: &str, field: &'a str) -> Result<&'a str, DecodeError> {
    field
        .get(TAG_LEN..)
        .ok_or_else(|| DecodeError::malformed(line, format!("field '{}' is too short", field)))
}

/// Stirring may be reported with decimals; the integer part is kept
fn parse_stirring(line: &str, value: &str) -> Result<i64, DecodeError> {
    let parsed: f64 = value.trim().parse().map_err(|_| {
        DecodeError::malformed(line, format!("stirring value '{}' is not a number", value))
    })?;
    if !parsed.is_finite() || parsed.abs() >= i64::MAX as f64 {
        return Err(DecodeError::malformed(
            line,
            format!("stirring value '{}' is out of range", value),
        ));
    }
    Ok(parsed.trunc() as i64)
}
