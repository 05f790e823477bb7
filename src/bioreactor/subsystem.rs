// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Controlled subsystems and setpoint values

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three physical loops driven by the bioreactor firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subsystem {
    /// Temperature loop, °C
    Heating,
    /// Impeller speed loop, RPM
    Stirring,
    /// Acidity loop
    Ph,
}

impl Subsystem {
    /// All subsystems in wire order (telemetry fields appear in this order)
    pub const ALL: [Subsystem; 3] = [Subsystem::Heating, Subsystem::Stirring, Subsystem::Ph];

    /// Two-character tag prefixing a setpoint write command
    pub fn write_tag(self) -> &'static str {
        match self {
            Subsystem::Heating => "HW",
            Subsystem::Stirring => "SW",
            Subsystem::Ph => "PW",
        }
    }

    /// Two-character tag prefixing a telemetry field
    pub fn read_tag(self) -> &'static str {
        match self {
            Subsystem::Heating => "HR",
            Subsystem::Stirring => "SR",
            Subsystem::Ph => "PR",
        }
    }

    /// Stirring setpoints and readings are whole RPM values
    pub fn is_integral(self) -> bool {
        matches!(self, Subsystem::Stirring)
    }

    /// Subsystem owning the given write tag
    pub fn from_write_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.write_tag() == tag)
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subsystem::Heating => "heating",
            Subsystem::Stirring => "stirring",
            Subsystem::Ph => "pH",
        };
        f.write_str(name)
    }
}

impl FromStr for Subsystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heating" | "h" | "temp" | "temperature" => Ok(Subsystem::Heating),
            "stirring" | "s" | "rpm" => Ok(Subsystem::Stirring),
            "ph" | "p" => Ok(Subsystem::Ph),
            other => Err(format!("unknown subsystem '{}'", other)),
        }
    }
}

/// A setpoint as entered by the user and sent to the device.
///
/// Heating and pH setpoints are decimals, stirring setpoints are whole RPM.
/// The [`Display`](fmt::Display) form is the one transmitted on the wire:
/// decimals always carry a fractional part (`30` prints as `30.0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetpointValue {
    Rpm(i64),
    Decimal(f64),
}

impl SetpointValue {
    /// Default setpoint value for a subsystem, typed accordingly
    pub fn for_subsystem(subsystem: Subsystem, value: f64) -> Self {
        if subsystem.is_integral() {
            SetpointValue::Rpm(value as i64)
        } else {
            SetpointValue::Decimal(value)
        }
    }

    /// Numeric value, for range checks
    pub fn as_f64(&self) -> f64 {
        match *self {
            SetpointValue::Rpm(v) => v as f64,
            SetpointValue::Decimal(v) => v,
        }
    }
}

impl fmt::Display for SetpointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SetpointValue::Rpm(v) => write!(f, "{}", v),
            SetpointValue::Decimal(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 => {
                write!(f, "{:.1}", v)
            }
            SetpointValue::Decimal(v) => write!(f, "{}", v),
        }
    }
}
