// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Setpoint write command wire format
//!
//! A command is the ASCII concatenation of the write tag and the setpoint
//! value, e.g. `HW25.5` or `SW750`. There is no delimiter, terminator or
//! checksum, and the firmware never acknowledges it.

use std::fmt;

use super::subsystem::{SetpointValue, Subsystem};
use super::validator::AcceptedSetpoint;

/// Encode a setpoint write for `subsystem`
pub fn encode(subsystem: Subsystem, value: &SetpointValue) -> Vec<u8> {
    format!("{}{}", subsystem.write_tag(), value).into_bytes()
}

/// A validated setpoint ready to be written to the serial link
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointCommand {
    pub subsystem: Subsystem,
    pub value: SetpointValue,
}

impl SetpointCommand {
    /// Wire bytes of this command
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self.subsystem, &self.value)
    }

    /// Decode a command as received by the device.
    ///
    /// Returns `None` for unknown tags or values that do not parse.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(bytes).ok()?.trim();
        let tag = text.get(..2)?;
        let subsystem = Subsystem::from_write_tag(tag)?;
        let raw = text.get(2..)?;
        let value = if subsystem.is_integral() {
            SetpointValue::Rpm(raw.parse().ok()?)
        } else {
            SetpointValue::Decimal(raw.parse().ok()?)
        };
        Some(Self { subsystem, value })
    }
}

impl From<AcceptedSetpoint> for SetpointCommand {
    fn from(accepted: AcceptedSetpoint) -> Self {
        Self {
            subsystem: accepted.subsystem,
            value: accepted.value,
        }
    }
}

impl fmt::Display for SetpointCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.subsystem.write_tag(), self.value)
    }
}
