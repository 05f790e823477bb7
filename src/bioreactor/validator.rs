// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Setpoint validation
//!
//! User input is parsed according to the subsystem type and accepted only if
//! it lies inside the configured inclusive range. Accepted values are passed
//! through unchanged, never clamped or rounded.

use thiserror::Error;

use super::subsystem::{SetpointValue, Subsystem};
use crate::config::{SubsystemLimits, SubsystemsConfig};

/// Reason a setpoint request was refused
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{subsystem} setpoint '{input}' is not a valid {expected}")]
    Unparsable {
        subsystem: Subsystem,
        input: String,
        expected: &'static str,
    },
    #[error("{subsystem} setpoint {value} is outside [{min}, {max}]")]
    OutOfRange {
        subsystem: Subsystem,
        value: SetpointValue,
        min: f64,
        max: f64,
    },
}

/// A setpoint that passed validation and may be transmitted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptedSetpoint {
    pub subsystem: Subsystem,
    pub value: SetpointValue,
}

/// Validates user-requested setpoints against the subsystem limits
#[derive(Debug, Clone, Default)]
pub struct SetpointValidator {
    limits: SubsystemsConfig,
}

impl SetpointValidator {
    pub fn new(limits: SubsystemsConfig) -> Self {
        Self { limits }
    }

    /// Limits applied to `subsystem`
    pub fn limits(&self, subsystem: Subsystem) -> &SubsystemLimits {
        self.limits.limits(subsystem)
    }

    /// Parse and range-check a requested setpoint.
    ///
    /// Heating and pH accept any decimal number, stirring only whole numbers.
    /// Surrounding whitespace is ignored.
    pub fn validate(
        &self,
        subsystem: Subsystem,
        requested: &str,
    ) -> Result<AcceptedSetpoint, ValidationError> {
        let text = requested.trim();
        let value = if subsystem.is_integral() {
            text.parse::<i64>()
                .map(SetpointValue::Rpm)
                .map_err(|_| ValidationError::Unparsable {
                    subsystem,
                    input: requested.to_string(),
                    expected: "integer",
                })?
        } else {
            text.parse::<f64>()
                .map(SetpointValue::Decimal)
                .map_err(|_| ValidationError::Unparsable {
                    subsystem,
                    input: requested.to_string(),
                    expected: "number",
                })?
        };

        let limits = self.limits(subsystem);
        // NaN fails both comparisons and is rejected here
        if !limits.contains(value.as_f64()) {
            return Err(ValidationError::OutOfRange {
                subsystem,
                value,
                min: limits.min,
                max: limits.max,
            });
        }

        Ok(AcceptedSetpoint { subsystem, value })
    }
}
