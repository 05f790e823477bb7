// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Setpoint limits of the controlled subsystems

use serde::{Deserialize, Serialize};

use crate::bioreactor::Subsystem;

/// Accepted setpoint range and startup setpoint of one subsystem.
///
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubsystemLimits {
    /// Lowest accepted setpoint
    pub min: f64,
    /// Highest accepted setpoint
    pub max: f64,
    /// Setpoint assumed at startup, before any user request
    pub default_setpoint: f64,
}

impl SubsystemLimits {
    /// Whether `value` lies inside `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Limits for the three subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsystemsConfig {
    /// Heating, in °C
    #[serde(default = "default_heating")]
    pub heating: SubsystemLimits,

    /// Stirring, in RPM. Bounds and default must be integral.
    #[serde(default = "default_stirring")]
    pub stirring: SubsystemLimits,

    /// pH
    #[serde(default = "default_ph")]
    pub ph: SubsystemLimits,
}

fn default_heating() -> SubsystemLimits {
    SubsystemLimits {
        min: 25.0,
        max: 35.0,
        default_setpoint: 25.0,
    }
}

fn default_stirring() -> SubsystemLimits {
    SubsystemLimits {
        min: 500.0,
        max: 1500.0,
        default_setpoint: 750.0,
    }
}

fn default_ph() -> SubsystemLimits {
    SubsystemLimits {
        min: 3.0,
        max: 7.0,
        default_setpoint: 5.0,
    }
}

impl Default for SubsystemsConfig {
    fn default() -> Self {
        Self {
            heating: default_heating(),
            stirring: default_stirring(),
            ph: default_ph(),
        }
    }
}

impl SubsystemsConfig {
    /// Limits of the given subsystem
    pub fn limits(&self, subsystem: Subsystem) -> &SubsystemLimits {
        match subsystem {
            Subsystem::Heating => &self.heating,
            Subsystem::Stirring => &self.stirring,
            Subsystem::Ph => &self.ph,
        }
    }
}
