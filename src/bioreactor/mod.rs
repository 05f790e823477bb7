// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Bioreactor control
//!
//! Host side of the bioreactor serial protocol:
//!
//! - [`SetpointValidator`] checks operator setpoints against the subsystem limits
//! - [`SetpointCommand`] encodes accepted setpoints (`HW30.0`, `SW750`, `PW5.0`)
//! - [`TelemetryDecoder`] decodes telemetry lines (`HR29.8;SR690;PR5.0`)
//! - [`PollLoop`] owns the serial link, polls telemetry and serves writes
//! - [`TelemetryLogger`] keeps the per-run log file and the display history
//! - [`BioreactorController`] is the handle given to the operator interface

pub mod command;
pub mod controller;
pub mod data_log;
pub mod poll_loop;
pub mod shared_state;
pub mod subsystem;
pub mod telemetry;
pub mod validator;

pub use command::{encode, SetpointCommand};
pub use controller::{BioreactorController, ControllerError};
pub use data_log::{LogRecord, PersistenceError, TelemetryLogger, LOG_HEADER};
pub use poll_loop::{LinkCommand, PollLoop, PollOutcome, PollSettings};
pub use shared_state::{
    BioreactorState, LinkStatus, PollStatistics, SharedBioreactorState, SubsystemState,
};
pub use subsystem::{SetpointValue, Subsystem};
pub use telemetry::{DecodeError, DecodeOutcome, TelemetryDecoder, TelemetryFrame};
pub use validator::{AcceptedSetpoint, SetpointValidator, ValidationError};
