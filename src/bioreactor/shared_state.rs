// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared state of the bioreactor controller
//!
//! Written by the poll loop (current values, log history, counters), the
//! display clock (elapsed time) and the controller (setpoints); read by
//! whatever presents the data.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::data_log::LogRecord;
use super::subsystem::{SetpointValue, Subsystem};
use super::telemetry::TelemetryFrame;
use crate::config::{SubsystemLimits, SubsystemsConfig};

/// Shared handle on the controller state
pub type SharedBioreactorState = Arc<RwLock<BioreactorState>>;

/// Live state of one subsystem
#[derive(Debug, Clone, Serialize)]
pub struct SubsystemState {
    /// Last reading, smoothed for stirring; `None` until the first frame
    pub current_value: Option<String>,
    /// Last setpoint accepted and written to the device
    pub setpoint: SetpointValue,
    /// Accepted setpoint range
    pub limits: SubsystemLimits,
}

impl SubsystemState {
    fn new(subsystem: Subsystem, limits: SubsystemLimits) -> Self {
        Self {
            current_value: None,
            setpoint: SetpointValue::for_subsystem(subsystem, limits.default_setpoint),
            limits,
        }
    }
}

/// State of the serial link as seen by the poll loop
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LinkStatus {
    /// No exchange yet
    Unknown,
    /// Last exchange succeeded
    Connected,
    /// Last exchange failed
    Error { message: String },
}

/// Counters of the poll loop
#[derive(Debug, Clone, Default, Serialize)]
pub struct PollStatistics {
    /// Telemetry reads attempted
    pub polls: u64,
    /// Frames decoded and logged
    pub frames: u64,
    /// Non-telemetry lines discarded
    pub ignored_lines: u64,
    pub decode_errors: u64,
    pub transport_errors: u64,
    pub persistence_errors: u64,
    /// Setpoint commands written to the link
    pub commands_sent: u64,
}

/// Snapshot-able controller state
#[derive(Debug, Clone, Serialize)]
pub struct BioreactorState {
    pub heating: SubsystemState,
    pub stirring: SubsystemState,
    pub ph: SubsystemState,
    /// Elapsed run time, `H:MM:SS`
    pub elapsed: String,
    pub link_status: LinkStatus,
    pub statistics: PollStatistics,
    /// Most recent records, newest first
    pub recent_records: VecDeque<LogRecord>,
}

impl BioreactorState {
    /// Startup state: default setpoints, no readings
    pub fn new(limits: &SubsystemsConfig) -> Self {
        Self {
            heating: SubsystemState::new(Subsystem::Heating, limits.heating),
            stirring: SubsystemState::new(Subsystem::Stirring, limits.stirring),
            ph: SubsystemState::new(Subsystem::Ph, limits.ph),
            elapsed: "0:00:00".to_string(),
            link_status: LinkStatus::Unknown,
            statistics: PollStatistics::default(),
            recent_records: VecDeque::new(),
        }
    }

    /// Create a shared handle
    pub fn shared(limits: &SubsystemsConfig) -> SharedBioreactorState {
        Arc::new(RwLock::new(Self::new(limits)))
    }

    pub fn subsystem(&self, subsystem: Subsystem) -> &SubsystemState {
        match subsystem {
            Subsystem::Heating => &self.heating,
            Subsystem::Stirring => &self.stirring,
            Subsystem::Ph => &self.ph,
        }
    }

    fn subsystem_mut(&mut self, subsystem: Subsystem) -> &mut SubsystemState {
        match subsystem {
            Subsystem::Heating => &mut self.heating,
            Subsystem::Stirring => &mut self.stirring,
            Subsystem::Ph => &mut self.ph,
        }
    }

    /// Record a setpoint that was written to the device
    pub fn set_setpoint(&mut self, subsystem: Subsystem, value: SetpointValue) {
        self.subsystem_mut(subsystem).setpoint = value;
        self.statistics.commands_sent += 1;
    }

    /// Publish a decoded frame with its smoothed stirring value
    pub fn apply_frame(&mut self, frame: &TelemetryFrame, stirring_smoothed: i64) {
        self.heating.current_value = Some(frame.heating.clone());
        self.stirring.current_value = Some(stirring_smoothed.to_string());
        self.ph.current_value = Some(frame.ph.clone());
        self.statistics.frames += 1;
        self.link_status = LinkStatus::Connected;
    }

    /// Add a record in front of the recent ones, keeping at most `capacity`
    pub fn push_record(&mut self, record: LogRecord, capacity: usize) {
        self.recent_records.push_front(record);
        self.recent_records.truncate(capacity.max(1));
    }

    /// Most recent record, if any
    pub fn latest_record(&self) -> Option<&LogRecord> {
        self.recent_records.front()
    }
}
