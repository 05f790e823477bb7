// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Controller handle used by the operator interface

use log::{info, warn};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::command::SetpointCommand;
use super::poll_loop::LinkCommand;
use super::shared_state::{BioreactorState, SharedBioreactorState};
use super::subsystem::Subsystem;
use super::validator::{SetpointValidator, ValidationError};
use crate::serial::TransportError;

/// Failure of a setpoint request
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),
    #[error("setpoint not delivered: {0}")]
    Transport(#[from] TransportError),
    #[error("serial link task is not running")]
    LinkStopped,
}

/// Cloneable handle to a running controller.
///
/// Setpoint requests are validated here and only accepted values are handed
/// to the task owning the serial link.
#[derive(Clone)]
pub struct BioreactorController {
    validator: Arc<SetpointValidator>,
    commands: mpsc::UnboundedSender<LinkCommand>,
    state: SharedBioreactorState,
}

impl BioreactorController {
    pub fn new(
        validator: SetpointValidator,
        commands: mpsc::UnboundedSender<LinkCommand>,
        state: SharedBioreactorState,
    ) -> Self {
        Self {
            validator: Arc::new(validator),
            commands,
            state,
        }
    }

    pub fn validator(&self) -> &SetpointValidator {
        &self.validator
    }

    pub fn state(&self) -> SharedBioreactorState {
        self.state.clone()
    }

    /// Validate `requested` and write it to the device.
    ///
    /// A rejected value is never transmitted and leaves the current setpoint
    /// unchanged. On success the returned command is the one written.
    pub async fn submit_setpoint(
        &self,
        subsystem: Subsystem,
        requested: &str,
    ) -> Result<SetpointCommand, ControllerError> {
        let accepted = self
            .validator
            .validate(subsystem, requested)
            .inspect_err(|e| warn!("Rejected setpoint request: {}", e))?;
        let command = SetpointCommand::from(accepted);

        let (reply, response) = oneshot::channel();
        self.commands
            .send(LinkCommand::Write { command, reply })
            .map_err(|_| ControllerError::LinkStopped)?;
        response.await.map_err(|_| ControllerError::LinkStopped)??;

        info!("{} setpoint set to {}", subsystem, command.value);
        Ok(command)
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BioreactorState {
        self.state.read().await.clone()
    }

    /// Ask the link task to stop
    pub fn stop(&self) {
        // The link task may already be gone
        let _ = self.commands.send(LinkCommand::Stop);
    }
}
