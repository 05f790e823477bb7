// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::Result;
use log::{debug, error, info};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::bioreactor::{
    BioreactorController, BioreactorState, LinkCommand, PollLoop, PollSettings,
    SetpointValidator, SharedBioreactorState, TelemetryLogger,
};
use crate::config::Config;
use crate::preprocessing::create_moving_average;
use crate::serial::{create_serial_link, SerialLink};
use crate::utility::{format_elapsed, RunClock};

const HEARTBEAT_PERIOD: Duration = Duration::from_secs(60);

/// Background tasks of a running controller
pub struct Daemon {
    tasks: Vec<JoinHandle<Result<()>>>,
    running: Arc<AtomicBool>,
    stop_signal: watch::Sender<bool>,
    commands: Option<mpsc::UnboundedSender<LinkCommand>>,
}

impl Default for Daemon {
    fn default() -> Self {
        Self::new()
    }
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Self {
        let (stop_signal, _) = watch::channel(false);
        Daemon {
            tasks: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            stop_signal,
            commands: None,
        }
    }

    /// Launch all configured tasks on the serial link selected by `config`
    pub fn launch(&mut self, config: &Config) -> Result<BioreactorController> {
        let link = create_serial_link(&config.serial, &config.subsystems);
        self.launch_with_link(config, link)
    }

    /// Launch all configured tasks on an already built link
    pub fn launch_with_link(
        &mut self,
        config: &Config,
        link: Box<dyn SerialLink>,
    ) -> Result<BioreactorController> {
        config.validate()?;

        let clock = RunClock::start();
        let state = BioreactorState::shared(&config.subsystems);
        info!(
            "Bioreactor controller started at {}",
            clock.started_at().format("%Y-%m-%d %H:%M:%S")
        );

        let logger = match TelemetryLogger::create(&config.data_log, clock.started_at()) {
            Ok(logger) => logger,
            Err(e) => {
                error!("{}; telemetry will only be kept in memory", e);
                TelemetryLogger::display_only(config.data_log.display_capacity)
            }
        };

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let poll_loop = PollLoop::new(
            create_moving_average(config.acquisition.smoothing_window),
            logger,
            state.clone(),
            clock,
        );
        self.start_poll_loop(poll_loop, link, commands_rx, PollSettings::from_config(config));
        self.start_display_clock(
            state.clone(),
            clock,
            Duration::from_millis(config.acquisition.display_refresh_ms.max(1)),
        );
        self.start_heartbeat(state.clone());

        self.commands = Some(commands.clone());
        Ok(BioreactorController::new(
            SetpointValidator::new(config.subsystems.clone()),
            commands,
            state,
        ))
    }

    /// Start the task owning the serial link
    fn start_poll_loop(
        &mut self,
        poll_loop: PollLoop,
        link: Box<dyn SerialLink>,
        commands: mpsc::UnboundedReceiver<LinkCommand>,
        settings: PollSettings,
    ) {
        let running = self.running.clone();
        let task = tokio::spawn(poll_loop.run(link, commands, running, settings));
        self.tasks.push(task);
    }

    /// Start the task refreshing the elapsed time shown to the operator
    fn start_display_clock(
        &mut self,
        state: SharedBioreactorState,
        clock: RunClock,
        refresh: Duration,
    ) {
        debug!("Starting display clock (refresh every {:?})", refresh);

        let running = self.running.clone();
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(refresh);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                let elapsed = format_elapsed(clock.elapsed());
                let mut state = state.write().await;
                if state.elapsed != elapsed {
                    state.elapsed = elapsed;
                }
            }
            Ok(())
        });

        self.tasks.push(task);
    }

    /// Start a heartbeat task that logs the poll statistics periodically
    fn start_heartbeat(&mut self, state: SharedBioreactorState) {
        debug!("Starting heartbeat monitor");

        let running = self.running.clone();
        let mut stop = self.stop_signal.subscribe();
        let task = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                tokio::select! {
                    _ = time::sleep(HEARTBEAT_PERIOD) => {}
                    _ = stop.changed() => break,
                }
                let state = state.read().await;
                let stats = &state.statistics;
                debug!(
                    "Daemon heartbeat: {} elapsed, {} frames, {} ignored, {} decode errors, {} transport errors, {} commands",
                    state.elapsed,
                    stats.frames,
                    stats.ignored_lines,
                    stats.decode_errors,
                    stats.transport_errors,
                    stats.commands_sent
                );
            }
            Ok(())
        });

        self.tasks.push(task);
    }

    /// Stop all running tasks
    pub fn shutdown(&self) {
        info!("Shutting down daemon tasks");
        self.running.store(false, Ordering::SeqCst);
        self.stop_signal.send_replace(true);
        if let Some(commands) = &self.commands {
            // The poll loop may already have exited
            let _ = commands.send(LinkCommand::Stop);
        }
    }

    /// Wait for all tasks to complete
    pub async fn join(self) -> Result<()> {
        for task in self.tasks {
            match task.await {
                Ok(Err(e)) => error!("Task failed: {:#}", e),
                Err(e) => error!("Task panicked: {}", e),
                Ok(Ok(())) => {}
            }
        }
        Ok(())
    }
}
