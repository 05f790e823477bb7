// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry poll loop
//!
//! The poll loop is the only owner of the serial link. Once per poll period
//! it reads one line, decodes it, smooths the stirring reading, logs the
//! record and publishes the new values to the shared state. Between polls it
//! serves setpoint writes received over a [`LinkCommand`] channel, so reads
//! and writes never interleave on the wire.
//!
//! No failure stops the loop: transport, decode and persistence errors are
//! logged, counted, and the next period starts as usual.

use anyhow::Result;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::command::SetpointCommand;
use super::data_log::{LogRecord, TelemetryLogger};
use super::shared_state::{LinkStatus, SharedBioreactorState};
use super::telemetry::{DecodeError, DecodeOutcome, TelemetryDecoder};
use crate::config::Config;
use crate::preprocessing::SmoothingFilter;
use crate::serial::{SerialLink, TransportError};
use crate::utility::{format_elapsed, RunClock};

/// Request sent to the task owning the serial link
#[derive(Debug)]
pub enum LinkCommand {
    /// Write a setpoint and report whether it reached the link
    Write {
        command: SetpointCommand,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
    /// Leave the poll loop
    Stop,
}

/// Result of one poll cycle
#[derive(Debug)]
pub enum PollOutcome {
    /// A frame was decoded and logged
    Logged(LogRecord),
    /// The line was not telemetry
    Ignored(String),
    DecodeFailed(DecodeError),
    TransportFailed(TransportError),
}

/// Timing and retry settings of [`PollLoop::run`]
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_interval: Duration,
    /// When false, the link only serves setpoint writes
    pub acquisition_enabled: bool,
    /// Extra attempts for a failed setpoint write
    pub write_retries: u32,
}

impl PollSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.acquisition.poll_interval_secs.max(1)),
            acquisition_enabled: config.acquisition.enabled,
            write_retries: config.serial.write_retries,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            acquisition_enabled: true,
            write_retries: 0,
        }
    }
}

pub struct PollLoop {
    filter: Box<dyn SmoothingFilter>,
    logger: TelemetryLogger,
    state: SharedBioreactorState,
    clock: RunClock,
}

impl PollLoop {
    pub fn new(
        filter: Box<dyn SmoothingFilter>,
        logger: TelemetryLogger,
        state: SharedBioreactorState,
        clock: RunClock,
    ) -> Self {
        Self {
            filter,
            logger,
            state,
            clock,
        }
    }

    pub fn logger(&self) -> &TelemetryLogger {
        &self.logger
    }

    /// Run one poll cycle, timestamping the frame with the run clock
    pub async fn poll_once(&mut self, link: &mut dyn SerialLink) -> PollOutcome {
        let read = link.read_line().await;
        let elapsed = self.clock.elapsed();
        self.complete_poll(read, elapsed).await
    }

    /// Run one poll cycle with an explicit timestamp
    pub async fn poll_at(&mut self, link: &mut dyn SerialLink, elapsed: Duration) -> PollOutcome {
        let read = link.read_line().await;
        self.complete_poll(read, elapsed).await
    }

    async fn complete_poll(
        &mut self,
        read: Result<Vec<u8>, TransportError>,
        elapsed: Duration,
    ) -> PollOutcome {
        match read {
            Ok(raw) => {
                {
                    let mut state = self.state.write().await;
                    state.statistics.polls += 1;
                    state.link_status = LinkStatus::Connected;
                }
                self.handle_line(&raw, elapsed).await
            }
            Err(e) => {
                match &e {
                    TransportError::Timeout(_) => warn!("Telemetry poll skipped: {}", e),
                    _ => error!("Telemetry poll failed: {}", e),
                }
                let mut state = self.state.write().await;
                state.statistics.polls += 1;
                state.statistics.transport_errors += 1;
                state.link_status = LinkStatus::Error {
                    message: e.to_string(),
                };
                PollOutcome::TransportFailed(e)
            }
        }
    }

    /// Decode, smooth, log and publish one raw line.
    ///
    /// A line that fails to decode leaves the filter, the log and the
    /// published values untouched.
    pub async fn handle_line(&mut self, raw: &[u8], elapsed: Duration) -> PollOutcome {
        let frame = match TelemetryDecoder::decode(raw, elapsed) {
            Ok(DecodeOutcome::Frame(frame)) => frame,
            Ok(DecodeOutcome::Ignored(line)) => {
                debug!("Ignoring non-telemetry line: {}", line);
                self.state.write().await.statistics.ignored_lines += 1;
                return PollOutcome::Ignored(line);
            }
            Err(e) => {
                warn!("{}", e);
                self.state.write().await.statistics.decode_errors += 1;
                return PollOutcome::DecodeFailed(e);
            }
        };

        let smoothed = self.filter.push(frame.stirring);
        let record = LogRecord {
            heating: frame.heating.clone(),
            stirring_smoothed: smoothed,
            ph: frame.ph.clone(),
            elapsed: format_elapsed(frame.received_at),
        };
        debug!("{}", record.to_display_line());

        let persisted = self.logger.append(record.clone());
        if let Err(e) = &persisted {
            error!("{}", e);
        }

        let mut state = self.state.write().await;
        state.apply_frame(&frame, smoothed);
        state.push_record(record.clone(), self.logger.history_capacity());
        if persisted.is_err() {
            state.statistics.persistence_errors += 1;
        }

        PollOutcome::Logged(record)
    }

    /// Write a setpoint command, retrying up to `retries` extra times.
    ///
    /// The published setpoint changes only once the write succeeded.
    pub async fn write_setpoint(
        &mut self,
        link: &mut dyn SerialLink,
        command: &SetpointCommand,
        retries: u32,
    ) -> Result<(), TransportError> {
        let bytes = command.to_bytes();
        let mut attempt = 0;
        loop {
            match link.write_bytes(&bytes).await {
                Ok(()) => {
                    info!("Sent {} setpoint: {}", command.subsystem, command);
                    let mut state = self.state.write().await;
                    state.set_setpoint(command.subsystem, command.value);
                    state.link_status = LinkStatus::Connected;
                    return Ok(());
                }
                Err(e) if attempt < retries => {
                    attempt += 1;
                    warn!(
                        "Writing {} failed ({}), retry {}/{}",
                        command, e, attempt, retries
                    );
                }
                Err(e) => {
                    error!("Writing {} failed: {}", command, e);
                    let mut state = self.state.write().await;
                    state.statistics.transport_errors += 1;
                    state.link_status = LinkStatus::Error {
                        message: e.to_string(),
                    };
                    return Err(e);
                }
            }
        }
    }

    /// Serve the link until stopped.
    ///
    /// The first poll happens one period after the run clock started, later
    /// ones every period; a late cycle delays the following ones instead of
    /// bursting.
    pub async fn run(
        mut self,
        mut link: Box<dyn SerialLink>,
        mut commands: mpsc::UnboundedReceiver<LinkCommand>,
        running: Arc<AtomicBool>,
        settings: PollSettings,
    ) -> Result<()> {
        info!(
            "Starting poll loop on {} (every {:?}, acquisition {})",
            link.description(),
            settings.poll_interval,
            if settings.acquisition_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );

        let mut ticker = time::interval_at(
            Instant::from_std(self.clock.start_instant()) + settings.poll_interval,
            settings.poll_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while running.load(Ordering::SeqCst) {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(LinkCommand::Write { command, reply }) => {
                        let result = self
                            .write_setpoint(link.as_mut(), &command, settings.write_retries)
                            .await;
                        if reply.send(result).is_err() {
                            debug!("Setpoint requester left before the write completed");
                        }
                    }
                    Some(LinkCommand::Stop) | None => {
                        info!("Poll loop received stop request");
                        break;
                    }
                },
                _ = ticker.tick(), if settings.acquisition_enabled => {
                    self.poll_once(link.as_mut()).await;
                }
            }
        }

        info!("Poll loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bioreactor::{BioreactorState, SetpointValue, Subsystem};
    use crate::config::SubsystemsConfig;
    use crate::preprocessing::create_moving_average;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Link replaying scripted reads and recording writes
    #[derive(Default)]
    struct ScriptedLink {
        reads: VecDeque<Result<Vec<u8>, TransportError>>,
        writes: Vec<Vec<u8>>,
        failing_writes: u32,
    }

    #[async_trait]
    impl SerialLink for ScriptedLink {
        async fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
            self.reads
                .pop_front()
                .unwrap_or(Err(TransportError::Timeout(Duration::from_secs(2))))
        }

        async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
            if self.failing_writes > 0 {
                self.failing_writes -= 1;
                return Err(TransportError::Closed);
            }
            self.writes.push(bytes.to_vec());
            Ok(())
        }

        fn description(&self) -> String {
            "scripted".to_string()
        }
    }

    fn poll_loop() -> PollLoop {
        PollLoop::new(
            create_moving_average(15),
            TelemetryLogger::display_only(10),
            BioreactorState::shared(&SubsystemsConfig::default()),
            RunClock::start(),
        )
    }

    #[tokio::test]
    async fn test_frame_is_logged_and_published() {
        let mut poll = poll_loop();
        let mut link = ScriptedLink::default();
        link.reads.push_back(Ok(b"HR29.8;SR690;PR5.0\r\n".to_vec()));

        let outcome = poll.poll_at(&mut link, Duration::from_secs(1)).await;
        let record = match outcome {
            PollOutcome::Logged(record) => record,
            other => panic!("expected a logged record, got {:?}", other),
        };
        assert_eq!(record.to_file_line(), "29.8,690,5.0,0:00:01");

        let state = poll.state.read().await;
        assert_eq!(state.heating.current_value.as_deref(), Some("29.8"));
        assert_eq!(state.stirring.current_value.as_deref(), Some("690"));
        assert_eq!(state.statistics.polls, 1);
        assert_eq!(state.latest_record(), Some(&record));
    }

    #[tokio::test]
    async fn test_bad_lines_do_not_touch_published_values() {
        let mut poll = poll_loop();
        let mut link = ScriptedLink::default();
        link.reads.push_back(Ok(b"HR29.8;SR690;PR5.0\n".to_vec()));
        link.reads.push_back(Ok(b"HR30.1;SRxx;PR5.2\n".to_vec()));
        link.reads.push_back(Ok(b"debug: heater on\n".to_vec()));

        poll.poll_at(&mut link, Duration::from_secs(1)).await;
        assert!(matches!(
            poll.poll_at(&mut link, Duration::from_secs(2)).await,
            PollOutcome::DecodeFailed(_)
        ));
        assert!(matches!(
            poll.poll_at(&mut link, Duration::from_secs(3)).await,
            PollOutcome::Ignored(_)
        ));
        assert!(matches!(
            poll.poll_at(&mut link, Duration::from_secs(4)).await,
            PollOutcome::TransportFailed(TransportError::Timeout(_))
        ));

        let state = poll.state.read().await;
        assert_eq!(state.heating.current_value.as_deref(), Some("29.8"));
        assert_eq!(state.recent_records.len(), 1);
        assert_eq!(state.statistics.decode_errors, 1);
        assert_eq!(state.statistics.ignored_lines, 1);
        assert_eq!(state.statistics.transport_errors, 1);
        assert!(matches!(state.link_status, LinkStatus::Error { .. }));
        assert_eq!(poll.logger().history().count(), 1);
    }

    #[tokio::test]
    async fn test_extreme_stirring_readings_keep_the_loop_alive() {
        let mut poll = poll_loop();
        let mut link = ScriptedLink::default();
        for _ in 0..2 {
            link.reads.push_back(Ok(b"HR30.0;SR9e18;PR5.0\n".to_vec()));
        }

        for second in 1..=2 {
            match poll.poll_at(&mut link, Duration::from_secs(second)).await {
                PollOutcome::Logged(record) => {
                    assert_eq!(record.stirring_smoothed, 9_000_000_000_000_000_000)
                }
                other => panic!("expected a logged record, got {:?}", other),
            }
        }
        assert_eq!(poll.state.read().await.statistics.frames, 2);
    }

    #[tokio::test]
    async fn test_published_history_is_bounded() {
        let mut poll = poll_loop();
        let mut link = ScriptedLink::default();
        for rpm in 1..=12 {
            link.reads
                .push_back(Ok(format!("HR30.0;SR{};PR5.0\n", rpm).into_bytes()));
        }
        for second in 1..=12 {
            poll.poll_at(&mut link, Duration::from_secs(second)).await;
        }

        let state = poll.state.read().await;
        assert_eq!(state.recent_records.len(), 10);
        assert_eq!(state.recent_records.front().map(|r| r.stirring_smoothed), Some(12));
        assert_eq!(state.recent_records.back().map(|r| r.stirring_smoothed), Some(3));
        let published: Vec<&LogRecord> = state.recent_records.iter().collect();
        let kept: Vec<&LogRecord> = poll.logger().history().collect();
        assert_eq!(published, kept);
    }

    #[tokio::test]
    async fn test_write_retries_then_publishes_setpoint() {
        let mut poll = poll_loop();
        let mut link = ScriptedLink {
            failing_writes: 1,
            ..Default::default()
        };
        let command = SetpointCommand {
            subsystem: Subsystem::Heating,
            value: SetpointValue::Decimal(30.0),
        };

        poll.write_setpoint(&mut link, &command, 1).await.unwrap();
        assert_eq!(link.writes, vec![b"HW30.0".to_vec()]);
        assert_eq!(
            poll.state.read().await.heating.setpoint,
            SetpointValue::Decimal(30.0)
        );
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_setpoint() {
        let mut poll = poll_loop();
        let mut link = ScriptedLink {
            failing_writes: 5,
            ..Default::default()
        };
        let command = SetpointCommand {
            subsystem: Subsystem::Stirring,
            value: SetpointValue::Rpm(900),
        };

        assert!(poll.write_setpoint(&mut link, &command, 2).await.is_err());
        let state = poll.state.read().await;
        assert_eq!(state.stirring.setpoint, SetpointValue::Rpm(750));
        assert_eq!(state.statistics.commands_sent, 0);
        assert_eq!(state.statistics.transport_errors, 1);
    }
}
