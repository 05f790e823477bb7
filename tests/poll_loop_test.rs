// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use async_trait::async_trait;
use rust_bioreactor::bioreactor::{
    BioreactorState, PollLoop, PollOutcome, SetpointValue, TelemetryLogger, LOG_HEADER,
};
use rust_bioreactor::config::SubsystemsConfig;
use rust_bioreactor::preprocessing::create_moving_average;
use rust_bioreactor::serial::{SerialLink, TransportError};
use rust_bioreactor::utility::RunClock;
use std::collections::VecDeque;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

/// Link replaying a fixed list of lines
struct ReplayLink {
    lines: VecDeque<Vec<u8>>,
}

impl ReplayLink {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| format!("{}\r\n", l).into_bytes()).collect(),
        }
    }
}

#[async_trait]
impl SerialLink for ReplayLink {
    async fn read_line(&mut self) -> Result<Vec<u8>, TransportError> {
        self.lines.pop_front().ok_or(TransportError::Closed)
    }

    async fn write_bytes(&mut self, _bytes: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn description(&self) -> String {
        "replay".to_string()
    }
}

fn poll_loop(logger: TelemetryLogger) -> PollLoop {
    PollLoop::new(
        create_moving_average(15),
        logger,
        BioreactorState::shared(&SubsystemsConfig::default()),
        RunClock::start(),
    )
}

#[tokio::test]
async fn test_first_frame_is_written_to_the_log_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data_log.txt");
    let mut poll = poll_loop(TelemetryLogger::open(&path, 100).unwrap());
    let mut link = ReplayLink::new(&["HR29.8;SR690;PR5.0"]);

    let outcome = poll.poll_at(&mut link, Duration::from_secs(1)).await;
    assert!(matches!(outcome, PollOutcome::Logged(_)));

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(contents, format!("{}\n29.8,690,5.0,0:00:01\n", LOG_HEADER));
}

#[tokio::test]
async fn test_malformed_line_changes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data_log.txt");
    let state = BioreactorState::shared(&SubsystemsConfig::default());
    let mut poll = PollLoop::new(
        create_moving_average(15),
        TelemetryLogger::open(&path, 100).unwrap(),
        state.clone(),
        RunClock::start(),
    );
    let mut link = ReplayLink::new(&["HR29.8;SR690;PR5.0", "HR29.9;SR;PR5.0", "HR30.0"]);

    poll.poll_at(&mut link, Duration::from_secs(1)).await;
    let before = state.read().await.clone();
    let log_before = fs::read_to_string(&path).unwrap();

    for second in 2..=3 {
        let outcome = poll.poll_at(&mut link, Duration::from_secs(second)).await;
        assert!(matches!(outcome, PollOutcome::DecodeFailed(_)));
    }

    let after = state.read().await;
    assert_eq!(after.heating.current_value, before.heating.current_value);
    assert_eq!(after.stirring.current_value, before.stirring.current_value);
    assert_eq!(after.ph.current_value, before.ph.current_value);
    assert_eq!(after.recent_records, before.recent_records);
    assert_eq!(after.heating.setpoint, SetpointValue::Decimal(25.0));
    assert_eq!(after.statistics.decode_errors, 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), log_before);
}

#[tokio::test]
async fn test_stirring_is_smoothed_once_the_window_is_full() {
    let mut poll = poll_loop(TelemetryLogger::display_only(100));
    let lines: Vec<String> = (1..=30)
        .map(|rpm| format!("HR30.0;SR{};PR5.0", rpm))
        .collect();
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    let mut link = ReplayLink::new(&refs);

    let mut logged = Vec::new();
    for second in 1..=30 {
        if let PollOutcome::Logged(record) =
            poll.poll_at(&mut link, Duration::from_secs(second)).await
        {
            logged.push(record.stirring_smoothed);
        }
    }

    assert_eq!(logged.len(), 30);
    // Raw readings until 15 samples are available
    assert_eq!(&logged[..14], &(1..=14).collect::<Vec<i64>>()[..]);
    // Then the truncated mean of the last 15 readings
    assert_eq!(logged[14], 8);
    assert_eq!(logged[15], 9);
    assert_eq!(logged[29], 23);

    let newest = poll.logger().history().next().unwrap();
    assert_eq!(newest.elapsed, "0:00:30");
}

#[tokio::test]
async fn test_banner_is_not_logged() {
    let mut poll = poll_loop(TelemetryLogger::display_only(10));
    let mut link = ReplayLink::new(&["Bioreactor firmware ready", "HR25.1;SR750;PR5.0"]);

    assert!(matches!(
        poll.poll_at(&mut link, Duration::from_secs(1)).await,
        PollOutcome::Ignored(_)
    ));
    assert!(matches!(
        poll.poll_at(&mut link, Duration::from_secs(2)).await,
        PollOutcome::Logged(_)
    ));
    assert_eq!(poll.logger().history().count(), 1);
}
