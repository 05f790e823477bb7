// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Smoothing filters for integer telemetry channels

use std::collections::VecDeque;

/// Trait for implementing streaming smoothing filters
pub trait SmoothingFilter: Send + Sync {
    /// Feed one raw sample and return the value to report for this cycle
    fn push(&mut self, sample: i64) -> i64;

    /// Number of samples fed since creation
    fn sample_count(&self) -> u64;
}

/// Trailing moving average over a fixed number of samples.
///
/// Until the window is full the raw sample is reported unchanged. Afterwards
/// the report is the sum of the last `window_size` samples divided by
/// `window_size`, truncated toward zero.
///
/// Memory is bounded by the window: the last samples are kept in a ring
/// buffer next to their running sum, so each push is O(1).
#[derive(Debug, Clone)]
pub struct MovingAverageFilter {
    window: VecDeque<i64>,
    window_size: usize,
    /// Wide enough for a full window of extreme `i64` samples
    sum: i128,
    sample_count: u64,
}

impl MovingAverageFilter {
    /// Create a moving average over `window_size` samples (at least one)
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            sum: 0,
            sample_count: 0,
        }
    }

    /// Configured window length
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Whether enough samples were seen for the output to be averaged
    pub fn is_full(&self) -> bool {
        self.window.len() == self.window_size
    }
}

impl SmoothingFilter for MovingAverageFilter {
    fn push(&mut self, sample: i64) -> i64 {
        self.sample_count += 1;
        if self.window.len() == self.window_size {
            if let Some(evicted) = self.window.pop_front() {
                self.sum -= i128::from(evicted);
            }
        }
        self.window.push_back(sample);
        self.sum += i128::from(sample);

        if self.is_full() {
            // The mean of i64 samples always fits back in an i64
            (self.sum / self.window_size as i128) as i64
        } else {
            sample
        }
    }

    fn sample_count(&self) -> u64 {
        self.sample_count
    }
}
