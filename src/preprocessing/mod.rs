// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Telemetry preprocessing module
//!
//! This module handles smoothing of the noisy telemetry channels before they
//! reach the display and the data log.

pub mod filters;
#[cfg(test)]
mod filters_test;

pub use filters::{MovingAverageFilter, SmoothingFilter};

/// Create the trailing moving average applied to the stirring channel
pub fn create_moving_average(window_size: usize) -> Box<dyn SmoothingFilter> {
    Box::new(MovingAverageFilter::new(window_size))
}
