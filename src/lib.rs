// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-bioreactor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust Bioreactor library
//!
//! Host side controller for a bioreactor driven over a serial link: setpoint
//! validation and encoding, telemetry decoding, smoothing and logging.

pub mod bioreactor;
pub mod config;
pub mod console;
pub mod daemon;
pub mod preprocessing;
pub mod serial;
pub mod utility;
