// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Polling engine configuration
//!
//! This module defines the structure for configuring the periodic read
//! cycles of the telemetry engine.

use serde::{Deserialize, Serialize};

/// Configuration for the polling engine.
///
/// Per-device polling intervals come from the device's own card
/// configuration; these settings cover the engine-wide knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fallback polling interval in milliseconds.
    ///
    /// Used by callers that want a sensible interval for devices without one.
    /// A device with no interval of its own is still rejected at start time.
    /// Must be at least 100.
    #[serde(default = "default_interval_ms")]
    pub default_interval_ms: u64,

    /// Number of readings requested from the backend per fetch.
    ///
    /// Only the most recent reading is merged; requesting more than one is
    /// useful when the backend batches slow registrars. Must be at least 1.
    #[serde(default = "default_readings_count")]
    pub readings_count: usize,

    /// Maximum number of entries retained by the in-memory history store.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_interval_ms() -> u64 {
    5000 // 5 seconds between read cycles
}

fn default_readings_count() -> usize {
    1
}

fn default_history_capacity() -> usize {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: default_interval_ms(),
            readings_count: default_readings_count(),
            history_capacity: default_history_capacity(),
        }
    }
}
