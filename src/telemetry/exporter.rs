// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Read-only projection for the UI
//!
//! The view layer drives its progress animations from these values without
//! knowing about intervals or tasks. The animation phase is a derived getter
//! computed on demand from wall-clock deltas; it is a display concern, never
//! stored.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

use super::device::Zone;

/// Phase offset in milliseconds used to align a progress indicator with the
/// current cycle.
///
/// Computed as `-(elapsed mod interval)`, always `<= 0`. Float precision,
/// not correctness-critical.
pub fn animation_phase(elapsed: Duration, interval: Duration) -> f64 {
    let interval_ms = interval.as_secs_f64() * 1000.0;
    if interval_ms <= 0.0 {
        return 0.0;
    }
    let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
    -(elapsed_ms % interval_ms)
}

/// Escalation state of one zone, derived from its read streak.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ZoneStatus {
    pub flagged: bool,
    pub critical: bool,
}

/// Point-in-time projection of one device's polling state.
#[derive(Debug, Clone, Serialize)]
pub struct TelemetrySnapshot {
    pub device_id: String,
    /// Always true for devices present in the state; stopped devices have no
    /// snapshot at all.
    pub is_running: bool,
    /// Completed read cycles since the device was turned on.
    pub cycle_count: u64,
    /// See [`animation_phase`].
    pub animation_phase_ms: f64,
    pub zones: HashMap<Zone, ZoneStatus>,
    /// Number of known register addresses in the device's window.
    pub register_count: usize,
}
