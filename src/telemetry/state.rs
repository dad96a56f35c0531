// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Shared telemetry state
//!
//! This module provides thread-safe shared state for the polling engine:
//! per-device register windows, cached readings, failure streaks and cycle
//! counters, all keyed by device id so contention only ever happens within a
//! single device's entries.
//!
//! Every mutating method takes the epoch the caller captured when its device
//! was activated. Stopping or restarting a device bumps the epoch under the
//! write lock, so a straggler task completing after a stop can never mutate
//! state: its epoch no longer matches.

use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::classifier::{ErrorStreaks, ZoneErrors};
use super::device::Zone;
use super::exporter::{animation_phase, TelemetrySnapshot, ZoneStatus};
use super::fetcher::{FetchOutcome, Reading};
use super::reconciler::RegisterWindow;

/// Live polling state of one device, created on start and removed on stop.
#[derive(Debug, Clone)]
pub struct DeviceTelemetry {
    /// Device identifier.
    pub id: String,
    /// Configured polling interval.
    pub interval: Duration,
    /// Completed read cycles since activation. Starts at 1, accounting for
    /// the immediate initial fetch.
    pub cycle_count: u64,
    /// When the device was activated, for the animation phase.
    activated_at: Instant,
    /// Accumulated register window across all registrars of the device.
    pub window: RegisterWindow,
    /// Most recent reading observed per zone, failed reads included.
    pub last_readings: HashMap<Zone, Reading>,
    /// Per-zone failure streaks.
    pub errors: ZoneErrors,
}

/// Shared polling state across all devices.
#[derive(Debug, Default)]
pub struct TelemetryState {
    /// Map of device id to its live polling state.
    devices: HashMap<String, DeviceTelemetry>,
    /// Monotonically increasing per-device epochs; never removed, so a
    /// straggler from any earlier activation is always fenced out.
    epochs: HashMap<String, u64>,
}

impl TelemetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current epoch of a device id, zero if never activated.
    pub fn epoch(&self, device_id: &str) -> u64 {
        self.epochs.get(device_id).copied().unwrap_or(0)
    }

    /// Activate a device: bump its epoch and create a fresh entry.
    ///
    /// The cycle counter starts at 1 to account for the initial fetch issued
    /// at activation time. Returns the new epoch, which every task spawned
    /// for this activation must present when mutating state.
    pub fn activate_device(&mut self, device_id: &str, interval: Duration) -> u64 {
        let epoch = self.epochs.entry(device_id.to_string()).or_insert(0);
        *epoch += 1;

        self.devices.insert(
            device_id.to_string(),
            DeviceTelemetry {
                id: device_id.to_string(),
                interval,
                cycle_count: 1,
                activated_at: Instant::now(),
                window: RegisterWindow::new(),
                last_readings: HashMap::new(),
                errors: ZoneErrors::new(),
            },
        );

        *epoch
    }

    /// Deactivate a device: bump its epoch and remove its entry entirely
    /// (window, cached readings, streaks and cycle counter included).
    ///
    /// Returns false if the device was not running.
    pub fn deactivate_device(&mut self, device_id: &str) -> bool {
        if let Some(epoch) = self.epochs.get_mut(device_id) {
            *epoch += 1;
        }
        self.devices.remove(device_id).is_some()
    }

    pub fn is_running(&self, device_id: &str) -> bool {
        self.devices.contains_key(device_id)
    }

    /// Device ids currently running.
    pub fn running_device_ids(&self) -> Vec<String> {
        self.devices.keys().cloned().collect()
    }

    /// Advance a device's cycle counter by one. Called by the dedicated
    /// counter task only, never by fetch tasks, so a cycle is counted exactly
    /// once regardless of registrar fan-out.
    ///
    /// Returns false when the epoch no longer matches, signalling the caller
    /// to terminate.
    pub fn advance_cycle(&mut self, device_id: &str, epoch: u64) -> bool {
        if self.epoch(device_id) != epoch {
            return false;
        }
        match self.devices.get_mut(device_id) {
            Some(device) => {
                device.cycle_count += 1;
                true
            }
            None => false,
        }
    }

    /// Apply one classified fetch outcome to the zones it covers.
    ///
    /// Returns the merged reading when the outcome was a success with values,
    /// so the caller can forward it to the history collaborator. Returns
    /// `None` (and mutates nothing) when the epoch no longer matches.
    pub fn apply_outcome(
        &mut self,
        device_id: &str,
        epoch: u64,
        zones: &[Zone],
        outcome: &FetchOutcome,
    ) -> Option<Reading> {
        if self.epoch(device_id) != epoch {
            return None;
        }
        let device = self.devices.get_mut(device_id)?;

        match outcome {
            FetchOutcome::TransportFailure(reason) => {
                debug!(
                    "Transport failure for device '{}' zones {:?}: {}",
                    device_id, zones, reason
                );
                device.errors.record_transport_failure(zones);
                None
            }
            // "No data yet" is not an error: the call completed
            FetchOutcome::Success(None) => {
                device.errors.record_transport_success(zones);
                None
            }
            FetchOutcome::DeviceReadFailure(reading) => {
                device.errors.record_transport_success(zones);
                device.errors.record_read_failure(zones);
                for zone in zones {
                    device.last_readings.insert(*zone, reading.clone());
                }
                None
            }
            FetchOutcome::Success(Some(reading)) => {
                device.errors.record_transport_success(zones);
                device.errors.record_read_success(zones);
                for zone in zones {
                    device.last_readings.insert(*zone, reading.clone());
                }
                if reading.values.is_empty() {
                    return None;
                }
                device.window.merge(reading);
                Some(reading.clone())
            }
        }
    }

    /// Completed read cycles of a device, zero when stopped.
    pub fn cycle_count(&self, device_id: &str) -> u64 {
        self.devices
            .get(device_id)
            .map(|d| d.cycle_count)
            .unwrap_or(0)
    }

    /// Failure streaks of one zone, zero when the device is stopped.
    pub fn zone_streaks(&self, device_id: &str, zone: Zone) -> ErrorStreaks {
        self.devices
            .get(device_id)
            .map(|d| d.errors.streaks(zone))
            .unwrap_or_default()
    }

    pub fn is_flagged(&self, device_id: &str, zone: Zone) -> bool {
        self.zone_streaks(device_id, zone).is_flagged()
    }

    pub fn is_critical(&self, device_id: &str, zone: Zone) -> bool {
        self.zone_streaks(device_id, zone).is_critical()
    }

    /// Last-known value at a register address of a device.
    pub fn register_value(&self, device_id: &str, address: u16) -> Option<u16> {
        self.devices.get(device_id)?.window.get(address)
    }

    /// True while any zone of any device has a nonzero transport streak.
    pub fn connectivity_problem(&self) -> bool {
        self.devices.values().any(|d| d.errors.has_transport_failure())
    }

    /// Read-only projection of one device for the UI, `None` when stopped.
    pub fn snapshot(&self, device_id: &str) -> Option<TelemetrySnapshot> {
        let device = self.devices.get(device_id)?;
        let zones = Zone::ALL
            .iter()
            .map(|zone| {
                let streaks = device.errors.streaks(*zone);
                (
                    *zone,
                    ZoneStatus {
                        flagged: streaks.is_flagged(),
                        critical: streaks.is_critical(),
                    },
                )
            })
            .collect();

        Some(TelemetrySnapshot {
            device_id: device.id.clone(),
            is_running: true,
            cycle_count: device.cycle_count,
            animation_phase_ms: animation_phase(device.activated_at.elapsed(), device.interval),
            zones,
            register_count: device.window.len(),
        })
    }
}

/// Type alias for the shared telemetry state wrapped in `Arc<RwLock<>>`
pub type SharedTelemetryState = Arc<RwLock<TelemetryState>>;

/// Create a new shared telemetry state instance
pub fn create_shared_telemetry_state() -> SharedTelemetryState {
    Arc::new(RwLock::new(TelemetryState::new()))
}
