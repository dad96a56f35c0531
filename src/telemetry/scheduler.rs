// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Polling scheduler
//!
//! The scheduler owns the concurrency of the engine. For each device toggled
//! on it spawns one periodic fetch task per resolved registrar plus one
//! independent counter task whose only job is to advance the device's cycle
//! counter exactly once per interval, regardless of registrar fan-out.
//!
//! Tasks are keyed by device id in a registry supporting concurrent
//! start/stop from the UI thread. Stopping a device bumps its epoch in the
//! shared state before the tasks are aborted, so no late tick or in-flight
//! fetch can mutate state after `stop` returns.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::device::DeviceSpec;
use super::fetcher::{FetchOutcome, ReadingFetcher, ReadingsClient};
use super::history::{HistoryEntry, HistoryStore};
use super::resolver::{resolve_registrars, ResolvedRegistrar};
use super::state::SharedTelemetryState;
use crate::config::PollingConfig;

/// Configuration problem reported synchronously when starting a device.
///
/// These are not runtime faults: the device stays stopped and no retry is
/// scheduled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    /// No zone binding and no legacy registrar resolved for the card.
    #[error("device '{0}' has no registrar configured")]
    NotConfigured(String),

    /// The device has no polling interval.
    #[error("device '{0}' has no polling interval")]
    MissingInterval(String),
}

/// Owns the periodic polling tasks of all active devices.
pub struct PollingScheduler {
    state: SharedTelemetryState,
    client: Arc<dyn ReadingsClient>,
    history: Arc<dyn HistoryStore>,
    readings_count: usize,
    /// Task registry: device id to the handles of its fetch and counter tasks.
    tasks: Mutex<HashMap<String, Vec<JoinHandle<()>>>>,
}

impl PollingScheduler {
    /// Create a scheduler over the given shared state and collaborators.
    pub fn new(
        state: SharedTelemetryState,
        client: Arc<dyn ReadingsClient>,
        history: Arc<dyn HistoryStore>,
        polling: &PollingConfig,
    ) -> Self {
        Self {
            state,
            client,
            history,
            readings_count: polling.readings_count,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle to the shared state, for UI-side read projections.
    pub fn state(&self) -> SharedTelemetryState {
        self.state.clone()
    }

    /// Start polling a device.
    ///
    /// Requires a polling interval and at least one resolvable registrar,
    /// otherwise the device remains stopped and the error is returned
    /// synchronously. An initial fetch per registrar is issued immediately at
    /// activation; the cycle counter starts at 1 to account for it. Starting
    /// an already-running device fully stops it first, so timers are never
    /// duplicated.
    pub async fn start(&self, device: &DeviceSpec) -> Result<(), StartError> {
        let resolved = resolve_registrars(device);
        if resolved.is_empty() {
            warn!("Device '{}' has no registrars, not starting", device.id);
            return Err(StartError::NotConfigured(device.id.clone()));
        }

        let interval_ms = device
            .poll_interval_ms
            .ok_or_else(|| StartError::MissingInterval(device.id.clone()))?;
        let interval = Duration::from_millis(interval_ms);

        // The registry lock is held across stop, activation and handle
        // insertion; a concurrent start for the same device cannot interleave
        // and orphan the other caller's tasks
        let mut tasks = self.tasks.lock().await;

        // Re-entrant start: clear any previous activation first
        self.stop_locked(&mut tasks, &device.id).await;

        let epoch = self
            .state
            .write()
            .await
            .activate_device(&device.id, interval);

        info!(
            "Starting polling for device '{}' with {} registrar(s) at {} ms",
            device.id,
            resolved.len(),
            interval_ms
        );

        let mut handles = Vec::with_capacity(resolved.len() + 1);
        for entry in resolved {
            handles.push(self.spawn_fetch_task(&device.id, entry, interval, epoch));
        }
        handles.push(self.spawn_counter_task(&device.id, interval, epoch));

        tasks.insert(device.id.clone(), handles);
        Ok(())
    }

    /// Stop polling a device.
    ///
    /// Bumps the device's epoch and removes its state entry under the write
    /// lock before aborting the tasks; once this method returns, no further
    /// register, counter or error-streak mutation can occur for the device,
    /// even if a fetch is still in flight. Returns false if the device was
    /// not running.
    pub async fn stop(&self, device_id: &str) -> bool {
        let mut tasks = self.tasks.lock().await;
        self.stop_locked(&mut tasks, device_id).await
    }

    async fn stop_locked(
        &self,
        tasks: &mut HashMap<String, Vec<JoinHandle<()>>>,
        device_id: &str,
    ) -> bool {
        let handles = tasks.remove(device_id);

        let was_running = self.state.write().await.deactivate_device(device_id);

        if let Some(handles) = handles {
            for handle in handles {
                handle.abort();
            }
        }

        if was_running {
            info!("Stopped polling for device '{}'", device_id);
        }
        was_running
    }

    /// Toggle a device: start it when stopped, stop it when running.
    ///
    /// Returns true when the device ends up running.
    pub async fn toggle(&self, device: &DeviceSpec) -> Result<bool, StartError> {
        if self.is_running(&device.id).await {
            self.stop(&device.id).await;
            Ok(false)
        } else {
            self.start(device).await?;
            Ok(true)
        }
    }

    pub async fn is_running(&self, device_id: &str) -> bool {
        self.state.read().await.is_running(device_id)
    }

    /// Stop every running device, for subsystem teardown.
    pub async fn shutdown(&self) {
        let device_ids = self.state.read().await.running_device_ids();
        info!("Shutting down polling for {} device(s)", device_ids.len());
        for device_id in device_ids {
            self.stop(&device_id).await;
        }
    }

    /// Spawn the periodic fetch task for one resolved registrar.
    ///
    /// The first tick completes immediately, which issues the initial fetch
    /// at activation time. The fetch is awaited inline and missed ticks are
    /// skipped, so two fetches for the same (device, registrar) key never
    /// overlap and a slow backend never builds a backlog.
    fn spawn_fetch_task(
        &self,
        device_id: &str,
        registrar: ResolvedRegistrar,
        interval: Duration,
        epoch: u64,
    ) -> JoinHandle<()> {
        let device_id = device_id.to_string();
        let state = self.state.clone();
        let history = self.history.clone();
        let fetcher = ReadingFetcher::new(self.client.clone(), self.readings_count);

        tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;

                debug!(
                    "Fetching registrar '{}' for device '{}' zones {:?}",
                    registrar.registrar_id, device_id, registrar.zones
                );
                let outcome = fetcher.fetch(&registrar.registrar_id).await;

                let merged = {
                    let mut state = state.write().await;
                    if state.epoch(&device_id) != epoch {
                        debug!("Device '{}' epoch changed, fetch task exiting", device_id);
                        break;
                    }
                    state.apply_outcome(&device_id, epoch, &registrar.zones, &outcome)
                };

                // Forward successful merges to history, fire-and-forget
                if let Some(reading) = merged {
                    for zone in &registrar.zones {
                        let entry = HistoryEntry {
                            device_id: device_id.clone(),
                            registrar_id: registrar.registrar_id.clone(),
                            zone: *zone,
                            timestamp: reading.timestamp,
                            start_index: reading.start_index,
                            values: reading.values.clone(),
                        };
                        let history = history.clone();
                        tokio::spawn(async move {
                            if let Err(err) = history.record(entry).await {
                                warn!("History forwarding failed: {}", err);
                            }
                        });
                    }
                }

                if matches!(outcome, FetchOutcome::TransportFailure(_)) {
                    debug!(
                        "Transport failure polling registrar '{}' for device '{}'",
                        registrar.registrar_id, device_id
                    );
                }
            }
        })
    }

    /// Spawn the per-device counter task.
    ///
    /// Fires once per interval starting one interval after activation (the
    /// initial fetch was already counted synchronously), keeping UI animation
    /// periods correct however many registrars and zones a cycle touches.
    fn spawn_counter_task(
        &self,
        device_id: &str,
        interval: Duration,
        epoch: u64,
    ) -> JoinHandle<()> {
        let device_id = device_id.to_string();
        let state = self.state.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let mut state = state.write().await;
                if !state.advance_cycle(&device_id, epoch) {
                    debug!("Device '{}' epoch changed, counter task exiting", device_id);
                    break;
                }
            }
        })
    }
}
