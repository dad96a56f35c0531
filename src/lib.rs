// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! # Feeder Telemetry
//!
//! A live telemetry engine for electrical feeders monitored over Modbus
//! through a readings backend. Each feeder card exposes up to two zones
//! (superior and inferior) bound to backend registrars; the engine polls
//! every active device on its own interval, reconciles returned register
//! windows into a per-device register map, and classifies failures into
//! per-zone escalation plus a fleet-wide connectivity signal.
//!
//! ## Modules
//!
//! * [`config`] - YAML configuration with JSON Schema validation
//! * [`telemetry`] - resolution, scheduling, reconciliation, classification
//! * [`client`] - HTTP and simulated backend clients
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use feeder_telemetry::client::HttpReadingsClient;
//! use feeder_telemetry::config::Config;
//! use feeder_telemetry::telemetry::{
//!     create_shared_telemetry_state, DeviceSpec, MemoryHistoryStore, PollingScheduler,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config::from_file("config.yaml")?;
//! let client = Arc::new(HttpReadingsClient::new(&config.backend)?);
//! let history = Arc::new(MemoryHistoryStore::new(config.polling.history_capacity));
//! let scheduler = PollingScheduler::new(
//!     create_shared_telemetry_state(),
//!     client,
//!     history,
//!     &config.polling,
//! );
//!
//! let device = DeviceSpec::shared("feeder-7", "reg-42", 5000);
//! scheduler.start(&device).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod telemetry;

pub use config::Config;
pub use telemetry::{PollingScheduler, SharedTelemetryState, TelemetrySnapshot};
