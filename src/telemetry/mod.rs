// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Live telemetry engine for Modbus-monitored electrical feeders
//!
//! This module turns a set of feeder cards into running polling loops:
//! resolution of zone bindings to backend registrars, periodic fetching of
//! recent readings, reconciliation of returned register windows into a
//! per-device register map, and classification of failures into per-zone
//! escalation and a fleet-wide connectivity signal.
//!
//! ## Architecture
//!
//! * [`device`] describes feeder cards, zones and their registrar bindings
//! * [`resolver`] deduplicates zone bindings into fetch targets
//! * [`fetcher`] wraps the backend client and classifies each fetch
//! * [`reconciler`] merges register windows with range eviction
//! * [`classifier`] keeps the dual failure streaks per zone
//! * [`state`] is the shared, lock-protected engine state
//! * [`scheduler`] owns the per-device polling tasks
//! * [`exporter`] derives the read-only UI projection
//! * [`history`] forwards merged readings to storage

pub mod classifier;
pub mod device;
pub mod exporter;
pub mod fetcher;
pub mod history;
pub mod reconciler;
pub mod resolver;
pub mod scheduler;
pub mod state;

pub use classifier::{ErrorStreaks, Severity, ZoneErrors, CRITICAL_THRESHOLD, FLAGGED_THRESHOLD};
pub use device::{CardDesign, DeviceSpec, Zone, ZoneBinding};
pub use exporter::{animation_phase, TelemetrySnapshot, ZoneStatus};
pub use fetcher::{FetchOutcome, Reading, ReadingFetcher, ReadingsClient};
pub use history::{HistoryEntry, HistoryStore, MemoryHistoryStore, NullHistoryStore};
pub use reconciler::RegisterWindow;
pub use resolver::{resolve_registrars, ResolvedRegistrar};
pub use scheduler::{PollingScheduler, StartError};
pub use state::{create_shared_telemetry_state, SharedTelemetryState, TelemetryState};
