// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Device and card configuration types
//!
//! These types mirror the card configuration owned by the CRUD collaborator.
//! The engine reads them once at activation time; changing a device while it
//! is running does not retroactively affect an already-started cycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One half of a device's display card.
///
/// Each zone may be bound to its own registrar, or both zones may share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Superior,
    Inferior,
}

impl Zone {
    /// Both zones of a card, in display order.
    pub const ALL: [Zone; 2] = [Zone::Superior, Zone::Inferior];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Superior => "superior",
            Zone::Inferior => "inferior",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registrar binding for a single zone of a card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneBinding {
    /// Identifier of the registrar feeding this zone, if any.
    #[serde(default)]
    pub registrar_id: Option<String>,
}

/// Card configuration of a device: which registrar feeds which zone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardDesign {
    #[serde(default)]
    pub superior: ZoneBinding,
    #[serde(default)]
    pub inferior: ZoneBinding,
}

/// Snapshot of a monitored feeder, as handed over by the configuration UI.
///
/// Only the fields the polling engine needs are represented here. The
/// device-level `legacy_registrar_id` predates per-zone bindings and is kept
/// for compatibility with cards configured before zones existed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSpec {
    /// Unique device identifier.
    pub id: String,

    /// Polling interval in milliseconds. A device without an interval cannot
    /// be started.
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,

    /// Per-zone registrar bindings.
    #[serde(default)]
    pub card_design: CardDesign,

    /// Device-level registrar identifier from before zone bindings existed.
    #[serde(default)]
    pub legacy_registrar_id: Option<String>,
}

impl DeviceSpec {
    /// Convenience constructor for a device with both zones on one registrar.
    pub fn shared(id: impl Into<String>, registrar_id: impl Into<String>, interval_ms: u64) -> Self {
        let registrar_id = registrar_id.into();
        Self {
            id: id.into(),
            poll_interval_ms: Some(interval_ms),
            card_design: CardDesign {
                superior: ZoneBinding {
                    registrar_id: Some(registrar_id.clone()),
                },
                inferior: ZoneBinding {
                    registrar_id: Some(registrar_id),
                },
            },
            legacy_registrar_id: None,
        }
    }

    /// Convenience constructor for a device with a distinct registrar per zone.
    pub fn split(
        id: impl Into<String>,
        superior_registrar: impl Into<String>,
        inferior_registrar: impl Into<String>,
        interval_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            poll_interval_ms: Some(interval_ms),
            card_design: CardDesign {
                superior: ZoneBinding {
                    registrar_id: Some(superior_registrar.into()),
                },
                inferior: ZoneBinding {
                    registrar_id: Some(inferior_registrar.into()),
                },
            },
            legacy_registrar_id: None,
        }
    }
}
