// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Failure classification and escalation
//!
//! Per (device, zone) the engine keeps two independent failure streaks: one
//! for transport failures and one for device-read failures. Severity shown
//! on a card is driven only by the read streak; transport failures feed the
//! global connectivity banner and never flag an individual card.

use std::collections::HashMap;

use super::device::Zone;

/// Read streak at which a zone is flagged.
pub const FLAGGED_THRESHOLD: u32 = 1;
/// Read streak at which a zone escalates to critical.
pub const CRITICAL_THRESHOLD: u32 = 3;

/// UI escalation tier of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    None,
    Flagged,
    Critical,
}

/// Consecutive-failure counters of one zone.
///
/// The two streaks never reset each other: a transport failure leaves the
/// read streak untouched and vice versa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorStreaks {
    /// Consecutive transport failures (the read call itself failed).
    pub transport: u32,
    /// Consecutive device-read failures (the call completed, the field
    /// device could not be read).
    pub read: u32,
}

impl ErrorStreaks {
    /// Severity derived from the read streak only.
    pub fn severity(&self) -> Severity {
        if self.read >= CRITICAL_THRESHOLD {
            Severity::Critical
        } else if self.read >= FLAGGED_THRESHOLD {
            Severity::Flagged
        } else {
            Severity::None
        }
    }

    pub fn is_flagged(&self) -> bool {
        self.read >= FLAGGED_THRESHOLD
    }

    pub fn is_critical(&self) -> bool {
        self.read >= CRITICAL_THRESHOLD
    }
}

/// Per-zone failure streaks of one device.
#[derive(Debug, Clone, Default)]
pub struct ZoneErrors {
    streaks: HashMap<Zone, ErrorStreaks>,
}

impl ZoneErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Streaks for a zone, zero if never touched.
    pub fn streaks(&self, zone: Zone) -> ErrorStreaks {
        self.streaks.get(&zone).copied().unwrap_or_default()
    }

    /// A transport failure affected the given zones.
    pub fn record_transport_failure(&mut self, zones: &[Zone]) {
        for zone in zones {
            self.streaks.entry(*zone).or_default().transport += 1;
        }
    }

    /// A fetch for the given zones completed at the transport level.
    ///
    /// Clears the transport streak of exactly the covered zones: recovery is
    /// per registrar call, so a device with two registrars keeps the global
    /// banner up while one of them is still unreachable.
    pub fn record_transport_success(&mut self, zones: &[Zone]) {
        for zone in zones {
            if let Some(streaks) = self.streaks.get_mut(zone) {
                streaks.transport = 0;
            }
        }
    }

    /// The field device could not be read for the given zones.
    pub fn record_read_failure(&mut self, zones: &[Zone]) {
        for zone in zones {
            self.streaks.entry(*zone).or_default().read += 1;
        }
    }

    /// A device read succeeded for the given zones.
    pub fn record_read_success(&mut self, zones: &[Zone]) {
        for zone in zones {
            if let Some(streaks) = self.streaks.get_mut(zone) {
                streaks.read = 0;
            }
        }
    }

    /// True while any zone of this device has a nonzero transport streak.
    pub fn has_transport_failure(&self) -> bool {
        self.streaks.values().any(|s| s.transport > 0)
    }
}
