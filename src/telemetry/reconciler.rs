// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Register window reconciliation
//!
//! Each device accumulates a single register window, possibly fed by several
//! registrars. A successful reading replaces exactly the addresses its range
//! covers and leaves every other address untouched, so registrars with
//! disjoint, adjacent or overlapping ranges coexist without the scheduler
//! tracking registrar-to-address ownership.

use std::collections::BTreeMap;

use super::fetcher::Reading;

/// Last-known register values of one device, keyed by absolute address.
#[derive(Debug, Clone, Default)]
pub struct RegisterWindow {
    registers: BTreeMap<u16, u16>,
}

impl RegisterWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a successful reading into the window.
    ///
    /// Every address inside the covered range `[start_index, start_index + n)`
    /// is evicted first, regardless of which earlier registrar wrote it, then
    /// the new values are inserted. Merging the same reading twice leaves the
    /// window identical to merging it once.
    pub fn merge(&mut self, reading: &Reading) {
        if reading.values.is_empty() {
            return;
        }

        let start = reading.start_index;
        // Values running past the end of the address space are dropped; the
        // covered range never wraps around to low addresses
        let len = reading.values.len().min(usize::from(u16::MAX - start) + 1);
        let end = u32::from(start) + len as u32;
        self.registers
            .retain(|addr, _| *addr < start || u32::from(*addr) >= end);

        for (offset, value) in reading.values.iter().take(len).enumerate() {
            self.registers.insert(start + offset as u16, *value);
        }
    }

    /// Last-known value at an absolute register address.
    pub fn get(&self, address: u16) -> Option<u16> {
        self.registers.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.registers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// All known registers in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.registers.iter().map(|(addr, value)| (*addr, *value))
    }
}
