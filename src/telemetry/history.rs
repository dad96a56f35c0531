// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Historical storage collaborator
//!
//! Every successful merge is forwarded to a [`HistoryStore`]. Forwarding is
//! fire-and-forget: a storage error is logged and never blocks or fails the
//! polling cycle.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

use super::device::Zone;

/// One successfully merged reading, as handed to the history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub device_id: String,
    pub registrar_id: String,
    pub zone: Zone,
    pub timestamp: DateTime<Utc>,
    pub start_index: u16,
    pub values: Vec<u16>,
}

/// Outbound historical-storage collaborator.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Record one merged reading.
    async fn record(&self, entry: HistoryEntry) -> Result<()>;
}

/// In-memory history store with a bounded ring of entries.
#[derive(Debug)]
pub struct MemoryHistoryStore {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Most recent `count` entries of a device, oldest first.
    pub async fn recent(&self, device_id: &str, count: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().await;
        let matching: Vec<_> = entries
            .iter()
            .filter(|e| e.device_id == device_id)
            .cloned()
            .collect();
        let skip = matching.len().saturating_sub(count);
        matching.into_iter().skip(skip).collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn record(&self, entry: HistoryEntry) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.push_back(entry);
        // Maintain size limit, oldest out first
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        Ok(())
    }
}

/// History store that discards everything, for callers without storage.
#[derive(Debug, Default)]
pub struct NullHistoryStore;

#[async_trait]
impl HistoryStore for NullHistoryStore {
    async fn record(&self, _entry: HistoryEntry) -> Result<()> {
        Ok(())
    }
}
