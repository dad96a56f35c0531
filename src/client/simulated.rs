// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated readings client
//!
//! A scriptable [`ReadingsClient`] for tests and backend-less development.
//! Responses can be enqueued per registrar; once a registrar's script is
//! exhausted (or was never set) every fetch succeeds with random register
//! values over the configured window.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::telemetry::fetcher::{Reading, ReadingsClient};

/// One scripted response of the simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedResponse {
    /// A successful reading with random values.
    Success,
    /// A reading the backend delivered but the field device refused.
    ReadFailure,
    /// The call itself fails.
    TransportFailure,
    /// The backend has no readings for the registrar.
    Empty,
}

/// Scriptable in-memory backend.
pub struct SimulatedReadingsClient {
    start_index: u16,
    register_count: u16,
    latency: Option<Duration>,
    scripts: Mutex<HashMap<String, VecDeque<SimulatedResponse>>>,
    fetch_counts: Mutex<HashMap<String, u64>>,
}

impl SimulatedReadingsClient {
    /// Client whose readings cover `register_count` registers starting at
    /// `start_index`.
    pub fn new(start_index: u16, register_count: u16) -> Self {
        Self {
            start_index,
            register_count,
            latency: None,
            scripts: Mutex::new(HashMap::new()),
            fetch_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Delay every fetch by `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue responses for a registrar, consumed in order.
    pub async fn enqueue(
        &self,
        registrar_id: &str,
        responses: impl IntoIterator<Item = SimulatedResponse>,
    ) {
        self.scripts
            .lock()
            .await
            .entry(registrar_id.to_string())
            .or_default()
            .extend(responses);
    }

    /// How many fetches were issued for a registrar.
    pub async fn fetch_count(&self, registrar_id: &str) -> u64 {
        self.fetch_counts
            .lock()
            .await
            .get(registrar_id)
            .copied()
            .unwrap_or(0)
    }

    fn make_reading(&self, success: bool) -> Reading {
        let mut rng = rand::thread_rng();
        let values = (0..self.register_count)
            .map(|_| rng.gen_range(0..=u16::MAX))
            .collect();
        Reading {
            success,
            timestamp: Utc::now(),
            start_index: self.start_index,
            values,
        }
    }
}

#[async_trait]
impl ReadingsClient for SimulatedReadingsClient {
    async fn fetch_last_readings(&self, registrar_id: &str, _count: usize) -> Result<Vec<Reading>> {
        *self
            .fetch_counts
            .lock()
            .await
            .entry(registrar_id.to_string())
            .or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let scripted = self
            .scripts
            .lock()
            .await
            .get_mut(registrar_id)
            .and_then(|queue| queue.pop_front());

        let response = scripted.unwrap_or(SimulatedResponse::Success);
        match response {
            SimulatedResponse::Success => Ok(vec![self.make_reading(true)]),
            SimulatedResponse::ReadFailure => Ok(vec![self.make_reading(false)]),
            SimulatedResponse::TransportFailure => {
                Err(anyhow!("simulated connection failure for '{}'", registrar_id))
            }
            SimulatedResponse::Empty => Ok(Vec::new()),
        }
    }
}
