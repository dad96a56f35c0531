// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Reading fetch and outcome classification
//!
//! The fetcher performs one read per registrar through the external
//! [`ReadingsClient`] and normalizes the result into a [`FetchOutcome`].
//! The distinction between a transport failure (the call itself failed) and
//! a device-read failure (the call completed but the field read failed) is
//! preserved end-to-end: they drive different UI escalations and must never
//! be collapsed into one category.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One reading of a registrar, as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    /// Device-read outcome reported by the backend. `false` means the call
    /// reached the backend but the field device could not be read.
    pub success: bool,
    /// When the backend captured the reading.
    pub timestamp: DateTime<Utc>,
    /// Absolute register address of `values[0]`.
    pub start_index: u16,
    /// Register values covering `[start_index, start_index + values.len())`.
    pub values: Vec<u16>,
}

/// External read collaborator.
///
/// Implementations reach a backend that itself proxies the field device. An
/// `Err` from this trait is a transport failure; an `Ok` with an empty list
/// is "no data yet", not an error.
#[async_trait]
pub trait ReadingsClient: Send + Sync {
    /// Fetch the last `count` readings of a registrar, newest first.
    async fn fetch_last_readings(&self, registrar_id: &str, count: usize) -> Result<Vec<Reading>>;
}

/// Classified result of one fetch.
///
/// A total match over these three variants is the only way failure state is
/// updated, so the two failure kinds cannot be silently conflated.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The call completed and the device read succeeded. `None` when the
    /// backend has no reading yet for this registrar.
    Success(Option<Reading>),
    /// The call completed but the backend reported the field read failed.
    /// The failed reading is kept so the UI can show its timestamp.
    DeviceReadFailure(Reading),
    /// The call itself could not be completed.
    TransportFailure(String),
}

/// Stateless wrapper normalizing [`ReadingsClient`] results.
#[derive(Clone)]
pub struct ReadingFetcher {
    client: Arc<dyn ReadingsClient>,
    count: usize,
}

impl ReadingFetcher {
    pub fn new(client: Arc<dyn ReadingsClient>, count: usize) -> Self {
        Self { client, count }
    }

    /// Perform one read for `registrar_id` and classify the result.
    pub async fn fetch(&self, registrar_id: &str) -> FetchOutcome {
        match self.client.fetch_last_readings(registrar_id, self.count).await {
            Err(err) => FetchOutcome::TransportFailure(err.to_string()),
            Ok(readings) => match readings.into_iter().next() {
                None => FetchOutcome::Success(None),
                Some(reading) if !reading.success => FetchOutcome::DeviceReadFailure(reading),
                Some(reading) => FetchOutcome::Success(Some(reading)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::simulated::{SimulatedReadingsClient, SimulatedResponse};

    #[tokio::test]
    async fn test_fetch_classifies_all_outcomes() {
        let client = Arc::new(SimulatedReadingsClient::new(100, 4));
        client
            .enqueue(
                "reg-1",
                [
                    SimulatedResponse::Success,
                    SimulatedResponse::ReadFailure,
                    SimulatedResponse::TransportFailure,
                    SimulatedResponse::Empty,
                ],
            )
            .await;

        let fetcher = ReadingFetcher::new(client, 1);

        match fetcher.fetch("reg-1").await {
            FetchOutcome::Success(Some(reading)) => {
                assert!(reading.success);
                assert_eq!(reading.start_index, 100);
                assert_eq!(reading.values.len(), 4);
            }
            other => panic!("expected success, got {:?}", other),
        }

        match fetcher.fetch("reg-1").await {
            FetchOutcome::DeviceReadFailure(reading) => assert!(!reading.success),
            other => panic!("expected device-read failure, got {:?}", other),
        }

        assert!(matches!(
            fetcher.fetch("reg-1").await,
            FetchOutcome::TransportFailure(_)
        ));

        assert!(matches!(
            fetcher.fetch("reg-1").await,
            FetchOutcome::Success(None)
        ));
    }
}
