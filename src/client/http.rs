// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP readings client
//!
//! Talks to the backend readings API:
//! `GET {base}/api/registradores/{id}/lecturas?limite=N`.
//!
//! The wire format keeps the backend's Spanish field names; they are mapped
//! to the engine's [`Reading`] at the deserialization boundary. A non-2xx
//! status or any connection or timeout error surfaces as `Err`, which the
//! fetcher classifies as a transport failure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::telemetry::fetcher::{Reading, ReadingsClient};

/// One reading as serialized by the backend.
#[derive(Debug, Deserialize)]
struct WireReading {
    /// Device-read outcome; the backend omits it on older versions, where
    /// presence of the reading implies success.
    #[serde(rename = "exito", default = "default_true")]
    success: bool,
    #[serde(rename = "timestamp", default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(rename = "indice_inicial")]
    start_index: u16,
    #[serde(rename = "valores")]
    values: Vec<u16>,
}

fn default_true() -> bool {
    true
}

impl From<WireReading> for Reading {
    fn from(wire: WireReading) -> Self {
        Reading {
            success: wire.success,
            timestamp: wire.timestamp,
            start_index: wire.start_index,
            values: wire.values,
        }
    }
}

/// [`ReadingsClient`] over the backend HTTP API.
pub struct HttpReadingsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReadingsClient {
    /// Build a client from the backend configuration.
    ///
    /// The configured timeout applies to the whole request, connect
    /// included.
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ReadingsClient for HttpReadingsClient {
    async fn fetch_last_readings(&self, registrar_id: &str, count: usize) -> Result<Vec<Reading>> {
        let url = format!(
            "{}/api/registradores/{}/lecturas?limite={}",
            self.base_url, registrar_id, count
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to registrar '{}' failed", registrar_id))?
            .error_for_status()
            .with_context(|| format!("Registrar '{}' returned an error status", registrar_id))?;

        let readings: Vec<WireReading> = response
            .json()
            .await
            .with_context(|| format!("Invalid readings payload for registrar '{}'", registrar_id))?;

        Ok(readings.into_iter().map(Reading::from).collect())
    }
}
