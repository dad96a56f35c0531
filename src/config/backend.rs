// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Readings backend configuration
//!
//! This module defines the structure for configuring the HTTP backend that
//! proxies reads to the field registrars.

use serde::{Deserialize, Serialize};

/// Configuration for the readings backend API.
///
/// The polling engine never talks Modbus directly: it asks an intermediary
/// backend for the last readings of a registrar. This structure describes
/// where that backend lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the readings backend.
    ///
    /// The readings endpoint is resolved relative to this URL. Default is the
    /// local development server.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// A fetch that exceeds this timeout is reported as a transport failure.
    /// Must be greater than zero.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}
