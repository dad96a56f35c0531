// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! This module provides utility functions for working with configuration
//! settings, including validation and schema management.

use anyhow::{Context, Result};
use log::debug;

use super::Config;

/// Output the embedded JSON schema to the console.
///
/// Outputs the full JSON schema for the configuration to stdout, formatted
/// for readability, so operators can validate hand-written files.
pub fn output_config_schema() -> Result<()> {
    // Load the schema from the embedded string
    let schema_str = include_str!("../../resources/config.schema.json");

    // Parse the schema to a JSON Value to pretty-format it
    let schema: serde_json::Value =
        serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;

    println!("{}", formatted_schema);

    Ok(())
}

/// Validates the configuration against additional rules that aren't covered by the JSON schema.
///
/// # Validation Rules
///
/// - **Backend URL**: must be non-empty and use an http(s) scheme
/// - **Timeout**: must be greater than zero
/// - **Polling interval**: must be at least 100 ms
/// - **Readings count / history capacity**: must be at least 1
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    let url = config.backend.api_base_url.trim();
    if url.is_empty() {
        anyhow::bail!("Backend api_base_url must not be empty");
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!(
            "Backend api_base_url must use an http or https scheme: {}",
            url
        );
    }

    if config.backend.timeout_ms == 0 {
        anyhow::bail!("Backend timeout_ms must be greater than zero");
    }

    if config.polling.default_interval_ms < 100 {
        anyhow::bail!(
            "Polling default_interval_ms too small: {} (minimum 100)",
            config.polling.default_interval_ms
        );
    }

    if config.polling.readings_count == 0 {
        anyhow::bail!("Polling readings_count must be at least 1");
    }

    if config.polling.history_capacity == 0 {
        anyhow::bail!("Polling history_capacity must be at least 1");
    }

    Ok(())
}
