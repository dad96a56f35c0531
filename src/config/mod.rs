// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the feeder telemetry engine
//!
//! This module provides functionality for loading, validating, and applying
//! configuration settings for the telemetry engine. The configuration is
//! backed by a YAML file and validated against a JSON schema for robustness.
//!
//! ## Configuration Structure
//!
//! The configuration is organized as a nested structure with sections:
//! - `backend`: Settings for the readings backend API
//! - `polling`: Engine-wide polling settings
//!
//! Device and card configuration is *not* part of the file: it belongs to the
//! CRUD collaborator that owns devices and is read at activation time only.
//!
//! ## Usage
//!
//! ```no_run
//! use feeder_telemetry::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! println!("Backend: {}", config.backend.api_base_url);
//! println!("Default interval: {} ms", config.polling.default_interval_ms);
//! ```

pub mod backend;
pub mod polling;
pub mod utils;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

// Re-export all types for public API
pub use backend::BackendConfig;
pub use polling::PollingConfig;
pub use utils::output_config_schema;

/// Root configuration structure for the feeder telemetry engine.
///
/// This structure serves as the main container for all configuration sections.
/// It is designed to be deserialized from and serialized to YAML using the
/// serde framework, and is validated against a JSON schema to ensure all
/// fields are present and have valid values.
///
/// # Default Values
///
/// Each section uses default values when not explicitly specified in the
/// configuration file, allowing for minimal configuration when custom
/// settings are not required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Settings for the readings backend API.
    ///
    /// These settings control where registrar readings are fetched from and
    /// how long a request may take before it counts as a transport failure.
    /// If not specified in the configuration file, default values are used.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Engine-wide polling settings.
    ///
    /// This section controls parameters related to the periodic read cycles,
    /// such as the fallback interval, how many readings are requested per
    /// fetch, and the capacity of the in-memory history store.
    /// If not specified, default values will be used.
    #[serde(default)]
    pub polling: PollingConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        debug!("Creating sample configuration file at {:?}", path);
        let sample_path = path.with_extension("sample.yaml");

        // Create parent directories if they don't exist
        if let Some(parent) = sample_path.parent() {
            if !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        let sample_config = Self::default();
        sample_config
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        // First step: convert YAML to a generic Value
        let yaml_value: serde_yml::Value = serde_yml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML configuration from {:?}", path))?;

        // Convert to JSON Value for validation
        let json_value = serde_json::to_value(&yaml_value).with_context(|| {
            format!("Failed to convert YAML to JSON for validation: {:?}", path)
        })?;

        // Load and validate with the schema
        let schema_str = include_str!("../../resources/config.schema.json");
        let schema: serde_json::Value =
            serde_json::from_str(schema_str).context("Failed to parse JSON schema")?;

        // Create the validator
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)?;

        // Validate before deserializing to Config
        debug!("Validating {} configuration against schema", path.display());
        if let Err(error) = validator.validate(&json_value) {
            error!("Configuration validation error before deserialization");
            // We generate a config.sample.yaml file with the default values
            // for the user to edit
            Self::create_sample_config(path)?;
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        // Now that YAML has been validated, deserialize to Config
        debug!("Schema validation passed, deserializing into Config structure");
        let config: Config = match serde_yml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration deserialization error: {}", err);
                match Self::create_sample_config(path) {
                    Ok(_) => debug!("Successfully created sample config"),
                    Err(e) => error!("Failed to create sample config: {}", e),
                }
                return Err(anyhow::anyhow!(
                    "Failed to deserialize configuration from {}: {}",
                    path.display(),
                    err
                ));
            }
        };

        // Perform additional specific validations
        if let Err(err) = utils::validate_specific_rules(&config) {
            error!("Configuration specific validation error: {}", err);
            Self::create_sample_config(path)?;
            return Err(err);
        }

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Validate the configuration against the specific rules.
    ///
    /// Schema validation happens on load; this re-checks the rules that can't
    /// be expressed in the schema, for configurations built in code.
    pub fn validate(&self) -> Result<()> {
        utils::validate_specific_rules(self)
    }
}
