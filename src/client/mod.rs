// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the feeder-telemetry project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Backend clients
//!
//! Implementations of [`ReadingsClient`](crate::telemetry::ReadingsClient):
//! an HTTP client talking to the readings API and a scriptable simulated
//! client for tests and development without a backend.

pub mod http;
pub mod simulated;

pub use http::HttpReadingsClient;
pub use simulated::{SimulatedReadingsClient, SimulatedResponse};
