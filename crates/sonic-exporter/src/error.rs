// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;

/// Errors that can occur while starting or running the exporter
#[derive(Debug, thiserror::Error)]
pub enum ExporterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse port number {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("VRF {0} does not exist")]
    UnknownVrf(String),

    #[error("Config store error: {0}")]
    ConfigStore(#[from] redis::RedisError),

    #[error("Failed to listen on port {port} (vrf {vrf:?}): {source}")]
    Bind {
        port: u16,
        vrf: String,
        source: io::Error,
    },

    #[error("Probe {0} is registered twice")]
    DuplicateProbe(String),

    #[error("Failed to set up probes: {0}")]
    ProbeSetup(#[from] node_probes::ProbeError),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),

    #[error("Failed to set up metrics registry: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("Server error: {0}")]
    Serve(#[from] io::Error),
}

/// Errors that can occur while rendering one metrics response
#[derive(Debug, thiserror::Error)]
pub enum ExpositionError {
    #[error("Metric {name} was collected with conflicting {conflict}")]
    Collision { name: String, conflict: String },

    #[error("Failed to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
}
