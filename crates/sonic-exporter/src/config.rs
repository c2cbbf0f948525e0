// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};

use crate::error::ExporterError;

/// Registered Prometheus exporter port
pub const DEFAULT_PORT: u16 = 9893;

/// Config DB key holding the exporter settings
pub const CONFIG_KEY: &str = "SONIC_EXPORTER|default";

const PORT_FIELD: &str = "port";
const VRF_FIELD: &str = "vrf";

/// Exporter settings read from the config database.
///
/// Loaded once per process. A change in the database restarts the process instead of updating
/// this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub port: u16,
    /// Name of the VRF device the listener is pinned to. Empty means the default VRF.
    pub vrf: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            vrf: String::new(),
        }
    }
}

impl ExporterConfig {
    /// Builds the config from the `SONIC_EXPORTER|default` hash, applying defaults for missing
    /// fields.
    pub fn from_record(record: &HashMap<String, String>) -> Result<Self, ExporterError> {
        let port = match record.get(PORT_FIELD) {
            Some(value) => parse_port(value)?,
            None => DEFAULT_PORT,
        };
        let vrf = record.get(VRF_FIELD).cloned().unwrap_or_default();
        Ok(Self { port, vrf })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn routing_domain(&self) -> Option<&str> {
        (!self.vrf.is_empty()).then_some(self.vrf.as_str())
    }
}

pub fn parse_port(value: &str) -> Result<u16, ExporterError> {
    let port = value
        .parse::<u16>()
        .map_err(|e| ExporterError::InvalidPort {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
    if port == 0 {
        return Err(ExporterError::InvalidPort {
            value: value.to_string(),
            reason: "port must be between 1 and 65535".to_string(),
        });
    }
    Ok(port)
}
