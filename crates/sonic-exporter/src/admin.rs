// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Writes to the exporter's config record, as done by `sonic-exporter-cfg`.
//!
//! Every write triggers a keyspace notification, which restarts a running exporter.

use tracing::debug;

use crate::config::CONFIG_KEY;
use crate::config_store::ConfigStore;
use crate::error::ExporterError;

/// VRF argument selecting the default VRF.
pub const NO_VRF: &str = "none";

const VRF_TABLE: &str = "VRF";

pub async fn set_port(store: &dyn ConfigStore, port: u16) -> Result<(), ExporterError> {
    if port == 0 {
        return Err(ExporterError::InvalidPort {
            value: port.to_string(),
            reason: "port must be between 1 and 65535".to_string(),
        });
    }
    debug!("Setting exporter port to {port}");
    store
        .set_field(CONFIG_KEY, "port", &port.to_string())
        .await
}

/// Sets the VRF the exporter listens in. `none` selects the default VRF, any other name must
/// exist in the `VRF` table.
pub async fn set_vrf(store: &dyn ConfigStore, vrf: &str) -> Result<(), ExporterError> {
    let value = if vrf == NO_VRF {
        ""
    } else {
        if !store.exists(&vrf_key(vrf)).await? {
            return Err(ExporterError::UnknownVrf(vrf.to_string()));
        }
        vrf
    };
    debug!("Setting exporter VRF to {value:?}");
    store.set_field(CONFIG_KEY, "vrf", value).await
}

fn vrf_key(vrf: &str) -> String {
    format!("{VRF_TABLE}|{vrf}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vrf_key() {
        assert_eq!(vrf_key("mgmt"), "VRF|mgmt");
        assert_eq!(vrf_key("Vrf_blue"), "VRF|Vrf_blue");
    }
}
