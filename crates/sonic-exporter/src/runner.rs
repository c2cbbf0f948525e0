// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::sync::Arc;
use tracing::info;

use crate::aggregator::{NodeCollector, ProbeRegistry};
use crate::build_info::BuildInfo;
use crate::config_store::ConfigStore;
use crate::error::ExporterError;
use crate::exporter::Exporter;
use crate::exposition::Exposition;
use crate::listener;
use crate::watcher::{ConfigWatcher, RestartReason};

/// Runs the exporter until its config changes.
///
/// Returns the reason the process has to restart, or the error that stopped it. In-flight
/// scrapes are not drained.
pub async fn run(
    store: Arc<dyn ConfigStore>,
    probes: ProbeRegistry,
    build_info: &BuildInfo,
) -> Result<RestartReason, ExporterError> {
    let watcher = ConfigWatcher::new(store);
    let config = watcher.load().await?;
    let subscription = watcher.subscribe().await?;
    info!(port = config.port, vrf = %config.vrf, "Configuration loaded");

    let listener = listener::bind(&config)?;
    let exporter = Exporter::new(Exposition::new(NodeCollector::new(probes), build_info)?);

    info!("SONiC Prometheus exporter running");
    tokio::select! {
        result = exporter.serve(listener) => {
            result?;
            Err(ExporterError::Serve(io::Error::other("server stopped")))
        }
        reason = subscription.wait_for_change() => Ok(reason),
    }
}
