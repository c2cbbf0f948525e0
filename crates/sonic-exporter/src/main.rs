// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info};

use node_probes::{default_probes, ProbeConfig};
use sonic_exporter::{
    aggregator::ProbeRegistry,
    build_info::build_info,
    config_store::{RedisConfigStore, CONFIG_DB},
    error::ExporterError,
    log_adapter::TracingKvLogger,
    logging, runner,
    settings::Settings,
    watcher::RestartReason,
};

#[tokio::main]
pub async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = logging::init(&settings) {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    debug!("Logging subsystem enabled");

    match start(settings).await {
        Ok(reason) => {
            debug!("Exiting for restart: {reason:?}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn start(settings: Settings) -> Result<RestartReason, ExporterError> {
    let build_info = build_info();
    info!(
        exporter_version = %build_info.version,
        exporter_revision = %build_info.revision,
        rust_version = %build_info.rust_version,
        "Starting up"
    );

    let store = Arc::new(RedisConfigStore::open(&settings.redis_socket, CONFIG_DB)?);

    let probe_config = ProbeConfig::new(settings.procfs, Arc::new(TracingKvLogger))
        .with_sysfs(settings.sysfs);
    let probes = ProbeRegistry::from_probes(default_probes(&probe_config)?)?;
    debug!(
        "Enabled probes: {}",
        probes.names().collect::<Vec<_>>().join(", ")
    );

    runner::run(store, probes, build_info).await
}
