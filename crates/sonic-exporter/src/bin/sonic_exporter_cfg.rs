// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sonic_exporter::admin;
use sonic_exporter::config::parse_port;
use sonic_exporter::config_store::{RedisConfigStore, CONFIG_DB, DEFAULT_REDIS_SOCKET};

/// Configure Prometheus exporter for SONiC
#[derive(Parser, Debug)]
#[command(name = "sonic-exporter-cfg", version)]
struct Cli {
    /// Redis unix socket of the config database
    #[arg(long, env = "SONIC_EXPORTER_REDIS_SOCKET", default_value = DEFAULT_REDIS_SOCKET)]
    redis_socket: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set the port that the exporter is listening to.
    Port {
        #[arg(value_parser = parse_port_arg)]
        port: u16,
    },
    /// Set the VRF that the exporter is listening inside.
    ///
    /// If VRF is set to 'none' the default VRF is used.
    Vrf { vrf: String },
}

fn parse_port_arg(value: &str) -> Result<u16, String> {
    parse_port(value).map_err(|e| e.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = RedisConfigStore::open(&cli.redis_socket, CONFIG_DB)
        .with_context(|| format!("cannot open {}", cli.redis_socket.display()))?;

    match cli.command {
        Command::Port { port } => admin::set_port(&store, port).await?,
        Command::Vrf { vrf } => admin::set_vrf(&store, &vrf).await?,
    }
    Ok(())
}
