// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Network device counters from `/proc/net/dev`.
//!
//! On a switch this covers the front panel ports (`Ethernet0`, ...), the management port and the
//! kernel side of every VRF and VLAN device.

use async_trait::async_trait;
use std::path::PathBuf;

use crate::probe::{Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_error, parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const NETDEV_PATH: &str = "net/dev";
const HEADER_LINES: usize = 2;

const RECEIVE_COLUMNS: [&str; 8] = [
    "bytes",
    "packets",
    "errs",
    "drop",
    "fifo",
    "frame",
    "compressed",
    "multicast",
];
const TRANSMIT_COLUMNS: [&str; 8] = [
    "bytes",
    "packets",
    "errs",
    "drop",
    "fifo",
    "colls",
    "carrier",
    "compressed",
];

pub struct NetDevProbe {
    path: PathBuf,
}

impl NetDevProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.proc_path(NETDEV_PATH),
        }
    }
}

#[async_trait]
impl Probe for NetDevProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        for line in contents.lines().skip(HEADER_LINES) {
            // "  eth0: 1 2 ..." and "eth0:1 2 ..." both occur
            let Some((device, counters)) = line.split_once(':') else {
                continue;
            };
            let device = device.trim();
            let values: Vec<&str> = counters.split_whitespace().collect();
            if values.len() < RECEIVE_COLUMNS.len() + TRANSMIT_COLUMNS.len() {
                return Err(parse_error(
                    &self.path,
                    format!("device {device} has {} columns, expected 16", values.len()),
                ));
            }

            let directions = RECEIVE_COLUMNS
                .iter()
                .map(|column| ("receive", *column))
                .chain(TRANSMIT_COLUMNS.iter().map(|column| ("transmit", *column)));
            for ((direction, column), raw) in directions.zip(values) {
                let value: f64 = parse_field(&self.path, column, raw)?;
                sink.emit(
                    Sample::counter(
                        format!("node_network_{direction}_{column}_total"),
                        format!("Network device statistic {direction}_{column}."),
                        value,
                    )
                    .with_label("device", device),
                )?;
            }
        }
        Ok(())
    }
}
