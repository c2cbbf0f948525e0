// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::path::PathBuf;

use crate::probe::{Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_error, parse_field, read_to_string};
use crate::sample::{Sample, SampleKind, SampleSink};

const STAT_PATH: &str = "stat";

/// `/proc/stat` keys exported by this probe. For `intr` only the leading total is used.
const STAT_METRICS: [(&str, &str, SampleKind, &str); 6] = [
    (
        "btime",
        "node_boot_time_seconds",
        SampleKind::Gauge,
        "Node boot time, in unixtime.",
    ),
    (
        "ctxt",
        "node_context_switches_total",
        SampleKind::Counter,
        "Total number of context switches.",
    ),
    (
        "processes",
        "node_forks_total",
        SampleKind::Counter,
        "Total number of forks.",
    ),
    (
        "intr",
        "node_intr_total",
        SampleKind::Counter,
        "Total number of interrupts serviced.",
    ),
    (
        "procs_running",
        "node_procs_running",
        SampleKind::Gauge,
        "Number of processes in runnable state.",
    ),
    (
        "procs_blocked",
        "node_procs_blocked",
        SampleKind::Gauge,
        "Number of processes blocked waiting for I/O to complete.",
    ),
];

pub struct StatProbe {
    path: PathBuf,
}

impl StatProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.proc_path(STAT_PATH),
        }
    }
}

#[async_trait]
impl Probe for StatProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        for line in contents.lines() {
            let mut fields = line.split_whitespace();
            let Some(key) = fields.next() else {
                continue;
            };
            let Some((_, name, kind, help)) = STAT_METRICS.iter().find(|(k, ..)| *k == key)
            else {
                continue;
            };
            let raw = fields
                .next()
                .ok_or_else(|| parse_error(&self.path, format!("{key} has no value")))?;
            let value: f64 = parse_field(&self.path, key, raw)?;
            sink.emit(Sample::new(*kind, *name, *help, value))?;
        }
        Ok(())
    }
}
