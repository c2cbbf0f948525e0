// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-CPU time accounting from `/proc/stat`.
//!
//! Every `cpuN` line holds cumulative tick counts per mode. Ticks are converted to seconds using
//! `USER_HZ`, which is 100 on every architecture SONiC ships on.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::probe::{KvLogger, Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_error, parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const STAT_PATH: &str = "stat";
const USER_HZ: f64 = 100.0;

const CPU_SECONDS_METRIC: &str = "node_cpu_seconds_total";
const CPU_SECONDS_HELP: &str = "Seconds the CPUs spent in each mode.";
const CPU_GUEST_SECONDS_METRIC: &str = "node_cpu_guest_seconds_total";
const CPU_GUEST_SECONDS_HELP: &str = "Seconds the CPUs spent in guests (VMs) for each mode.";

// Column order of a cpu line after the label
const CPU_MODES: [&str; 8] = [
    "user", "nice", "system", "idle", "iowait", "irq", "softirq", "steal",
];
const GUEST_MODES: [&str; 2] = ["user", "nice"];

#[derive(Debug, PartialEq)]
struct CpuTimes {
    id: String,
    modes: [u64; 8],
    guest: [u64; 2],
}

pub struct CpuProbe {
    path: PathBuf,
    logger: Arc<dyn KvLogger>,
}

impl CpuProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.proc_path(STAT_PATH),
            logger: Arc::clone(&config.logger),
        }
    }
}

#[async_trait]
impl Probe for CpuProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        let cpus = parse_cpu_lines(&self.path, &contents)?;
        let count = cpus.len().to_string();
        self.logger.log(&[
            ("level", "debug"),
            ("msg", "Parsed per-CPU times"),
            ("cpus", count.as_str()),
        ]);

        for cpu in cpus {
            for (mode, ticks) in CPU_MODES.iter().zip(cpu.modes) {
                sink.emit(
                    Sample::counter(CPU_SECONDS_METRIC, CPU_SECONDS_HELP, ticks as f64 / USER_HZ)
                        .with_label("cpu", cpu.id.as_str())
                        .with_label("mode", *mode),
                )?;
            }
            for (mode, ticks) in GUEST_MODES.iter().zip(cpu.guest) {
                sink.emit(
                    Sample::counter(
                        CPU_GUEST_SECONDS_METRIC,
                        CPU_GUEST_SECONDS_HELP,
                        ticks as f64 / USER_HZ,
                    )
                    .with_label("cpu", cpu.id.as_str())
                    .with_label("mode", *mode),
                )?;
            }
        }
        Ok(())
    }
}

/// Parses the `cpuN` lines, skipping the aggregate `cpu` line.
///
/// Older kernels omit trailing columns (steal, guest, guest_nice); missing columns read as zero.
fn parse_cpu_lines(path: &Path, contents: &str) -> Result<Vec<CpuTimes>, ProbeError> {
    let mut cpus = Vec::new();
    for line in contents.lines() {
        let mut fields = line.split_whitespace();
        let Some(label) = fields.next() else {
            continue;
        };
        let Some(id) = label.strip_prefix("cpu") else {
            continue;
        };
        if id.is_empty() {
            continue;
        }

        let mut columns = [0u64; 10];
        let mut seen = 0;
        for (slot, raw) in columns.iter_mut().zip(fields) {
            *slot = parse_field(path, label, raw)?;
            seen += 1;
        }
        if seen < 4 {
            return Err(parse_error(
                path,
                format!("cpu line {label:?} has only {seen} columns"),
            ));
        }

        let mut modes = [0u64; 8];
        modes.copy_from_slice(&columns[..8]);
        let mut guest = [0u64; 2];
        guest.copy_from_slice(&columns[8..]);
        cpus.push(CpuTimes {
            id: id.to_string(),
            modes,
            guest,
        });
    }
    Ok(cpus)
}
