// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Host telemetry probes.
//!
//! Each probe gathers one category of node metrics (CPU, memory, network devices, ...) from
//! procfs or sysfs and writes them as [`sample::Sample`]s into a [`sample::SampleSink`]. Probes share no
//! mutable state with each other, so a caller is free to run all of them concurrently.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;

pub mod conntrack;
pub mod cpu;
pub mod diskstats;
pub mod hwmon;
pub mod loadavg;
pub mod meminfo;
pub mod netdev;
pub mod netstat;
pub mod probe;
pub mod sample;
pub mod stat;
pub mod time;
pub mod vmstat;

mod procfs;

pub use probe::{DiscardLogger, KvLogger, Probe, ProbeConfig, ProbeError};
pub use sample::{Sample, SampleKind, SampleSink};

/// The probe set enabled on a SONiC switch, keyed by probe name.
///
/// `netclass` is left out on purpose: reading `/sys/class/net/<port>/carrier` fails with EINVAL
/// for front panel ports that are administratively down.
pub fn default_probes(
    config: &ProbeConfig,
) -> Result<Vec<(&'static str, Arc<dyn Probe>)>, ProbeError> {
    Ok(vec![
        ("conntrack", Arc::new(conntrack::ConntrackProbe::new(config)) as Arc<dyn Probe>),
        ("cpu", Arc::new(cpu::CpuProbe::new(config)) as Arc<dyn Probe>),
        ("diskstats", Arc::new(diskstats::DiskstatsProbe::new(config)?) as Arc<dyn Probe>),
        ("hwmon", Arc::new(hwmon::HwmonProbe::new(config)) as Arc<dyn Probe>),
        ("loadavg", Arc::new(loadavg::LoadavgProbe::new(config)) as Arc<dyn Probe>),
        ("meminfo", Arc::new(meminfo::MeminfoProbe::new(config)) as Arc<dyn Probe>),
        ("netdev", Arc::new(netdev::NetDevProbe::new(config)) as Arc<dyn Probe>),
        ("netstat", Arc::new(netstat::NetStatProbe::new(config)?) as Arc<dyn Probe>),
        ("stat", Arc::new(stat::StatProbe::new(config)) as Arc<dyn Probe>),
        ("time", Arc::new(time::TimeProbe::new()) as Arc<dyn Probe>),
        ("vmstat", Arc::new(vmstat::VmstatProbe::new(config)?) as Arc<dyn Probe>),
    ])
}
