// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;

use crate::probe::{Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const VMSTAT_PATH: &str = "vmstat";

pub struct VmstatProbe {
    path: PathBuf,
    fields: Regex,
}

impl VmstatProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            path: config.proc_path(VMSTAT_PATH),
            fields: Regex::new(&config.vmstat_fields)?,
        })
    }
}

#[async_trait]
impl Probe for VmstatProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        for line in contents.lines() {
            let Some((key, raw)) = line.split_once(' ') else {
                continue;
            };
            if !self.fields.is_match(key) {
                continue;
            }
            let value: f64 = parse_field(&self.path, key, raw)?;
            sink.emit(Sample::untyped(
                format!("node_vmstat_{key}"),
                format!("/proc/vmstat information field {key}."),
                value,
            ))?;
        }
        Ok(())
    }
}
