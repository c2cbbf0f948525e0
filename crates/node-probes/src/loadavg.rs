// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::path::PathBuf;

use crate::probe::{Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_error, parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const LOADAVG_PATH: &str = "loadavg"; // "0.52 0.58 0.59 2/1024 12345"

const LOAD_METRICS: [(&str, &str); 3] = [
    ("node_load1", "1m load average."),
    ("node_load5", "5m load average."),
    ("node_load15", "15m load average."),
];

pub struct LoadavgProbe {
    path: PathBuf,
}

impl LoadavgProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.proc_path(LOADAVG_PATH),
        }
    }
}

#[async_trait]
impl Probe for LoadavgProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        let fields: Vec<&str> = contents.split_whitespace().collect();
        if fields.len() < LOAD_METRICS.len() {
            return Err(parse_error(
                &self.path,
                format!("expected at least 3 fields, got {}", fields.len()),
            ));
        }

        for ((name, help), raw) in LOAD_METRICS.iter().zip(fields) {
            let value: f64 = parse_field(&self.path, name, raw)?;
            sink.emit(Sample::gauge(*name, *help, value))?;
        }
        Ok(())
    }
}
