// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::probe::{KvLogger, Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const MEMINFO_PATH: &str = "meminfo";

pub struct MeminfoProbe {
    path: PathBuf,
    logger: Arc<dyn KvLogger>,
}

impl MeminfoProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.proc_path(MEMINFO_PATH),
            logger: Arc::clone(&config.logger),
        }
    }
}

#[async_trait]
impl Probe for MeminfoProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        for line in contents.lines() {
            let Some((key, rest)) = line.split_once(':') else {
                self.logger.log(&[
                    ("level", "debug"),
                    ("msg", "Skipping malformed meminfo line"),
                    ("line", line),
                ]);
                continue;
            };
            let mut parts = rest.split_whitespace();
            let Some(raw) = parts.next() else {
                continue;
            };
            let mut value: f64 = parse_field(&self.path, key, raw)?;

            // "Active(anon)" -> "Active_anon"
            let mut name = key.replace('(', "_").replace(')', "");
            if parts.next() == Some("kB") {
                value *= 1024.0;
                name.push_str("_bytes");
            }
            sink.emit(Sample::gauge(
                format!("node_memory_{name}"),
                format!("Memory information field {name}."),
                value,
            ))?;
        }
        Ok(())
    }
}
