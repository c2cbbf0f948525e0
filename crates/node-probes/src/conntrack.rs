// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::probe::{KvLogger, Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const CONNTRACK_COUNT_PATH: &str = "sys/net/netfilter/nf_conntrack_count";
const CONNTRACK_MAX_PATH: &str = "sys/net/netfilter/nf_conntrack_max";

pub struct ConntrackProbe {
    count_path: PathBuf,
    max_path: PathBuf,
    logger: Arc<dyn KvLogger>,
}

impl ConntrackProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            count_path: config.proc_path(CONNTRACK_COUNT_PATH),
            max_path: config.proc_path(CONNTRACK_MAX_PATH),
            logger: Arc::clone(&config.logger),
        }
    }

    async fn read_value(&self, path: &Path) -> Result<f64, ProbeError> {
        match read_to_string(path).await {
            Ok(contents) => parse_field(path, "value", &contents),
            Err(ProbeError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                let path = path.display().to_string();
                self.logger.log(&[
                    ("level", "debug"),
                    ("msg", "conntrack probe found no data"),
                    ("path", path.as_str()),
                ]);
                Err(ProbeError::NoData(
                    "nf_conntrack module is not loaded".to_string(),
                ))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Probe for ConntrackProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let count = self.read_value(&self.count_path).await?;
        let max = self.read_value(&self.max_path).await?;

        sink.emit(Sample::gauge(
            "node_nf_conntrack_entries",
            "Number of currently allocated flow entries for connection tracking.",
            count,
        ))?;
        sink.emit(Sample::gauge(
            "node_nf_conntrack_entries_limit",
            "Maximum size of connection tracking table.",
            max,
        ))?;
        Ok(())
    }
}
