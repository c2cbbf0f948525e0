// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::probe::{Probe, ProbeError};
use crate::sample::{Sample, SampleSink};

#[derive(Debug, Default)]
pub struct TimeProbe;

impl TimeProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Probe for TimeProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ProbeError::Clock(e.to_string()))?;
        sink.emit(Sample::gauge(
            "node_time_seconds",
            "System time in seconds since epoch (1970).",
            now.as_secs_f64(),
        ))
    }
}
