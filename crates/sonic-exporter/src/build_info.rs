// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use prometheus::{IntGaugeVec, Opts};
use std::sync::OnceLock;

const BUILD_INFO_METRIC: &str = "sonic_exporter_build_info";
const BUILD_INFO_HELP: &str = "This info metric contains build information for about the exporter";
const BUILD_INFO_LABELS: [&str; 3] = ["exporter_version", "exporter_revision", "rust_version"];

/// Build metadata embedded by `build.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    pub revision: String,
    pub rust_version: String,
}

static BUILD_INFO: OnceLock<BuildInfo> = OnceLock::new();

pub fn build_info() -> &'static BuildInfo {
    BUILD_INFO.get_or_init(|| {
        BuildInfo::new(
            env!("SONIC_EXPORTER_VERSION"),
            env!("SONIC_EXPORTER_GIT_HASH"),
            env!("SONIC_EXPORTER_RUSTC_VERSION"),
        )
    })
}

impl BuildInfo {
    pub fn new(version: &str, revision: &str, rust_version: &str) -> Self {
        // release tags are "v1.2.3"
        let version = version.strip_prefix('v').unwrap_or(version);
        Self {
            version: version.to_string(),
            revision: revision.to_string(),
            rust_version: rust_version.to_string(),
        }
    }

    /// Constant `1` gauge carrying the build metadata as labels.
    pub fn gauge(&self) -> Result<IntGaugeVec, prometheus::Error> {
        let gauge = IntGaugeVec::new(
            Opts::new(BUILD_INFO_METRIC, BUILD_INFO_HELP),
            &BUILD_INFO_LABELS,
        )?;
        gauge
            .get_metric_with_label_values(&[
                self.version.as_str(),
                self.revision.as_str(),
                self.rust_version.as_str(),
            ])?
            .set(1);
        Ok(gauge)
    }
}
