// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fan-out/fan-in over the registered probes.
//!
//! Every collection cycle spawns one task per probe, each writing into a sink of its own. The cycle
//! ends only once every task has finished, whether it succeeded, failed or panicked. A failing
//! probe costs its own samples for that cycle and nothing else; it is tried again on the next
//! cycle.

use node_probes::{Probe, ProbeError, Sample, SampleSink};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::ExporterError;

/// The fixed set of probes, keyed by unique name. Immutable once handed to a [`NodeCollector`].
#[derive(Default)]
pub struct ProbeRegistry {
    probes: BTreeMap<String, Arc<dyn Probe>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_probes<I, N>(probes: I) -> Result<Self, ExporterError>
    where
        I: IntoIterator<Item = (N, Arc<dyn Probe>)>,
        N: Into<String>,
    {
        let mut registry = Self::new();
        for (name, probe) in probes {
            registry.register(name, probe)?;
        }
        Ok(registry)
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        probe: Arc<dyn Probe>,
    ) -> Result<(), ExporterError> {
        let name = name.into();
        if self.probes.contains_key(&name) {
            return Err(ExporterError::DuplicateProbe(name));
        }
        self.probes.insert(name, probe);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.probes.keys().map(String::as_str)
    }
}

#[derive(Clone)]
pub struct NodeCollector {
    registry: Arc<ProbeRegistry>,
}

impl NodeCollector {
    pub fn new(registry: ProbeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    /// Runs one collection cycle over every registered probe.
    ///
    /// Samples of one probe keep their emission order. Samples of different probes interleave in
    /// no particular order. A probe that fails or panics contributes nothing, including the
    /// samples it emitted before failing.
    pub async fn collect(&self) -> Vec<Sample> {
        let updates: Vec<(&str, JoinHandle<Result<Vec<Sample>, ProbeError>>)> = self
            .registry
            .probes
            .iter()
            .map(|(name, probe)| {
                let probe = Arc::clone(probe);
                let handle = tokio::spawn(async move { run_probe(probe.as_ref()).await });
                (name.as_str(), handle)
            })
            .collect();

        let mut samples = Vec::new();
        for (name, handle) in updates {
            match handle.await {
                Ok(Ok(emitted)) => samples.extend(emitted),
                Ok(Err(err)) if err.is_no_data() => debug!("{name} returned no data: {err}"),
                Ok(Err(err)) => error!("{name} failed: {err}"),
                Err(err) => error!("{name} failed: {err}"),
            }
        }
        samples
    }
}

/// Runs one probe against a sink of its own and hands back its samples once it succeeded.
async fn run_probe(probe: &dyn Probe) -> Result<Vec<Sample>, ProbeError> {
    let (sink, mut samples_rx) = SampleSink::channel();
    probe.update(&sink).await?;
    drop(sink);

    let mut samples = Vec::new();
    while let Ok(sample) = samples_rx.try_recv() {
        samples.push(sample);
    }
    Ok(samples)
}
