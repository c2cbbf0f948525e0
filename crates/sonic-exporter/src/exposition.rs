// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Prometheus text exposition of one collection cycle.
//!
//! The output is the families of the exporter's own registry (build info, process metrics)
//! followed by the samples collected from the probes, grouped into families by metric name.
//! The text encoder has no untyped support, so untyped samples are exposed as gauges.

use node_probes::{Sample, SampleKind};
use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, Registry, TextEncoder};
use std::collections::{HashMap, HashSet};

use crate::aggregator::NodeCollector;
use crate::build_info::BuildInfo;
use crate::error::{ExporterError, ExpositionError};

pub const CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

pub struct Exposition {
    registry: Registry,
    collector: NodeCollector,
}

impl Exposition {
    pub fn new(collector: NodeCollector, build_info: &BuildInfo) -> Result<Self, ExporterError> {
        let registry = Registry::new();
        registry.register(Box::new(build_info.gauge()?))?;
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;
        Ok(Self {
            registry,
            collector,
        })
    }

    /// Runs one collection cycle and encodes it together with the registry's families.
    pub async fn render(&self) -> Result<Vec<u8>, ExpositionError> {
        let samples = self.collector.collect().await;
        encode(self.registry.gather(), samples)
    }
}

struct FamilyBuilder {
    family: MetricFamily,
    kind: SampleKind,
    label_sets: HashSet<Vec<(String, String)>>,
}

impl FamilyBuilder {
    fn new(sample: &Sample) -> Self {
        let mut family = MetricFamily::default();
        family.set_name(sample.name.clone());
        family.set_help(sample.help.clone());
        family.set_field_type(metric_type(sample.kind));
        Self {
            family,
            kind: sample.kind,
            label_sets: HashSet::new(),
        }
    }

    fn push(&mut self, sample: Sample) -> Result<(), ExpositionError> {
        if sample.kind != self.kind {
            return Err(collision(&sample.name, "types"));
        }
        if sample.help != self.family.get_help() {
            return Err(collision(&sample.name, "help texts"));
        }
        let mut label_set = sample.labels.clone();
        label_set.sort();
        if !self.label_sets.insert(label_set) {
            return Err(collision(&sample.name, "samples for one label set"));
        }
        self.family.mut_metric().push(to_metric(sample));
        Ok(())
    }
}

/// Encodes `registered` followed by `samples` in the Prometheus text format.
///
/// Samples sharing a name must agree on type and help, and must differ in their label sets. A
/// sample may not reuse the name of a registered family.
pub fn encode(
    registered: Vec<MetricFamily>,
    samples: Vec<Sample>,
) -> Result<Vec<u8>, ExpositionError> {
    let reserved: HashSet<String> = registered
        .iter()
        .map(|f| f.get_name().to_string())
        .collect();

    let mut builders: Vec<FamilyBuilder> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for sample in samples {
        if reserved.contains(&sample.name) {
            return Err(collision(&sample.name, "sources"));
        }
        let slot = match index.get(&sample.name) {
            Some(slot) => *slot,
            None => {
                builders.push(FamilyBuilder::new(&sample));
                index.insert(sample.name.clone(), builders.len() - 1);
                builders.len() - 1
            }
        };
        builders[slot].push(sample)?;
    }

    let mut families = registered;
    families.extend(builders.into_iter().map(|b| b.family));

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    Ok(buffer)
}

fn collision(name: &str, conflict: &str) -> ExpositionError {
    ExpositionError::Collision {
        name: name.to_string(),
        conflict: conflict.to_string(),
    }
}

fn metric_type(kind: SampleKind) -> MetricType {
    match kind {
        SampleKind::Counter => MetricType::COUNTER,
        SampleKind::Gauge | SampleKind::Untyped => MetricType::GAUGE,
    }
}

fn to_metric(sample: Sample) -> Metric {
    let labels: Vec<LabelPair> = sample
        .labels
        .into_iter()
        .map(|(name, value)| {
            let mut pair = LabelPair::default();
            pair.set_name(name);
            pair.set_value(value);
            pair
        })
        .collect();

    let mut metric = Metric::default();
    metric.set_label(labels);
    match sample.kind {
        SampleKind::Counter => {
            let mut counter = Counter::default();
            counter.set_value(sample.value);
            metric.set_counter(counter);
        }
        SampleKind::Gauge | SampleKind::Untyped => {
            let mut gauge = Gauge::default();
            gauge.set_value(sample.value);
            metric.set_gauge(gauge);
        }
    }
    if let Some(timestamp_ms) = sample.timestamp_ms {
        metric.set_timestamp_ms(timestamp_ms);
    }
    metric
}
