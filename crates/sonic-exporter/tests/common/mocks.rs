// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock config store and probes for testing

use async_trait::async_trait;
use node_probes::{Probe, ProbeError, Sample, SampleSink};
use sonic_exporter::config_store::{keyspace_channel, ConfigChange, ConfigStore, CONFIG_DB};
use sonic_exporter::error::ExporterError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender};

/// In-memory config database. Writes through [`ConfigStore::set_field`] notify subscribers the
/// way Redis keyspace notifications do.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryConfigStore {
    records: Mutex<HashMap<String, HashMap<String, String>>>,
    subscribers: Mutex<Vec<(String, Sender<ConfigChange>)>>,
}

#[allow(dead_code)]
impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(key: &str, fields: &[(&str, &str)]) -> Self {
        let store = Self::new();
        store.insert(key, fields);
        store
    }

    /// Writes without notifying, like a record that exists before the exporter starts.
    pub fn insert(&self, key: &str, fields: &[(&str, &str)]) {
        let mut records = self.records.lock().unwrap();
        let record = records.entry(key.to_string()).or_default();
        for (field, value) in fields {
            record.insert(field.to_string(), value.to_string());
        }
    }

    pub fn record(&self, key: &str) -> HashMap<String, String> {
        self.records
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }

    pub fn notify(&self, key: &str, event: &str) {
        let subscribers = self.subscribers.lock().unwrap();
        for (subscribed_key, tx) in subscribers.iter() {
            if subscribed_key == key {
                let _ = tx.try_send(ConfigChange {
                    channel: keyspace_channel(CONFIG_DB, key),
                    event: event.to_string(),
                });
            }
        }
    }

    /// Drops every subscription, as if the store connection went away.
    pub fn close_subscriptions(&self) {
        self.subscribers.lock().unwrap().clear();
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, ExporterError> {
        Ok(self.record(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, ExporterError> {
        Ok(self.records.lock().unwrap().contains_key(key))
    }

    async fn set_field(&self, key: &str, field: &str, value: &str) -> Result<(), ExporterError> {
        self.insert(key, &[(field, value)]);
        self.notify(key, "hset");
        Ok(())
    }

    async fn subscribe(&self, key: &str) -> Result<Receiver<ConfigChange>, ExporterError> {
        let (tx, rx) = mpsc::channel(16);
        self.subscribers.lock().unwrap().push((key.to_string(), tx));
        Ok(rx)
    }
}

/// Config store whose connection always fails.
#[allow(dead_code)]
pub struct UnreachableConfigStore;

fn unreachable() -> ExporterError {
    ExporterError::ConfigStore(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl ConfigStore for UnreachableConfigStore {
    async fn get_all(&self, _key: &str) -> Result<HashMap<String, String>, ExporterError> {
        Err(unreachable())
    }

    async fn exists(&self, _key: &str) -> Result<bool, ExporterError> {
        Err(unreachable())
    }

    async fn set_field(&self, _key: &str, _field: &str, _value: &str) -> Result<(), ExporterError> {
        Err(unreachable())
    }

    async fn subscribe(&self, _key: &str) -> Result<Receiver<ConfigChange>, ExporterError> {
        Err(unreachable())
    }
}

/// Probe emitting `count` gauge samples `<metric>{seq="<n>"} n`.
#[allow(dead_code)]
pub struct CountingProbe {
    pub metric: &'static str,
    pub count: usize,
    pub delay: Duration,
}

#[allow(dead_code)]
impl CountingProbe {
    pub fn new(metric: &'static str, count: usize) -> Self {
        Self {
            metric,
            count,
            delay: Duration::ZERO,
        }
    }
}

#[async_trait]
impl Probe for CountingProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        tokio::time::sleep(self.delay).await;
        for seq in 0..self.count {
            sink.emit(
                Sample::gauge(self.metric, "Test samples.", seq as f64)
                    .with_label("seq", seq.to_string()),
            )?;
        }
        Ok(())
    }
}

/// Probe that always fails.
#[allow(dead_code)]
pub struct FailingProbe;

#[async_trait]
impl Probe for FailingProbe {
    async fn update(&self, _sink: &SampleSink) -> Result<(), ProbeError> {
        Err(ProbeError::Parse {
            path: "/proc/broken".into(),
            reason: "unexpected format".to_string(),
        })
    }
}

/// Probe that emits `count` samples of `metric` and then fails.
#[allow(dead_code)]
pub struct HalfDoneProbe {
    pub metric: &'static str,
    pub count: usize,
}

#[async_trait]
impl Probe for HalfDoneProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        for seq in 0..self.count {
            sink.emit(
                Sample::gauge(self.metric, "Test samples.", seq as f64)
                    .with_label("seq", seq.to_string()),
            )?;
        }
        Err(ProbeError::Parse {
            path: "/proc/truncated".into(),
            reason: "unexpected end of file".to_string(),
        })
    }
}
