// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Loads the exporter config and watches it for changes.
//!
//! The exporter never reconfigures itself in place. Any change to the config key ends the
//! process and the supervisor starts a fresh one that reads the new values.
//!
//! The subscription is opened after the initial load, so a write landing between the two is not
//! noticed until the next notification for the key.

use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use tracing::{info, warn};

use crate::config::{ExporterConfig, CONFIG_KEY};
use crate::config_store::{ConfigChange, ConfigStore};
use crate::error::ExporterError;

/// Why the running exporter has to make way for a new process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartReason {
    ConfigChanged(ConfigChange),
    /// The notification stream closed, so further changes could go unnoticed.
    SubscriptionLost,
}

pub struct ConfigWatcher {
    store: Arc<dyn ConfigStore>,
}

impl ConfigWatcher {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<ExporterConfig, ExporterError> {
        let record = self.store.get_all(CONFIG_KEY).await?;
        ExporterConfig::from_record(&record)
    }

    pub async fn subscribe(&self) -> Result<ChangeSubscription, ExporterError> {
        let changes = self.store.subscribe(CONFIG_KEY).await?;
        Ok(ChangeSubscription { changes })
    }
}

pub struct ChangeSubscription {
    changes: Receiver<ConfigChange>,
}

impl ChangeSubscription {
    /// Waits for the first notification on the config key.
    pub async fn wait_for_change(mut self) -> RestartReason {
        match self.changes.recv().await {
            Some(change) => {
                info!(
                    channel = %change.channel,
                    event = %change.event,
                    "Configuration change detected, restarting exporter..."
                );
                RestartReason::ConfigChanged(change)
            }
            None => {
                warn!("Configuration subscription lost, restarting exporter...");
                RestartReason::SubscriptionLost
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_first_notification_is_a_restart() {
        let (tx, changes) = mpsc::channel(4);
        let change = ConfigChange {
            channel: "__keyspace@4__:SONIC_EXPORTER|default".to_string(),
            event: "hset".to_string(),
        };
        tx.send(change.clone()).await.unwrap();

        let reason = ChangeSubscription { changes }.wait_for_change().await;
        assert_eq!(reason, RestartReason::ConfigChanged(change));
        assert!(logs_contain(
            "Configuration change detected, restarting exporter..."
        ));
        assert!(logs_contain("event=hset"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_closed_channel_is_a_restart() {
        let (tx, changes) = mpsc::channel::<ConfigChange>(1);
        drop(tx);

        let reason = ChangeSubscription { changes }.wait_for_change().await;
        assert_eq!(reason, RestartReason::SubscriptionLost);
        assert!(logs_contain("Configuration subscription lost"));
    }
}
