// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Access to the SONiC config database.
//!
//! The config database is Redis database 4, reached over the local unix socket. Redis keyspace
//! notifications are enabled on SONiC, so every write to a key is announced on
//! `__keyspace@4__:<key>` with the command name (`hset`, `del`, ...) as payload.

use async_trait::async_trait;
use redis::{AsyncCommands, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, Receiver};
use tokio_stream::StreamExt;
use tracing::debug;

use crate::error::ExporterError;

pub const DEFAULT_REDIS_SOCKET: &str = "/var/run/redis/redis.sock";
pub const CONFIG_DB: u8 = 4;

const CHANGE_CHANNEL_BUFFER_SIZE: usize = 16;

/// A keyspace notification for a watched key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    pub channel: String,
    /// The command that touched the key, e.g. `hset`.
    pub event: String,
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reads every field of the hash stored at `key`. A missing key reads as an empty hash.
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, ExporterError>;

    async fn exists(&self, key: &str) -> Result<bool, ExporterError>;

    async fn set_field(&self, key: &str, field: &str, value: &str) -> Result<(), ExporterError>;

    /// Subscribes to change notifications for `key`.
    ///
    /// The receiver yields one [`ConfigChange`] per notification and is closed when the
    /// subscription is lost.
    async fn subscribe(&self, key: &str) -> Result<Receiver<ConfigChange>, ExporterError>;
}

pub struct RedisConfigStore {
    client: redis::Client,
    db: u8,
}

impl RedisConfigStore {
    pub fn open(socket_path: impl Into<PathBuf>, db: u8) -> Result<Self, ExporterError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Unix(socket_path.into()),
            redis: RedisConnectionInfo {
                db: i64::from(db),
                ..Default::default()
            },
        };
        Ok(Self {
            client: redis::Client::open(info)?,
            db,
        })
    }

    pub fn keyspace_channel(&self, key: &str) -> String {
        keyspace_channel(self.db, key)
    }
}

pub fn keyspace_channel(db: u8, key: &str) -> String {
    format!("__keyspace@{db}__:{key}")
}

#[async_trait]
impl ConfigStore for RedisConfigStore {
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, ExporterError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let record: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(record)
    }

    async fn exists(&self, key: &str) -> Result<bool, ExporterError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn set_field(&self, key: &str, field: &str, value: &str) -> Result<(), ExporterError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.hset(key, field, value).await?;
        Ok(())
    }

    async fn subscribe(&self, key: &str) -> Result<Receiver<ConfigChange>, ExporterError> {
        let pattern = self.keyspace_channel(key);
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.psubscribe(&pattern).await?;
        debug!("Subscribed to {pattern}");

        let (tx, rx) = mpsc::channel(CHANGE_CHANNEL_BUFFER_SIZE);
        tokio::spawn(async move {
            let messages = pubsub.on_message();
            tokio::pin!(messages);
            while let Some(msg) = messages.next().await {
                let change = ConfigChange {
                    channel: msg.get_channel_name().to_string(),
                    event: msg.get_payload::<String>().unwrap_or_default(),
                };
                if tx.send(change).await.is_err() {
                    break;
                }
            }
            debug!("Subscription to {pattern} ended");
        });
        Ok(rx)
    }
}
