// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::config_store::DEFAULT_REDIS_SOCKET;
use crate::error::ExporterError;

const LOG_LEVEL_ENV: &str = "SONIC_EXPORTER_LOG_LEVEL";
const SYSLOG_ADDR_ENV: &str = "SONIC_EXPORTER_SYSLOG_ADDR";
const REDIS_SOCKET_ENV: &str = "SONIC_EXPORTER_REDIS_SOCKET";
const PROCFS_ENV: &str = "SONIC_EXPORTER_PROCFS";
const SYSFS_ENV: &str = "SONIC_EXPORTER_SYSFS";

const DEFAULT_SYSLOG_ADDR: &str = "127.0.0.1:514";
const SYSLOG_OFF: &str = "off";

/// Process settings taken from the environment. Port and VRF live in the config database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    /// rsyslog UDP receiver, `None` when syslog forwarding is off
    pub syslog_addr: Option<SocketAddr>,
    pub redis_socket: PathBuf,
    pub procfs: PathBuf,
    pub sysfs: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            syslog_addr: DEFAULT_SYSLOG_ADDR.parse().ok(),
            redis_socket: PathBuf::from(DEFAULT_REDIS_SOCKET),
            procfs: PathBuf::from("/proc"),
            sysfs: PathBuf::from("/sys"),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ExporterError> {
        let defaults = Self::default();
        let log_level = env::var(LOG_LEVEL_ENV)
            .map(|val| val.to_lowercase())
            .unwrap_or(defaults.log_level);
        let syslog_addr = match env::var(SYSLOG_ADDR_ENV) {
            Ok(val) => parse_syslog_addr(&val)?,
            Err(_) => defaults.syslog_addr,
        };
        let redis_socket = env::var(REDIS_SOCKET_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.redis_socket);
        let procfs = env::var(PROCFS_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.procfs);
        let sysfs = env::var(SYSFS_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.sysfs);

        let settings = Self {
            log_level,
            syslog_addr,
            redis_socket,
            procfs,
            sysfs,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ExporterError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.log_level.as_str()) {
            return Err(ExporterError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }
        if self.redis_socket.as_os_str().is_empty() {
            return Err(ExporterError::InvalidConfig(format!(
                "{REDIS_SOCKET_ENV} cannot be empty"
            )));
        }
        if self.procfs.as_os_str().is_empty() {
            return Err(ExporterError::InvalidConfig(format!(
                "{PROCFS_ENV} cannot be empty"
            )));
        }
        if self.sysfs.as_os_str().is_empty() {
            return Err(ExporterError::InvalidConfig(format!(
                "{SYSFS_ENV} cannot be empty"
            )));
        }
        Ok(())
    }
}

fn parse_syslog_addr(value: &str) -> Result<Option<SocketAddr>, ExporterError> {
    if value.eq_ignore_ascii_case(SYSLOG_OFF) {
        return Ok(None);
    }
    value.parse().map(Some).map_err(|_| {
        ExporterError::InvalidConfig(format!(
            "Invalid syslog address '{value}'. Expected <ip>:<port> or '{SYSLOG_OFF}'"
        ))
    })
}
