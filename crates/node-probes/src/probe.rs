// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::sample::SampleSink;

const DEFAULT_PROCFS_ROOT: &str = "/proc";
const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Block devices left out of the disk statistics: ramdisks, loop devices and partitions.
pub const DEFAULT_DISK_DEVICE_EXCLUDE: &str =
    "^(ram|loop|fd|(h|s|v|xv)d[a-z]|nvme[0-9]+n[0-9]+p)[0-9]+$";
pub const DEFAULT_NETSTAT_FIELDS: &str = "^(.*_(InErrors|InErrs)|Ip_Forwarding|Ip(6|Ext)_(InOctets|OutOctets)|Icmp6?_(InMsgs|OutMsgs)|TcpExt_(Listen.*|Syncookies.*|TCPSynRetrans|TCPTimeouts)|Tcp_(ActiveOpens|InSegs|OutSegs|OutRsts|PassiveOpens|RetransSegs|CurrEstab)|Udp6?_(InDatagrams|OutDatagrams|NoPorts|RcvbufErrors|SndbufErrors))$";
pub const DEFAULT_VMSTAT_FIELDS: &str = "^(oom_kill|pgpg|pswp|pg.*fault).*";

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    /// The data source does not exist on this host, e.g. a kernel module that is not loaded.
    #[error("no data: {0}")]
    NoData(String),

    #[error("system clock error: {0}")]
    Clock(String),

    #[error("sample sink closed")]
    SinkClosed,

    #[error("invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),
}

impl ProbeError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ProbeError::NoData(_))
    }
}

/// Key/value logger used by probes.
///
/// A record is a flat list of pairs where `msg` carries the message
/// and `level` the severity. Everything else is an arbitrary field.
pub trait KvLogger: Send + Sync {
    fn log(&self, keyvals: &[(&str, &str)]);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardLogger;

impl KvLogger for DiscardLogger {
    fn log(&self, _keyvals: &[(&str, &str)]) {}
}

/// Settings shared by every probe constructor.
#[derive(Clone)]
pub struct ProbeConfig {
    /// Mount point of procfs, `/proc` on a real host.
    pub procfs: PathBuf,
    /// Mount point of sysfs, `/sys` on a real host.
    pub sysfs: PathBuf,
    pub logger: Arc<dyn KvLogger>,
    /// Regex of block device names to skip.
    pub disk_device_exclude: String,
    /// Regex of `<Protocol>_<Field>` netstat names to export.
    pub netstat_fields: String,
    /// Regex of `/proc/vmstat` keys to export.
    pub vmstat_fields: String,
}

impl ProbeConfig {
    pub fn new(procfs: impl Into<PathBuf>, logger: Arc<dyn KvLogger>) -> Self {
        Self {
            procfs: procfs.into(),
            sysfs: PathBuf::from(DEFAULT_SYSFS_ROOT),
            logger,
            disk_device_exclude: DEFAULT_DISK_DEVICE_EXCLUDE.to_string(),
            netstat_fields: DEFAULT_NETSTAT_FIELDS.to_string(),
            vmstat_fields: DEFAULT_VMSTAT_FIELDS.to_string(),
        }
    }

    pub fn with_sysfs(mut self, sysfs: impl Into<PathBuf>) -> Self {
        self.sysfs = sysfs.into();
        self
    }

    pub fn proc_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.procfs.join(relative)
    }

    pub fn sys_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.sysfs.join(relative)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PROCFS_ROOT, Arc::new(DiscardLogger))
    }
}

impl fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("procfs", &self.procfs)
            .field("sysfs", &self.sysfs)
            .field("disk_device_exclude", &self.disk_device_exclude)
            .field("netstat_fields", &self.netstat_fields)
            .field("vmstat_fields", &self.vmstat_fields)
            .finish_non_exhaustive()
    }
}

/// One independent unit of telemetry collection.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Writes the current samples of this probe into `sink`.
    ///
    /// When this returns an error the collector discards every sample of the call, including
    /// the ones already emitted.
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proc_path_joins_relative_to_root() {
        let config = ProbeConfig::new("/host/proc", Arc::new(DiscardLogger));
        assert_eq!(
            config.proc_path("net/dev"),
            PathBuf::from("/host/proc/net/dev")
        );
    }

    #[test]
    fn test_default_roots() {
        let config = ProbeConfig::default();
        assert_eq!(config.procfs, PathBuf::from("/proc"));
        assert_eq!(config.sysfs, PathBuf::from("/sys"));
        assert_eq!(
            config.with_sysfs("/host/sys").sys_path("class/hwmon"),
            PathBuf::from("/host/sys/class/hwmon")
        );
    }

    #[test]
    fn test_error_display() {
        let err = ProbeError::Parse {
            path: PathBuf::from("/proc/loadavg"),
            reason: "expected 3 fields".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse /proc/loadavg: expected 3 fields"
        );
        assert!(!err.is_no_data());
        assert!(ProbeError::NoData("x".to_string()).is_no_data());
    }
}
