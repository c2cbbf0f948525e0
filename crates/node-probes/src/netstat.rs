// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Protocol statistics from `/proc/net/netstat`, `/proc/net/snmp` and `/proc/net/snmp6`.

use async_trait::async_trait;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};

use crate::probe::{Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_error, parse_field, read_to_string};
use crate::sample::{Sample, SampleSink};

const NETSTAT_PATH: &str = "net/netstat";
const SNMP_PATH: &str = "net/snmp";
const SNMP6_PATH: &str = "net/snmp6";

pub struct NetStatProbe {
    netstat_path: PathBuf,
    snmp_path: PathBuf,
    snmp6_path: PathBuf,
    fields: Regex,
}

impl NetStatProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            netstat_path: config.proc_path(NETSTAT_PATH),
            snmp_path: config.proc_path(SNMP_PATH),
            snmp6_path: config.proc_path(SNMP6_PATH),
            fields: Regex::new(&config.netstat_fields)?,
        })
    }

    fn emit(
        &self,
        sink: &SampleSink,
        path: &Path,
        protocol: &str,
        field: &str,
        raw: &str,
    ) -> Result<(), ProbeError> {
        let key = format!("{protocol}_{field}");
        if !self.fields.is_match(&key) {
            return Ok(());
        }
        let value: f64 = parse_field(path, &key, raw)?;
        sink.emit(Sample::untyped(
            format!("node_netstat_{key}"),
            format!("Statistic {protocol}{field}."),
            value,
        ))
    }

    /// Header and value lines alternate, both starting with `<Protocol>:`.
    async fn update_paired(&self, sink: &SampleSink, path: &Path) -> Result<(), ProbeError> {
        let contents = read_to_string(path).await?;
        let mut lines = contents.lines().filter(|line| !line.trim().is_empty());
        while let Some(header) = lines.next() {
            let Some(values) = lines.next() else {
                return Err(parse_error(path, format!("no values for {header:?}")));
            };
            let (Some((protocol, names)), Some((values_protocol, values))) =
                (header.split_once(':'), values.split_once(':'))
            else {
                return Err(parse_error(path, format!("malformed line {header:?}")));
            };
            if protocol != values_protocol {
                return Err(parse_error(
                    path,
                    format!("{protocol} header followed by {values_protocol} values"),
                ));
            }
            let names: Vec<&str> = names.split_whitespace().collect();
            let values: Vec<&str> = values.split_whitespace().collect();
            if names.len() != values.len() {
                return Err(parse_error(
                    path,
                    format!(
                        "{protocol} has {} fields but {} values",
                        names.len(),
                        values.len()
                    ),
                ));
            }
            for (name, raw) in names.iter().zip(values) {
                self.emit(sink, path, protocol, name, raw)?;
            }
        }
        Ok(())
    }

    /// One `<Protocol6><Field> <value>` pair per line. Absent when IPv6 is disabled.
    async fn update_snmp6(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let path = &self.snmp6_path;
        let contents = match read_to_string(path).await {
            Ok(contents) => contents,
            Err(ProbeError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        for line in contents.lines() {
            let mut parts = line.split_whitespace();
            let (Some(key), Some(raw)) = (parts.next(), parts.next()) else {
                continue;
            };
            // "Ip6InReceives" is protocol "Ip6", field "InReceives"
            let Some(split) = key.find('6') else {
                continue;
            };
            let (protocol, field) = key.split_at(split + 1);
            self.emit(sink, path, protocol, field, raw)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for NetStatProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        self.update_paired(sink, &self.netstat_path).await?;
        self.update_paired(sink, &self.snmp_path).await?;
        self.update_snmp6(sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::fixture;
    use crate::sample::{drain, SampleKind};

    const NETSTAT: &str = "TcpExt: SyncookiesSent SyncookiesRecv ListenOverflows ListenDrops TCPTimeouts PruneCalled
TcpExt: 0 1 2 3 4 5
IpExt: InNoRoutes InOctets OutOctets
IpExt: 0 123456 654321
";

    const SNMP: &str = "Ip: Forwarding DefaultTTL InReceives InHdrErrors
Ip: 1 64 1000 2
Tcp: RtoAlgorithm MaxConn ActiveOpens CurrEstab InErrs
Tcp: 1 -1 77 12 3
Udp: InDatagrams NoPorts InErrors OutDatagrams
Udp: 10 2 0 11
";

    const SNMP6: &str = "Ip6InReceives                   	500
Ip6InOctets                     	9000
Icmp6InMsgs                     	4
Udp6NoPorts                     	1
";

    fn values(samples: &[Sample]) -> Vec<(&str, f64)> {
        samples.iter().map(|s| (s.name.as_str(), s.value)).collect()
    }

    #[tokio::test]
    async fn test_netstat_exports_selected_fields() {
        let (_dir, config) = fixture::procfs(&[
            ("net/netstat", NETSTAT),
            ("net/snmp", SNMP),
            ("net/snmp6", SNMP6),
        ]);
        let (sink, mut rx) = SampleSink::channel();

        NetStatProbe::new(&config).unwrap().update(&sink).await.unwrap();

        let samples = drain(&mut rx);
        assert_eq!(
            values(&samples),
            vec![
                ("node_netstat_TcpExt_SyncookiesSent", 0.0),
                ("node_netstat_TcpExt_SyncookiesRecv", 1.0),
                ("node_netstat_TcpExt_ListenOverflows", 2.0),
                ("node_netstat_TcpExt_ListenDrops", 3.0),
                ("node_netstat_TcpExt_TCPTimeouts", 4.0),
                ("node_netstat_IpExt_InOctets", 123_456.0),
                ("node_netstat_IpExt_OutOctets", 654_321.0),
                ("node_netstat_Ip_Forwarding", 1.0),
                ("node_netstat_Tcp_ActiveOpens", 77.0),
                ("node_netstat_Tcp_CurrEstab", 12.0),
                ("node_netstat_Tcp_InErrs", 3.0),
                ("node_netstat_Udp_InDatagrams", 10.0),
                ("node_netstat_Udp_NoPorts", 2.0),
                ("node_netstat_Udp_InErrors", 0.0),
                ("node_netstat_Udp_OutDatagrams", 11.0),
                ("node_netstat_Ip6_InOctets", 9000.0),
                ("node_netstat_Icmp6_InMsgs", 4.0),
                ("node_netstat_Udp6_NoPorts", 1.0),
            ]
        );
        assert!(samples.iter().all(|s| s.kind == SampleKind::Untyped));
        assert_eq!(samples[0].help, "Statistic TcpExtSyncookiesSent.");
    }

    #[tokio::test]
    async fn test_netstat_without_ipv6() {
        let (_dir, config) = fixture::procfs(&[("net/netstat", NETSTAT), ("net/snmp", SNMP)]);
        let (sink, mut rx) = SampleSink::channel();

        NetStatProbe::new(&config).unwrap().update(&sink).await.unwrap();

        let samples = drain(&mut rx);
        assert_eq!(samples.len(), 15);
        assert!(!samples.iter().any(|s| s.name.contains("6_")));
    }

    #[tokio::test]
    async fn test_netstat_mismatched_lines_are_parse_error() {
        let (_dir, config) = fixture::procfs(&[
            ("net/netstat", "TcpExt: A B\nTcpExt: 1\n"),
            ("net/snmp", SNMP),
        ]);
        let (sink, _rx) = SampleSink::channel();

        let err = NetStatProbe::new(&config)
            .unwrap()
            .update(&sink)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("TcpExt has 2 fields but 1 values"));
    }

    #[tokio::test]
    async fn test_netstat_missing_snmp_is_read_error() {
        let (_dir, config) = fixture::procfs(&[("net/netstat", NETSTAT)]);
        let (sink, _rx) = SampleSink::channel();

        let err = NetStatProbe::new(&config)
            .unwrap()
            .update(&sink)
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Read { .. }));
    }
}
