// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Block device I/O statistics from `/proc/diskstats`.

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;

use crate::probe::{Probe, ProbeConfig, ProbeError};
use crate::procfs::{parse_error, parse_field, read_to_string};
use crate::sample::{Sample, SampleKind, SampleSink};

const DISKSTATS_PATH: &str = "diskstats";

/// major, minor and device name precede the counters
const ID_COLUMNS: usize = 3;
const MIN_COUNTERS: usize = 11;

#[derive(Clone, Copy)]
enum Unit {
    Count,
    // always 512 bytes in this file, whatever the device's sector size
    Sectors,
    Millis,
}

impl Unit {
    fn apply(self, raw: f64) -> f64 {
        match self {
            Unit::Count => raw,
            Unit::Sectors => raw * 512.0,
            Unit::Millis => raw / 1000.0,
        }
    }
}

struct Column {
    name: &'static str,
    help: &'static str,
    kind: SampleKind,
    unit: Unit,
}

const fn counter(name: &'static str, help: &'static str, unit: Unit) -> Column {
    Column {
        name,
        help,
        kind: SampleKind::Counter,
        unit,
    }
}

/// Counter columns in kernel order. Kernels 4.18+ append the discard block, 5.5+ the flush one.
const COLUMNS: [Column; 17] = [
    counter("node_disk_reads_completed_total", "The total number of reads completed successfully.", Unit::Count),
    counter("node_disk_reads_merged_total", "The total number of reads merged.", Unit::Count),
    counter("node_disk_read_bytes_total", "The total number of bytes read successfully.", Unit::Sectors),
    counter("node_disk_read_time_seconds_total", "The total number of seconds spent by all reads.", Unit::Millis),
    counter("node_disk_writes_completed_total", "The total number of writes completed successfully.", Unit::Count),
    counter("node_disk_writes_merged_total", "The number of writes merged.", Unit::Count),
    counter("node_disk_written_bytes_total", "The total number of bytes written successfully.", Unit::Sectors),
    counter("node_disk_write_time_seconds_total", "This is the total number of seconds spent by all writes.", Unit::Millis),
    Column {
        name: "node_disk_io_now",
        help: "The number of I/Os currently in progress.",
        kind: SampleKind::Gauge,
        unit: Unit::Count,
    },
    counter("node_disk_io_time_seconds_total", "Total seconds spent doing I/Os.", Unit::Millis),
    counter("node_disk_io_time_weighted_seconds_total", "The weighted number of seconds spent doing I/Os.", Unit::Millis),
    counter("node_disk_discards_completed_total", "The total number of discards completed successfully.", Unit::Count),
    counter("node_disk_discards_merged_total", "The total number of discards merged.", Unit::Count),
    counter("node_disk_discarded_sectors_total", "The total number of sectors discarded successfully.", Unit::Count),
    counter("node_disk_discard_time_seconds_total", "This is the total number of seconds spent by all discards.", Unit::Millis),
    counter("node_disk_flush_requests_total", "The total number of flush requests completed successfully.", Unit::Count),
    counter("node_disk_flush_requests_time_seconds_total", "This is the total number of seconds spent by all flush requests.", Unit::Millis),
];

pub struct DiskstatsProbe {
    path: PathBuf,
    exclude: Regex,
}

impl DiskstatsProbe {
    pub fn new(config: &ProbeConfig) -> Result<Self, ProbeError> {
        Ok(Self {
            path: config.proc_path(DISKSTATS_PATH),
            exclude: Regex::new(&config.disk_device_exclude)?,
        })
    }
}

#[async_trait]
impl Probe for DiskstatsProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let contents = read_to_string(&self.path).await?;
        for line in contents.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < ID_COLUMNS + MIN_COUNTERS {
                return Err(parse_error(
                    &self.path,
                    format!("line {line:?} has {} fields", fields.len()),
                ));
            }
            let device = fields[2];
            if self.exclude.is_match(device) {
                continue;
            }

            for (column, raw) in COLUMNS.iter().zip(&fields[ID_COLUMNS..]) {
                let value: f64 = parse_field(&self.path, column.name, raw)?;
                sink.emit(
                    Sample::new(column.kind, column.name, column.help, column.unit.apply(value))
                        .with_label("device", device),
                )?;
            }
        }
        Ok(())
    }
}
