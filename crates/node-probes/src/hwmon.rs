// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hardware sensors exposed under `/sys/class/hwmon`.
//!
//! Each `hwmonN` directory is one chip. Sensor attributes are named `<type><index>_<property>` and
//! live either in the chip directory or, on older kernels, in its `device` directory.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::probe::{KvLogger, Probe, ProbeConfig, ProbeError};
use crate::sample::{Sample, SampleSink};

const HWMON_PATH: &str = "class/hwmon";

struct SensorType {
    prefix: &'static str,
    unit: &'static str,
    /// sysfs reports milli- or micro-units
    divisor: f64,
    help: &'static str,
}

static SENSOR_TYPES: [SensorType; 5] = [
    SensorType {
        prefix: "temp",
        unit: "celsius",
        divisor: 1000.0,
        help: "Hardware monitor for temperature",
    },
    SensorType {
        prefix: "fan",
        unit: "rpm",
        divisor: 1.0,
        help: "Hardware monitor for fan revolutions per minute",
    },
    SensorType {
        prefix: "in",
        unit: "volts",
        divisor: 1000.0,
        help: "Hardware monitor for voltage",
    },
    SensorType {
        prefix: "curr",
        unit: "amps",
        divisor: 1000.0,
        help: "Hardware monitor for current",
    },
    SensorType {
        prefix: "power",
        unit: "watt",
        divisor: 1_000_000.0,
        help: "Hardware monitor for power usage",
    },
];

const PROPERTIES: [&str; 5] = ["input", "min", "max", "crit", "average"];
const LABEL_PROPERTY: &str = "label";

pub struct HwmonProbe {
    path: PathBuf,
    logger: Arc<dyn KvLogger>,
}

impl HwmonProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            path: config.sys_path(HWMON_PATH),
            logger: Arc::clone(&config.logger),
        }
    }

    /// Some drivers fail reads of sensors that are not wired up. Those files are skipped.
    async fn read_attribute(&self, path: &Path) -> Option<String> {
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Some(contents.trim().to_string()),
            Err(err) => {
                let path = path.display().to_string();
                let err = err.to_string();
                self.logger.log(&[
                    ("level", "debug"),
                    ("msg", "skipping unreadable hwmon attribute"),
                    ("path", path.as_str()),
                    ("err", err.as_str()),
                ]);
                None
            }
        }
    }

    async fn update_chip(
        &self,
        sink: &SampleSink,
        dir: &Path,
        entry: &str,
    ) -> Result<(), ProbeError> {
        let chip = chip_id(dir, entry).await;

        if let Some(name) = self.read_attribute(&dir.join("name")).await {
            sink.emit(
                Sample::gauge(
                    "node_hwmon_chip_names",
                    "Annotation metric for human-readable chip names",
                    1.0,
                )
                .with_label("chip", &chip)
                .with_label("chip_name", name),
            )?;
        }

        let mut seen = HashSet::new();
        for sensor_dir in [dir.to_path_buf(), dir.join("device")] {
            let Ok(files) = list_dir(&sensor_dir).await else {
                continue;
            };
            for file in files {
                let Some((sensor_type, sensor, property)) = parse_attribute(&file) else {
                    continue;
                };
                if !seen.insert(file.clone()) {
                    continue;
                }
                if property != LABEL_PROPERTY && !PROPERTIES.contains(&property) {
                    continue;
                }
                let Some(raw) = self.read_attribute(&sensor_dir.join(&file)).await else {
                    continue;
                };

                if property == LABEL_PROPERTY {
                    sink.emit(
                        Sample::gauge(
                            "node_hwmon_sensor_label",
                            "Label for given chip and sensor",
                            1.0,
                        )
                        .with_label("chip", &chip)
                        .with_label("sensor", sensor)
                        .with_label("label", raw),
                    )?;
                    continue;
                }

                let Ok(value) = raw.parse::<f64>() else {
                    self.logger.log(&[
                        ("level", "debug"),
                        ("msg", "skipping non-numeric hwmon attribute"),
                        ("file", file.as_str()),
                        ("value", raw.as_str()),
                    ]);
                    continue;
                };
                sink.emit(
                    Sample::gauge(
                        metric_name(sensor_type, property),
                        format!("{} ({property}).", sensor_type.help),
                        value / sensor_type.divisor,
                    )
                    .with_label("chip", &chip)
                    .with_label("sensor", sensor),
                )?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Probe for HwmonProbe {
    async fn update(&self, sink: &SampleSink) -> Result<(), ProbeError> {
        let chips = match list_dir(&self.path).await {
            Ok(chips) => chips,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                return Err(ProbeError::NoData(format!(
                    "{} does not exist",
                    self.path.display()
                )));
            }
            Err(source) => {
                return Err(ProbeError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        for entry in chips {
            self.update_chip(sink, &self.path.join(&entry), &entry)
                .await?;
        }
        Ok(())
    }
}

/// Sorted file names of a directory.
async fn list_dir(path: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Splits `temp1_input` into its sensor type, `temp1` and `input`.
fn parse_attribute(file: &str) -> Option<(&'static SensorType, &str, &str)> {
    let (sensor, property) = file.split_once('_')?;
    let digits = sensor.find(|c: char| c.is_ascii_digit())?;
    let (prefix, index) = sensor.split_at(digits);
    if !index.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let sensor_type = SENSOR_TYPES.iter().find(|t| t.prefix == prefix)?;
    Some((sensor_type, sensor, property))
}

fn metric_name(sensor_type: &SensorType, property: &str) -> String {
    if property == "input" {
        format!("node_hwmon_{}_{}", sensor_type.prefix, sensor_type.unit)
    } else {
        format!(
            "node_hwmon_{}_{property}_{}",
            sensor_type.prefix, sensor_type.unit
        )
    }
}

/// Stable chip identifier built from the bus and name of the backing device, e.g.
/// `platform_coretemp_0`. Falls back to the `hwmonN` entry name.
async fn chip_id(dir: &Path, entry: &str) -> String {
    if let Ok(device) = tokio::fs::canonicalize(dir.join("device")).await {
        let name = device
            .file_name()
            .map(|n| clean(&n.to_string_lossy()))
            .unwrap_or_default();
        let bus = device
            .parent()
            .and_then(Path::file_name)
            .map(|n| clean(&n.to_string_lossy()))
            .unwrap_or_default();
        if !name.is_empty() {
            return if bus.is_empty() {
                name
            } else {
                format!("{bus}_{name}")
            };
        }
    }
    clean(entry)
}

fn clean(raw: &str) -> String {
    let cleaned: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ':' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procfs::fixture;
    use crate::sample::drain;
    use std::fs;
    use std::os::unix::fs::symlink;

    fn find<'a>(samples: &'a [Sample], name: &str, sensor: &str) -> Option<&'a Sample> {
        samples
            .iter()
            .find(|s| s.name == name && s.label("sensor") == Some(sensor))
    }

    #[tokio::test]
    async fn test_hwmon_reads_chips_and_sensors() {
        let (dir, config) = fixture::sysfs(&[
            ("class/hwmon/hwmon0/name", "coretemp\n"),
            ("class/hwmon/hwmon0/temp1_input", "45000\n"),
            ("class/hwmon/hwmon0/temp1_max", "84000\n"),
            ("class/hwmon/hwmon0/temp1_crit", "100000\n"),
            ("class/hwmon/hwmon0/temp1_crit_alarm", "0\n"),
            ("class/hwmon/hwmon0/temp1_label", "Package id 0\n"),
            ("devices/platform/coretemp.0/uevent", ""),
            ("class/hwmon/hwmon1/name", "nct6775\n"),
            ("class/hwmon/hwmon1/in0_input", "1024\n"),
            ("class/hwmon/hwmon1/power1_input", "12500000\n"),
            ("devices/platform/nct6775.656/fan1_input", "1200\n"),
        ]);
        let root = dir.path();
        symlink(
            root.join("devices/platform/coretemp.0"),
            root.join("class/hwmon/hwmon0/device"),
        )
        .unwrap();
        symlink(
            root.join("devices/platform/nct6775.656"),
            root.join("class/hwmon/hwmon1/device"),
        )
        .unwrap();
        let (sink, mut rx) = SampleSink::channel();

        HwmonProbe::new(&config).update(&sink).await.unwrap();

        let samples = drain(&mut rx);
        let chips: Vec<(&str, &str)> = samples
            .iter()
            .filter(|s| s.name == "node_hwmon_chip_names")
            .map(|s| (s.label("chip").unwrap(), s.label("chip_name").unwrap()))
            .collect();
        assert_eq!(
            chips,
            vec![
                ("platform_coretemp_0", "coretemp"),
                ("platform_nct6775_656", "nct6775")
            ]
        );

        let temp = find(&samples, "node_hwmon_temp_celsius", "temp1").unwrap();
        assert_eq!(temp.value, 45.0);
        assert_eq!(temp.label("chip"), Some("platform_coretemp_0"));
        assert_eq!(find(&samples, "node_hwmon_temp_max_celsius", "temp1").unwrap().value, 84.0);
        assert_eq!(find(&samples, "node_hwmon_temp_crit_celsius", "temp1").unwrap().value, 100.0);
        assert!(!samples.iter().any(|s| s.name.contains("alarm")));

        let label = find(&samples, "node_hwmon_sensor_label", "temp1").unwrap();
        assert_eq!(label.label("label"), Some("Package id 0"));

        assert_eq!(find(&samples, "node_hwmon_in_volts", "in0").unwrap().value, 1.024);
        assert_eq!(find(&samples, "node_hwmon_power_watt", "power1").unwrap().value, 12.5);
        let fan = find(&samples, "node_hwmon_fan_rpm", "fan1").unwrap();
        assert_eq!(fan.value, 1200.0);
        assert_eq!(fan.label("chip"), Some("platform_nct6775_656"));
    }

    #[tokio::test]
    async fn test_hwmon_skips_bad_attributes_and_falls_back_to_entry_name() {
        let (dir, config) = fixture::sysfs(&[
            ("class/hwmon/hwmon3/temp1_input", "not a number\n"),
            ("class/hwmon/hwmon3/temp2_input", "30500\n"),
        ]);
        fs::create_dir(dir.path().join("class/hwmon/hwmon3/temp3_input")).unwrap();
        let (sink, mut rx) = SampleSink::channel();

        HwmonProbe::new(&config).update(&sink).await.unwrap();

        let samples = drain(&mut rx);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].name, "node_hwmon_temp_celsius");
        assert_eq!(samples[0].value, 30.5);
        assert_eq!(samples[0].label("chip"), Some("hwmon3"));
        assert_eq!(samples[0].label("sensor"), Some("temp2"));
    }

    #[tokio::test]
    async fn test_hwmon_missing_class_is_no_data() {
        let (_dir, config) = fixture::sysfs(&[]);
        let (sink, _rx) = SampleSink::channel();

        let err = HwmonProbe::new(&config).update(&sink).await.unwrap_err();
        assert!(err.is_no_data());
    }

    #[test]
    fn test_attribute_names() {
        let (sensor_type, sensor, property) = parse_attribute("temp12_crit_alarm").unwrap();
        assert_eq!(sensor_type.prefix, "temp");
        assert_eq!((sensor, property), ("temp12", "crit_alarm"));
        assert!(parse_attribute("name").is_none());
        assert!(parse_attribute("power_state").is_none());
        assert!(parse_attribute("pwm1_enable").is_none());
        assert!(parse_attribute("in0a_input").is_none());
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean("coretemp.0"), "coretemp_0");
        assert_eq!(clean("0000:00:1f.3"), "0000:00:1f_3");
        assert_eq!(clean("-Hwmon0-"), "hwmon0");
    }
}
