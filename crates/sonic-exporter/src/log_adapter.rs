// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Bridges key/value records logged by the node probes into `tracing`.

use node_probes::KvLogger;
use tracing::{debug, error, info, trace, warn, Level};

const MESSAGE_KEY: &str = "msg";
const LEVEL_KEY: &str = "level";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub fields: Vec<(String, String)>,
}

macro_rules! emit_at {
    ($event:ident, $record:expr) => {
        if $record.fields.is_empty() {
            $event!("node-library: {}", $record.message)
        } else {
            $event!(fields = %$record.fields_text(), "node-library: {}", $record.message)
        }
    };
}

impl LogRecord {
    /// The fields as space separated `key=value` pairs.
    pub fn fields_text(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn emit(&self) {
        match self.level {
            Level::ERROR => emit_at!(error, self),
            Level::WARN => emit_at!(warn, self),
            Level::INFO => emit_at!(info, self),
            Level::DEBUG => emit_at!(debug, self),
            _ => emit_at!(trace, self),
        }
    }
}

/// Translates a key/value record.
///
/// Returns `None` for records without a message. A missing or unknown `level` means debug. When
/// a key repeats, the last value wins.
pub fn translate(keyvals: &[(&str, &str)]) -> Option<LogRecord> {
    let mut message = None;
    let mut level = None;
    let mut fields: Vec<(String, String)> = Vec::new();
    for (key, value) in keyvals {
        match *key {
            MESSAGE_KEY => message = Some(*value),
            LEVEL_KEY => level = Some(*value),
            _ => match fields.iter_mut().find(|(k, _)| k.as_str() == *key) {
                Some(field) => field.1 = value.to_string(),
                None => fields.push((key.to_string(), value.to_string())),
            },
        }
    }
    Some(LogRecord {
        level: level.and_then(parse_level).unwrap_or(Level::DEBUG),
        message: message?.to_string(),
        fields,
    })
}

fn parse_level(level: &str) -> Option<Level> {
    match level.to_ascii_lowercase().as_str() {
        "panic" | "fatal" | "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

/// [`KvLogger`] writing through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingKvLogger;

impl KvLogger for TracingKvLogger {
    fn log(&self, keyvals: &[(&str, &str)]) {
        if let Some(record) = translate(keyvals) {
            record.emit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_record_without_message_is_ignored() {
        assert_eq!(translate(&[("level", "error"), ("err", "boom")]), None);
        assert_eq!(translate(&[]), None);
    }

    #[test]
    fn test_level_and_fields() {
        let record =
            translate(&[("level", "warn"), ("msg", "odd line"), ("file", "meminfo")]).unwrap();
        assert_eq!(record.level, Level::WARN);
        assert_eq!(record.message, "odd line");
        assert_eq!(record.fields, vec![("file".to_string(), "meminfo".to_string())]);
        assert_eq!(record.fields_text(), "file=meminfo");
    }

    #[test]
    fn test_missing_or_unknown_level_is_debug() {
        assert_eq!(translate(&[("msg", "hi")]).unwrap().level, Level::DEBUG);
        assert_eq!(
            translate(&[("msg", "hi"), ("level", "loud")]).unwrap().level,
            Level::DEBUG
        );
    }

    #[test]
    fn test_level_names() {
        for (name, level) in [
            ("panic", Level::ERROR),
            ("fatal", Level::ERROR),
            ("ERROR", Level::ERROR),
            ("warning", Level::WARN),
            ("Info", Level::INFO),
            ("trace", Level::TRACE),
        ] {
            assert_eq!(parse_level(name), Some(level), "{name}");
        }
    }

    #[test]
    fn test_repeated_keys_keep_last_value() {
        let record = translate(&[
            ("msg", "first"),
            ("k", "1"),
            ("msg", "second"),
            ("k", "2"),
        ])
        .unwrap();
        assert_eq!(record.message, "second");
        assert_eq!(record.fields, vec![("k".to_string(), "2".to_string())]);
    }

    #[test]
    #[traced_test]
    fn test_tracing_logger_emits_at_record_level() {
        TracingKvLogger.log(&[("level", "error"), ("msg", "conntrack gone")]);
        TracingKvLogger.log(&[("level", "error")]);
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("node-library: conntrack gone"));
        assert!(!logs_contain("fields="));
    }

    #[test]
    #[traced_test]
    fn test_tracing_logger_keeps_fields_separate() {
        TracingKvLogger.log(&[
            ("level", "warn"),
            ("msg", "unexpected line"),
            ("probe", "meminfo"),
            ("line", "7"),
        ]);
        assert!(logs_contain("node-library: unexpected line"));
        assert!(logs_contain("fields=probe=meminfo line=7"));
        assert!(!logs_contain("unexpected line probe=meminfo"));
    }
}
