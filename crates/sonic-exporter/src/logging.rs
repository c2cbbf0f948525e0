// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Global `tracing` subscriber: plain lines on stdout, plus one syslog datagram per event.
//!
//! SONiC's rsyslog expects the tag `{container}#{binary}` and listens on UDP 514 of the host.

use std::io::{self, Write};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use syslog::{Facility, Formatter3164, Logger, LoggerBackend};
use tracing::{Level, Metadata};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::ExporterError;
use crate::settings::Settings;

pub const SYSLOG_TAG: &str = "sonic_exporter#/sonic_exporter";

pub fn init(settings: &Settings) -> Result<(), ExporterError> {
    let env_filter = format!("h2=off,hyper=off,redis=off,{}", settings.log_level);
    let filter = EnvFilter::try_new(env_filter)
        .map_err(|e| ExporterError::Logging(format!("could not parse log level: {e}")))?;

    let stdout_layer = fmt::layer()
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .with_ansi(false)
        .without_time();

    let syslog_layer = match settings.syslog_addr {
        Some(addr) => {
            let writer = SyslogMakeWriter::connect(addr, SYSLOG_TAG).map_err(|e| {
                ExporterError::Logging(format!("could not reach syslog at {addr}: {e}"))
            })?;
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_level(false)
                    .with_target(false)
                    .with_ansi(false)
                    .without_time(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(syslog_layer)
        .try_init()
        .map_err(|e| ExporterError::Logging(e.to_string()))
}

/// Sends each formatted event to a syslog receiver as one RFC 3164 datagram.
pub struct SyslogMakeWriter {
    logger: Mutex<Logger<LoggerBackend, Formatter3164>>,
}

impl SyslogMakeWriter {
    pub fn connect(addr: SocketAddr, tag: &str) -> io::Result<Self> {
        let local = match addr {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        };
        let formatter = Formatter3164 {
            facility: Facility::LOG_USER,
            // rsyslog fills in the host
            hostname: None,
            process: tag.to_string(),
            pid: std::process::id(),
        };
        let logger = syslog::udp(formatter, local, addr)
            .map_err(|e| io::Error::other(e.to_string()))?;
        Ok(Self {
            logger: Mutex::new(logger),
        })
    }

    pub fn writer(&self, level: Level) -> SyslogWriter<'_> {
        SyslogWriter {
            target: self,
            level,
            buffer: Vec::new(),
        }
    }

    fn send(&self, level: Level, message: &str) {
        let mut logger = self.logger.lock().unwrap_or_else(PoisonError::into_inner);
        // best effort
        let _ = if level == Level::ERROR {
            logger.err(message)
        } else if level == Level::WARN {
            logger.warning(message)
        } else if level == Level::INFO {
            logger.info(message)
        } else {
            logger.debug(message)
        };
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(*meta.level())
    }
}

/// Buffers one event and sends it when dropped.
pub struct SyslogWriter<'a> {
    target: &'a SyslogMakeWriter,
    level: Level,
    buffer: Vec<u8>,
}

impl Write for SyslogWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogWriter<'_> {
    fn drop(&mut self) {
        let message = String::from_utf8_lossy(&self.buffer);
        let message = message.trim_end();
        if !message.is_empty() {
            self.target.send(self.level, message);
        }
    }
}
