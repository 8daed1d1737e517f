// Copyright (C) 2022-2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of daq-log.
//
// daq-log is free software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// daq-log is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even
// the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with daq-log.  If not,
// see <http://www.gnu.org/licenses/>.

//! The legacy leveled-appender front-end.
//!
//! [`Appender`] accepts (logger, level, message) triples in the vocabulary of the [`log`] crate
//! (extended with a `Fatal` level, see [`AppenderLevel`]), either directly through
//! [`Appender::append`] or by standing in as the global [`log::Log`]
//! implementation. It applies the same filter policy as [`RecordHandler`] & emits the same wire
//! format, so a collector can't tell the two front-ends apart.
//!
//! ```no_run
//! use daq_log::appender::Appender;
//! use daq_log::level::Severity;
//!
//! Appender::open(Severity::Info, "expcont", 6666).unwrap().install().unwrap();
//! log::info!("Hello, world!");
//! ```
//!
//! [`RecordHandler`]: crate::record::RecordHandler

use crate::{
    config::Config,
    error::{Error, Result},
    event::{ErrorDetail, LogEvent},
    formatter::{Formatter, TextFormatter},
    level::{AppenderLevel, Severity},
    sender::Sender,
    transport::{Transport, UdpTransport},
    INTERNAL_TARGET,
};

use backtrace::Backtrace;

/// Forwards [`log`]-style events at or above a minimum [`Severity`] to a collector.
pub struct Appender<F: Formatter = TextFormatter, T: Transport = UdpTransport> {
    min_severity: Severity,
    sender: Sender<F, T>,
}

impl Appender<TextFormatter, UdpTransport> {
    /// Attempt to construct an [`Appender`] sending plain-text packets via UDP to `host`:`port`
    pub fn open(min_severity: Severity, host: &str, port: u16) -> Result<Self> {
        Ok(Appender::new(min_severity, Sender::open(host, port)?))
    }
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Appender::open(cfg.min_severity(), cfg.host(), cfg.port())
    }
}

impl<F: Formatter, T: Transport> Appender<F, T> {
    pub fn new(min_severity: Severity, sender: Sender<F, T>) -> Self {
        Appender {
            min_severity,
            sender,
        }
    }
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }
    /// `level` may be an [`AppenderLevel`] or a plain [`log::Level`]
    pub fn is_loggable<L: Into<AppenderLevel>>(&self, level: L) -> bool {
        Severity::from_appender_level(level) >= self.min_severity
    }
    pub fn append<L: Into<AppenderLevel>>(
        &self,
        logger: &str,
        level: L,
        message: &str,
    ) -> Result<()> {
        self.append_with_error(logger, level, message, None)
    }
    /// Forward one event, if it is at or above the minimum severity; once closed, fails with
    /// [`Error::ClosedTransport`] whatever the level.
    pub fn append_with_error<L: Into<AppenderLevel>>(
        &self,
        logger: &str,
        level: L,
        message: &str,
        error: Option<&ErrorDetail>,
    ) -> Result<()> {
        if self.sender.is_closed() {
            return Err(Error::closed());
        }
        let severity = Severity::from_appender_level(level);
        if severity < self.min_severity {
            return Ok(());
        }
        let event = LogEvent::now(logger, severity, message)
            .with_error(error);
        self.sender.send(&event).map(|_| ())
    }
    /// Nothing to do: the transport holds nothing back.
    pub fn flush(&self) {}
    pub fn close(&self) {
        self.sender.close()
    }
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl<F, T> Appender<F, T>
where
    F: Formatter + Send + Sync + 'static,
    T: Transport + Send + Sync + 'static,
{
    /// Install this appender as the global [`log`] logger, with the maximum level set to match our
    /// minimum severity. This can only succeed once per process.
    pub fn install(self) -> Result<()> {
        let filter = self.min_severity.level_filter();
        log::set_boxed_logger(Box::new(self)).map_err(|err| Error::Install {
            source: err,
            back: Backtrace::new(),
        })?;
        log::set_max_level(filter);
        Ok(())
    }
}

impl<F, T> log::Log for Appender<F, T>
where
    F: Formatter + Send + Sync,
    T: Transport + Send + Sync,
{
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        !self.sender.is_closed() && self.is_loggable(metadata.level())
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) || record.target().starts_with(INTERNAL_TARGET) {
            return;
        }
        // Avoid an allocation for the (very common) case of a literal message.
        let formatted;
        let message = match record.args().as_str() {
            Some(s) => s,
            None => {
                formatted = record.args().to_string();
                &formatted
            }
        };
        self.append(record.target(), record.level(), message)
            .unwrap_or_else(|err| {
                ::tracing::warn!(target: INTERNAL_TARGET, "failed to forward a log record: {}", err);
            })
    }

    fn flush(&self) {}
}
