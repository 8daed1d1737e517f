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
//! Best-effort forwarding of log output to a remote collector over UDP.
//!
//! # Introduction
//!
//! A data-acquisition system is a lot of processes on a lot of hosts, and when something goes
//! wrong the operator wants one place to look. This crate gets log output from each of those
//! processes to a central collector: every accepted event becomes one self-contained UDP datagram
//! holding a single line of text:
//!
//! ```text
//! <logger> <thread> <SEVERITY> [<timestamp>] <message>
//! ```
//!
//! optionally followed by a rendering of an attached error. Delivery is strictly best-effort: there
//! is no acknowledgement, no retry & no buffering. A failure to send is reported to the caller and
//! that's the end of it.
//!
//! Output can come from three places, and there is an adapter for each:
//!
//! - [`RecordHandler`] takes structured [`LogRecord`]s, and doubles as a [`tracing-subscriber`]
//!   [`Layer`] so that [`tracing`] events flow to the collector
//! - [`Appender`] takes (logger, level, message) triples in the vocabulary of the [`log`] crate
//!   (plus a fatal level), and can be installed as the global [`log::Log`] implementation
//! - [`LoggingWriter`] is an [`std::io::Write`] that turns raw bytes (captured output, say) into
//!   log calls, one per write
//!
//! Each front-end has its own notion of "level"; they are all mapped onto a common [`Severity`]
//! before filtering and formatting, so that a collector sees the same thing regardless of which
//! adapter sent it.
//!
//! [`RecordHandler`]: crate::record::RecordHandler
//! [`LogRecord`]: crate::record::LogRecord
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html
//! [`tracing`]: https://docs.rs/tracing/latest/tracing/index.html
//! [`Appender`]: crate::appender::Appender
//! [`LoggingWriter`]: crate::bridge::LoggingWriter
//! [`Severity`]: crate::level::Severity
//!
//! # Usage
//!
//! The simplest use is to stack a [`RecordHandler`] into a [`tracing`] subscriber:
//!
//! ```no_run
//! use daq_log::record::RecordHandler;
//! use daq_log::level::Severity;
//! use tracing::info;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//! use tracing_subscriber::registry::Registry;
//!
//! let subscriber = Registry::default()
//!     .with(RecordHandler::open(Severity::Info, "expcont", 6666).unwrap());
//! tracing::subscriber::set_global_default(subscriber).unwrap();
//!
//! info!("Hello, world!");
//! ```
//!
//! Code written against the [`log`] crate can use an [`Appender`] instead:
//!
//! ```no_run
//! use daq_log::appender::Appender;
//! use daq_log::config::Config;
//!
//! let cfg = Config::builder().host("expcont").min_severity_as_str("warn").unwrap().build();
//! Appender::from_config(&cfg).unwrap().install().unwrap();
//!
//! log::warn!("Hello, world!");
//! ```
//!
//! The packet format and the transport are both pluggable: see [`Formatter`] & [`Transport`]. An
//! [RFC 5424] formatter is provided for collectors that speak syslog.
//!
//! [`Formatter`]: crate::formatter::Formatter
//! [`Transport`]: crate::transport::Transport
//! [RFC 5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! # Diagnostics
//!
//! Failures inside the adapters' [`log`] & [`tracing`] entry points can't be returned to anyone.
//! Those in the [`log::Log`] implementation & the bridge are reported as [`tracing`] events under
//! [`INTERNAL_TARGET`], which the adapters themselves never forward. A subscriber can't emit
//! [`tracing`] events from inside its own callbacks, so the [`RecordHandler`] layer instead counts
//! its failures (see [`RecordHandler::failures`]) & logs them through [`log`] under the same
//! target.
//!
//! [`RecordHandler::failures`]: crate::record::RecordHandler::failures

pub mod appender;
pub mod bridge;
pub mod config;
pub mod error;
pub mod event;
pub mod facility;
pub mod formatter;
pub mod level;
pub mod record;
pub mod rfc5424;
pub mod sender;
pub mod transport;

/// The target under which this crate reports its own troubles
pub const INTERNAL_TARGET: &str = "daq_log::internal";
