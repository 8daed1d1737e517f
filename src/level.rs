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

//! Canonical severities & the mapping onto them from each front-end.
//!
//! The two front-ends this crate accepts disagree on their level vocabulary. [`tracing`] orders
//! its levels so that `TRACE` is the "greatest"; the [`log`] crate numbers them from `Error = 1`
//! up to `Trace = 5`. Neither has a level above "error". Rather than lean on the names happening to
//! line up, each taxonomy gets its own table indexed by the ordinal position of the level in that
//! taxonomy, so neither adapter needs to know anything about the other's vocabulary.
//!
//! The legacy appender speaks [`AppenderLevel`], which extends [`log`]'s levels with `Fatal`; that
//! is the one front-end through which a [`Severity::Fatal`] event can reach the wire.

use crate::error::{Error, Result};

use backtrace::Backtrace;

type StdResult<T, E> = std::result::Result<T, E>;

/// The canonical, ordered severity carried on the wire.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// [`tracing::Level`] ordinals: `TRACE`, `DEBUG`, `INFO`, `WARN`, `ERROR`
const RECORD_LEVELS: [Severity; 5] = [
    Severity::Debug,
    Severity::Debug,
    Severity::Info,
    Severity::Warn,
    Severity::Error,
];

/// The legacy appender's own vocabulary: the [`log`] crate's levels (with `Trace` folded into
/// `Debug`) plus a `Fatal` rung above `Error`, which [`log`] lacks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppenderLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// [`AppenderLevel`] ordinals: `Debug`, `Info`, `Warn`, `Error`, `Fatal`
const APPENDER_LEVELS: [Severity; 5] = [
    Severity::Debug,
    Severity::Info,
    Severity::Warn,
    Severity::Error,
    Severity::Fatal,
];

impl AppenderLevel {
    /// The nearest [`log::Level`]; `Fatal` has no counterpart there & becomes `Error`.
    pub fn to_log_level(&self) -> log::Level {
        match self {
            AppenderLevel::Debug => log::Level::Debug,
            AppenderLevel::Info => log::Level::Info,
            AppenderLevel::Warn => log::Level::Warn,
            AppenderLevel::Error | AppenderLevel::Fatal => log::Level::Error,
        }
    }
}

impl std::convert::From<log::Level> for AppenderLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace | log::Level::Debug => AppenderLevel::Debug,
            log::Level::Info => AppenderLevel::Info,
            log::Level::Warn => AppenderLevel::Warn,
            log::Level::Error => AppenderLevel::Error,
        }
    }
}

fn record_ordinal(level: &tracing::Level) -> usize {
    match *level {
        tracing::Level::TRACE => 0,
        tracing::Level::DEBUG => 1,
        tracing::Level::INFO => 2,
        tracing::Level::WARN => 3,
        tracing::Level::ERROR => 4,
    }
}

impl Severity {
    /// Every severity, least severe first
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Map a level from the structured-record front-end
    pub fn from_record_level(level: &tracing::Level) -> Severity {
        RECORD_LEVELS[record_ordinal(level)]
    }

    /// Map a level from the legacy appender front-end
    pub fn from_appender_level<L: Into<AppenderLevel>>(level: L) -> Severity {
        let level: AppenderLevel = level.into();
        APPENDER_LEVELS[level as usize]
    }

    /// Map a textual level name from either vocabulary.
    ///
    /// Matching is case-insensitive & accepts a handful of common aliases. Anything we don't
    /// recognize maps to [`Severity::Debug`]: a producer that hands us a strange level should
    /// still get its message out, at the lowest priority, rather than fail.
    pub fn from_token(token: &str) -> Severity {
        Severity::lookup(token).unwrap_or(Severity::Debug)
    }

    fn lookup(token: &str) -> Option<Severity> {
        match token.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "FINEST" | "FINER" | "FINE" | "DEBUG" => Some(Severity::Debug),
            "CONFIG" | "INFO" | "NOTICE" => Some(Severity::Info),
            "WARN" | "WARNING" => Some(Severity::Warn),
            "ERROR" | "ERR" | "SEVERE" => Some(Severity::Error),
            "FATAL" | "CRITICAL" | "CRIT" | "ALERT" | "EMERG" => Some(Severity::Fatal),
            _ => None,
        }
    }

    /// The canonical name of this severity, as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// The most verbose [`log::Level`] that maps to at least this severity; [`Severity::Fatal`]
    /// has no counterpart & yields `None`
    pub fn to_appender_level(&self) -> Option<log::Level> {
        match self {
            Severity::Debug => Some(log::Level::Trace),
            Severity::Info => Some(log::Level::Info),
            Severity::Warn => Some(log::Level::Warn),
            Severity::Error => Some(log::Level::Error),
            Severity::Fatal => None,
        }
    }

    /// The [`log::LevelFilter`] that lets through exactly the [`log`] records at or above this
    /// severity
    pub fn level_filter(&self) -> log::LevelFilter {
        self.to_appender_level()
            .map(|level| level.to_level_filter())
            .unwrap_or(log::LevelFilter::Off)
    }
}

impl std::default::Default for Severity {
    /// The default minimum severity is `INFO`.
    fn default() -> Self {
        Severity::Info
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

/// Strict parsing, for configuration; unlike [`Severity::from_token`] unknown names are an error.
impl std::str::FromStr for Severity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Severity::lookup(s).ok_or_else(|| Error::BadSeverity {
            token: s.to_string(),
            back: Backtrace::new(),
        })
    }
}

impl std::convert::From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        Severity::from_record_level(level)
    }
}

impl std::convert::From<log::Level> for Severity {
    fn from(level: log::Level) -> Self {
        Severity::from_appender_level(level)
    }
}

impl std::convert::From<AppenderLevel> for Severity {
    fn from(level: AppenderLevel) -> Self {
        Severity::from_appender_level(level)
    }
}
