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

//! syslog facility & level definitions, for the [RFC 5424](crate::rfc5424) wire format.
//!
//! [`Facility`] and [`Level`] replicate the names used in `<syslog.h>`. Only the facilities an
//! application forwarder could sensibly claim are modelled.

use crate::level::Severity;

type StdResult<T, E> = std::result::Result<T, E>;

/// syslog facilities, pre-multiplied by 8 as in `<syslog.h>` so that a facility may be or'd
/// directly with a [`Level`] to form a PRI.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Facility {
    /// random user-level messages
    LOG_USER = 1 << 3,
    /// system daemons
    LOG_DAEMON = 3 << 3,
    /// reserved for local use
    LOG_LOCAL0 = 16 << 3,
    /// reserved for local use
    LOG_LOCAL1 = 17 << 3,
    /// reserved for local use
    LOG_LOCAL2 = 18 << 3,
    /// reserved for local use
    LOG_LOCAL3 = 19 << 3,
    /// reserved for local use
    LOG_LOCAL4 = 20 << 3,
    /// reserved for local use
    LOG_LOCAL5 = 21 << 3,
    /// reserved for local use
    LOG_LOCAL6 = 22 << 3,
    /// reserved for local use
    LOG_LOCAL7 = 23 << 3,
}

impl std::default::Default for Facility {
    /// The default facility is `LOG_USER`.
    fn default() -> Self {
        Facility::LOG_USER
    }
}

impl std::fmt::Display for Facility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{:?}", self)
    }
}

/// The eight syslog severities, most severe first; the values are those of `<syslog.h>`.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    /// system is unusable
    LOG_EMERG,
    /// action must be take immediately
    LOG_ALERT,
    /// critical conditions
    LOG_CRIT,
    /// error conditions
    LOG_ERR,
    /// warning conditions
    LOG_WARNING,
    /// normal, but significant condition
    LOG_NOTICE,
    /// informational message
    LOG_INFO,
    /// debug-level message
    LOG_DEBUG,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> StdResult<(), std::fmt::Error> {
        write!(f, "{:?}", self)
    }
}

impl std::convert::From<Severity> for Level {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Debug => Level::LOG_DEBUG,
            Severity::Info => Level::LOG_INFO,
            Severity::Warn => Level::LOG_WARNING,
            Severity::Error => Level::LOG_ERR,
            Severity::Fatal => Level::LOG_CRIT,
        }
    }
}

/// Combine a facility & a level into an RFC 5424 PRI value
pub fn priority(facility: Facility, level: Level) -> u8 {
    facility as u8 | level as u8
}
