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

//! [daq-log](crate) errors

use backtrace::Backtrace;

/// [daq-log](crate) error type
///
/// [daq-log](crate) eschews libraries like [thiserror], [anyhow] & [Snafu] in favor of a
/// straightforward enumeration with a few match arms chosen on the basis what the caller will need
/// to respond. The three the forwarding path can produce are:
///
/// - [`Error::Resolution`]: the collector could not be resolved, or a local socket could not be
///   set up; fatal to the construction of a sender or adapter
/// - [`Error::Transport`]: a single send failed locally; never retried
/// - [`Error::ClosedTransport`]: the sender has been closed
///
/// [thiserror]: https://docs.rs/thiserror
/// [anyhow]: https://docs.rs/anyhow
/// [Snafu]: https://docs.rs/snafu/latest/snafu
#[non_exhaustive]
pub enum Error {
    /// A severity name given in configuration is not one we know
    BadSeverity { token: String, back: Backtrace },
    /// Non-compliant RFC 5424 hostname provided
    BadRfc5424Hostname { name: Vec<u8>, back: Backtrace },
    /// An operation was attempted on a transport that has been closed
    ClosedTransport { back: Backtrace },
    /// Failed to install an appender as the global `log` logger
    Install {
        source: log::SetLoggerError,
        back: Backtrace,
    },
    /// The collector endpoint could not be resolved, or the local socket could not be allocated
    Resolution {
        target: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
    /// A send attempt failed locally
    Transport {
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
        back: Backtrace,
    },
}

impl Error {
    pub(crate) fn transport<E>(err: E) -> Error
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Transport {
            source: Box::new(err),
            back: Backtrace::new(),
        }
    }
    pub(crate) fn closed() -> Error {
        Error::ClosedTransport {
            back: Backtrace::new(),
        }
    }
    /// True if this error reports use of a closed transport
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::ClosedTransport { .. })
    }
}

impl std::fmt::Display for Error {
    // `Error` is non-exhaustive so that adding variants won't be a breaking change to our
    // callers. That means the compiler won't catch us if we miss a variant here, so we
    // always include a `_` arm.
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadSeverity { token, .. } => write!(f, "{:?} is not a known severity", token),
            Error::BadRfc5424Hostname { name, .. } => write!(
                f,
                "{:?} is not an RFC 5424-compliant hostname",
                String::from_utf8_lossy(name)
            ),
            Error::ClosedTransport { .. } => write!(f, "The log transport has been closed"),
            Error::Install { source, .. } => {
                write!(f, "While installing the global logger, got {}", source)
            }
            Error::Resolution { target, source, .. } => {
                write!(f, "Couldn't reach log collector at {}: {}", target, source)
            }
            Error::Transport { source, .. } => write!(f, "Transport error: {}", source),
            _ => write!(f, "Other daq-log error"),
        }
    }
}

impl std::fmt::Debug for Error {
    #[allow(unreachable_patterns)]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::BadSeverity { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::BadRfc5424Hostname { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::ClosedTransport { back } => write!(f, "{}\n{:?}", self, back),
            Error::Install { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Resolution { back, .. } => write!(f, "{}\n{:?}", self, back),
            Error::Transport { back, .. } => write!(f, "{}\n{:?}", self, back),
            err => write!(f, "daq-log error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Install { source, .. } => Some(source),
            Error::Resolution { source, .. } => Some(source.as_ref()),
            Error::Transport { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
