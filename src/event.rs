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

//! The canonical log event.
//!
//! Every front-end reduces whatever it was handed to a [`LogEvent`] before anything is formatted
//! or sent. A [`LogEvent`] borrows from its producer: it is built at the moment of the front-end
//! call, consumed by the sender, & dropped.

use crate::level::Severity;

use chrono::prelude::*;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// A small, stable, numeric identifier for the calling thread.
///
/// [`std::thread::ThreadId`] offers no stable way to get at a number, so we hand out our own the
/// first time each thread asks.
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

/// The label under which a thread appears on the wire
pub fn thread_label(id: u64) -> String {
    format!("Thread#{}", id)
}

/// Convert milliseconds since the Unix epoch to local time; out-of-range values fall back to now.
pub fn local_time_from_millis(millis: i64) -> DateTime<Local> {
    Local
        .timestamp_millis_opt(millis)
        .earliest()
        .unwrap_or_else(Local::now)
}

/// Milliseconds since the Unix epoch, now
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// An error attached to a log event.
///
/// This is deliberately just data: a kind (typically a type name), a message & an ordered list of
/// frame descriptions. It is only rendered to text when the event is serialized.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
    pub frames: Vec<String>,
}

impl ErrorDetail {
    pub fn new<K: Into<String>, M: Into<String>>(kind: K, message: M) -> ErrorDetail {
        ErrorDetail {
            kind: kind.into(),
            message: message.into(),
            frames: Vec::new(),
        }
    }
    pub fn with_frames<I, S>(mut self, frames: I) -> ErrorDetail
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frames.extend(frames.into_iter().map(Into::into));
        self
    }
    /// Describe `err`; the kind is `E`'s type name, the frames its chain of sources.
    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> ErrorDetail {
        let mut detail = ErrorDetail::from_dyn_error(err);
        detail.kind = std::any::type_name::<E>().to_string();
        detail
    }
    /// Describe a type-erased error; with no type to name, the kind is simply "Error".
    pub fn from_dyn_error(err: &(dyn std::error::Error + 'static)) -> ErrorDetail {
        let mut frames = Vec::new();
        let mut cause = err.source();
        while let Some(source) = cause {
            frames.push(format!("caused by: {}", source));
            cause = source.source();
        }
        ErrorDetail {
            kind: "Error".to_string(),
            message: err.to_string(),
            frames,
        }
    }
    /// Append the current call stack, as resolved by [`backtrace`], to the frames.
    pub fn with_backtrace(mut self) -> ErrorDetail {
        let back = backtrace::Backtrace::new();
        for frame in back.frames() {
            for symbol in frame.symbols() {
                let name = symbol
                    .name()
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| format!("{:?}", frame.ip()));
                match (symbol.filename(), symbol.lineno()) {
                    (Some(file), Some(line)) => {
                        self.frames
                            .push(format!("{} ({}:{})", name, file.display(), line))
                    }
                    _ => self.frames.push(name),
                }
            }
        }
        self
    }
    /// Render for the wire.
    ///
    /// The rendition begins with a line separator, so that appending it to a message leaves the
    /// message intact & immediately before it:
    ///
    /// ```text
    /// \n<kind>: <message>
    ///     <frame>
    ///     <frame>
    /// ```
    pub fn render(&self) -> String {
        let mut text = format!("\n{}: {}", self.kind, self.message);
        for frame in &self.frames {
            text.push_str("\n    ");
            text.push_str(frame);
        }
        text
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// The canonical, transport-agnostic log event.
#[derive(Clone, Debug)]
pub struct LogEvent<'a> {
    pub logger: &'a str,
    pub thread: String,
    pub severity: Severity,
    pub timestamp: DateTime<Local>,
    pub message: &'a str,
    pub error: Option<&'a ErrorDetail>,
}

impl<'a> LogEvent<'a> {
    /// Build an event stamped with the current thread & time
    pub fn now(logger: &'a str, severity: Severity, message: &'a str) -> LogEvent<'a> {
        LogEvent {
            logger,
            thread: thread_label(current_thread_id()),
            severity,
            timestamp: Local::now(),
            message,
            error: None,
        }
    }
    pub fn with_error(mut self, error: Option<&'a ErrorDetail>) -> LogEvent<'a> {
        self.error = error;
        self
    }
}
