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

//! Routing raw byte output into the logging pipeline.
//!
//! [`LoggingWriter`] is an [`std::io::Write`] implementation that turns whatever is written to it
//! into log calls: each flush takes the accumulated bytes, drops one trailing line separator, and
//! (if anything is left) hands the text to a [`LineSink`] at a fixed level. Hand one to anything
//! that wants a writer (a child process' captured output, a library's diagnostic stream) to have
//! that output show up at the collector.
//!
//! Every write is followed immediately by a flush, so output appears as soon as it is written
//! rather than when the stream is closed. The consequence is that a single line written in two
//! pieces becomes two log calls.
//!
//! ```rust
//! use daq_log::bridge::LoggingWriter;
//! use daq_log::level::AppenderLevel;
//! use std::io::Write;
//!
//! let mut out = LoggingWriter::new(
//!     |level: AppenderLevel, line: &str| println!("{:?}: {}", level, line),
//!     log::Level::Info,
//! );
//! writeln!(out, "Hello, world!").unwrap();
//! ```

use crate::{
    appender::Appender,
    formatter::Formatter,
    level::AppenderLevel,
    transport::Transport,
    INTERNAL_TARGET,
};

use parking_lot::Mutex;

use std::io::Write;

/// The platform line separator
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

/// Somewhere to send a line of captured output.
pub trait LineSink {
    fn log_line(&self, level: AppenderLevel, line: &str);
}

/// Any `Fn(AppenderLevel, &str)` will do.
impl<X> LineSink for X
where
    X: Fn(AppenderLevel, &str),
{
    fn log_line(&self, level: AppenderLevel, line: &str) {
        self(level, line)
    }
}

/// Routes lines through whatever [`log`] logger is installed, under `target`. [`log`] has no
/// fatal level, so [`AppenderLevel::Fatal`] lines go out as `Error`; use an [`AppenderSink`] to
/// keep them fatal.
#[derive(Clone, Debug)]
pub struct LogFacade {
    target: String,
}

impl LogFacade {
    pub fn new<S: Into<String>>(target: S) -> LogFacade {
        LogFacade {
            target: target.into(),
        }
    }
}

impl LineSink for LogFacade {
    fn log_line(&self, level: AppenderLevel, line: &str) {
        log::log!(target: self.target.as_str(), level.to_log_level(), "{}", line);
    }
}

/// Hands lines straight to an [`Appender`], under `logger`.
pub struct AppenderSink<'a, F: Formatter, T: Transport> {
    appender: &'a Appender<F, T>,
    logger: String,
}

impl<'a, F: Formatter, T: Transport> AppenderSink<'a, F, T> {
    pub fn new<S: Into<String>>(appender: &'a Appender<F, T>, logger: S) -> Self {
        AppenderSink {
            appender,
            logger: logger.into(),
        }
    }
}

impl<'a, F: Formatter, T: Transport> LineSink for AppenderSink<'a, F, T> {
    fn log_line(&self, level: AppenderLevel, line: &str) {
        self.appender
            .append(&self.logger, level, line)
            .unwrap_or_else(|err| {
                ::tracing::warn!(target: INTERNAL_TARGET, "failed to forward captured output: {}", err);
            })
    }
}

/// An [`std::io::Write`] that emits one log call per flush.
pub struct LoggingWriter<S: LineSink> {
    buf: Mutex<Vec<u8>>,
    sink: S,
    level: AppenderLevel,
}

impl<S: LineSink> LoggingWriter<S> {
    /// Every line will be logged to `sink` at `level` (an [`AppenderLevel`] or a [`log::Level`]).
    pub fn new<L: Into<AppenderLevel>>(sink: S, level: L) -> LoggingWriter<S> {
        LoggingWriter {
            buf: Mutex::new(Vec::new()),
            sink,
            level: level.into(),
        }
    }
    pub fn level(&self) -> AppenderLevel {
        self.level
    }
    /// Append `bytes` & flush, as one exclusive section.
    pub fn write_bytes(&self, bytes: &[u8]) {
        let mut buf = self.buf.lock();
        buf.extend_from_slice(bytes);
        self.drain(&mut buf);
    }
    /// Log whatever has accumulated, less one trailing line separator; an empty remainder logs
    /// nothing. The buffer is empty afterward either way.
    pub fn flush_buffer(&self) {
        let mut buf = self.buf.lock();
        self.drain(&mut buf);
    }
    fn drain(&self, buf: &mut Vec<u8>) {
        if buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(buf);
        let line = text.strip_suffix(LINE_SEPARATOR).unwrap_or(&text);
        if !line.is_empty() {
            self.sink.log_line(self.level, line);
        }
        buf.clear();
    }
}

impl<S: LineSink> Write for LoggingWriter<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_buffer();
        Ok(())
    }
}

/// Writing through a shared reference lets several threads share one [`LoggingWriter`].
impl<S: LineSink> Write for &LoggingWriter<S> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_buffer();
        Ok(())
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::{
        level::Severity,
        sender::Sender,
        transport::test::{listener, recv, Recorder},
    };

    use std::sync::Arc;

    type Calls = Arc<Mutex<Vec<(AppenderLevel, String)>>>;

    fn capture(level: log::Level) -> (LoggingWriter<impl LineSink>, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let calls = calls.clone();
            move |level: AppenderLevel, line: &str| calls.lock().push((level, line.to_string()))
        };
        (LoggingWriter::new(sink, level), calls)
    }

    #[test]
    fn one_call_per_line() {
        let (mut out, calls) = capture(log::Level::Warn);
        out.write_all(format!("hello{}", LINE_SEPARATOR).as_bytes())
            .unwrap();
        out.flush().unwrap();
        assert_eq!(
            *calls.lock(),
            vec![(AppenderLevel::Warn, "hello".to_string())]
        );
    }

    #[test]
    fn nothing_to_log() {
        let (mut out, calls) = capture(log::Level::Info);
        out.flush().unwrap();
        out.write_all(LINE_SEPARATOR.as_bytes()).unwrap();
        out.write_all(b"").unwrap();
        out.flush().unwrap();
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn strips_exactly_one_separator() {
        let (mut out, calls) = capture(log::Level::Info);
        let twice = format!("a{}{}", LINE_SEPARATOR, LINE_SEPARATOR);
        out.write_all(twice.as_bytes()).unwrap();
        let inner = format!("x{}y", LINE_SEPARATOR);
        out.write_all(inner.as_bytes()).unwrap();
        assert_eq!(
            *calls.lock(),
            vec![
                (AppenderLevel::Info, format!("a{}", LINE_SEPARATOR)),
                (AppenderLevel::Info, inner),
            ]
        );
    }

    #[test]
    fn flushes_on_every_write() {
        let (mut out, calls) = capture(log::Level::Info);
        out.write_all(b"hel").unwrap();
        out.write_all(format!("lo{}", LINE_SEPARATOR).as_bytes())
            .unwrap();
        let lines: Vec<String> = calls.lock().iter().map(|(_, l)| l.clone()).collect();
        assert_eq!(lines, vec!["hel".to_string(), "lo".to_string()]);
    }

    #[test]
    fn shared_between_threads() {
        const N: usize = 16;
        let (out, calls) = capture(log::Level::Info);
        std::thread::scope(|scope| {
            for i in 0..N {
                let out = &out;
                scope.spawn(move || {
                    let mut w: &LoggingWriter<_> = out;
                    w.write_all(format!("line {}{}", i, LINE_SEPARATOR).as_bytes())
                        .unwrap();
                });
            }
        });
        let mut lines: Vec<String> = calls.lock().iter().map(|(_, l)| l.clone()).collect();
        lines.sort();
        let mut expected: Vec<String> = (0..N).map(|i| format!("line {}", i)).collect();
        expected.sort();
        assert_eq!(lines, expected);
    }

    #[test]
    fn into_an_appender() {
        let recorder = Arc::new(Recorder::default());
        let appender = Appender::new(Severity::Info, Sender::with_transport(recorder.clone()));
        let mut out = LoggingWriter::new(AppenderSink::new(&appender, "stdout"), log::Level::Info);
        out.write_all(format!("captured{}", LINE_SEPARATOR).as_bytes())
            .unwrap();
        out.write_all(LINE_SEPARATOR.as_bytes()).unwrap();
        let texts = recorder.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("stdout Thread#"));
        assert!(texts[0].contains(" INFO ["));
        assert!(texts[0].ends_with("] captured"));

        // below the appender's threshold: goes nowhere
        let mut quiet = LoggingWriter::new(AppenderSink::new(&appender, "stdout"), log::Level::Debug);
        quiet.write_all(b"chatter").unwrap();
        assert_eq!(recorder.texts().len(), 1);
    }

    #[test]
    fn fatal_output_stays_fatal() {
        let recorder = Arc::new(Recorder::default());
        let appender = Appender::new(Severity::Error, Sender::with_transport(recorder.clone()));
        let mut out = LoggingWriter::new(
            AppenderSink::new(&appender, "stderr"),
            AppenderLevel::Fatal,
        );
        assert_eq!(out.level(), AppenderLevel::Fatal);
        out.write_all(format!("out of memory{}", LINE_SEPARATOR).as_bytes())
            .unwrap();
        let texts = recorder.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].starts_with("stderr Thread#"));
        assert!(texts[0].contains(" FATAL ["));
        assert!(texts[0].ends_with("] out of memory"));
    }

    // The only test in the crate that installs a global logger; that can happen just once per
    // process.
    #[test]
    fn through_the_global_logger() {
        let recorder = Arc::new(Recorder::default());
        Appender::new(Severity::Info, Sender::with_transport(recorder.clone()))
            .install()
            .unwrap();
        let mut out = LoggingWriter::new(LogFacade::new("captured.stdout"), log::Level::Warn);
        out.write_all(format!("disk full{}", LINE_SEPARATOR).as_bytes())
            .unwrap();
        let mut quiet = LoggingWriter::new(LogFacade::new("captured.stdout"), log::Level::Debug);
        quiet.write_all(b"chatter").unwrap();

        // `log` tops out at `Error`
        let mut fatal = LoggingWriter::new(LogFacade::new("captured.stderr"), AppenderLevel::Fatal);
        fatal.write_all(b"giving up").unwrap();

        let texts = recorder.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("captured.stdout Thread#"));
        assert!(texts[0].contains(" WARN "));
        assert!(texts[0].ends_with("] disk full"));
        assert!(texts[1].starts_with("captured.stderr Thread#"));
        assert!(texts[1].contains(" ERROR "));
        assert!(texts[1].ends_with("] giving up"));
    }

    #[test]
    fn all_the_way_to_the_collector() {
        let (collector, port) = listener();
        let appender = Appender::open(Severity::Info, "127.0.0.1", port).unwrap();
        let mut out = LoggingWriter::new(AppenderSink::new(&appender, "stderr"), log::Level::Error);
        out.write_all(b"hello").unwrap();
        let packet = String::from_utf8(recv(&collector).unwrap()).unwrap();
        assert!(packet.contains(" ERROR "));
        assert!(packet.ends_with("] hello"));
    }
}
