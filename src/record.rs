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

//! The structured-record front-end.
//!
//! A [`LogRecord`] carries everything a structured logging API knows about an occurrence: the
//! logger, a numeric thread id, a level, a millisecond timestamp, the message & (maybe) an error.
//! [`RecordHandler`] filters records against a minimum [`Severity`] & forwards the rest.
//!
//! [`RecordHandler`] is also a [`tracing-subscriber`] [`Layer`], so that [`tracing`] events are
//! turned into records & forwarded the same way:
//!
//! ```no_run
//! use daq_log::record::RecordHandler;
//! use daq_log::level::Severity;
//! use tracing::info;
//! use tracing_subscriber::layer::SubscriberExt; // Needed to get `with()`
//! use tracing_subscriber::registry::Registry;
//!
//! let handler = RecordHandler::open(Severity::Info, "expcont", 6666).unwrap();
//! let subscriber = Registry::default().with(handler);
//! let _guard = tracing::subscriber::set_default(subscriber);
//!
//! info!("Hello, world!");
//! ```
//!
//! [`tracing-subscriber`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/index.html
//! [`Layer`]: https://docs.rs/tracing-subscriber/latest/tracing_subscriber/layer/trait.Layer.html

use crate::{
    config::Config,
    error::{Error, Result},
    event::{
        current_thread_id, local_time_from_millis, now_millis, thread_label, ErrorDetail, LogEvent,
    },
    formatter::{Formatter, TextFormatter},
    level::Severity,
    sender::Sender,
    transport::{Transport, UdpTransport},
    INTERNAL_TARGET,
};

use parking_lot::Mutex;
use tracing::Event;
use tracing_core::field::{Field, Visit};
use tracing_subscriber::layer::Context;

// When the tracing-log feature is enabled, use NormalizeEvent to recover the original target of
// events that came from the `log` crate.
#[cfg(feature = "tracing-log")]
use tracing_log::NormalizeEvent;

use std::sync::atomic::{AtomicU64, Ordering};

/// One occurrence, as reported by a structured logging API.
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub logger: String,
    pub thread_id: u64,
    pub level: tracing::Level,
    /// milliseconds since the Unix epoch
    pub millis: i64,
    pub message: String,
    pub error: Option<ErrorDetail>,
}

impl LogRecord {
    /// A record from the calling thread, stamped now
    pub fn new<L: Into<String>, M: Into<String>>(
        logger: L,
        level: tracing::Level,
        message: M,
    ) -> LogRecord {
        LogRecord {
            logger: logger.into(),
            thread_id: current_thread_id(),
            level,
            millis: now_millis(),
            message: message.into(),
            error: None,
        }
    }
    pub fn with_thread_id(mut self, thread_id: u64) -> LogRecord {
        self.thread_id = thread_id;
        self
    }
    pub fn with_millis(mut self, millis: i64) -> LogRecord {
        self.millis = millis;
        self
    }
    pub fn with_error(mut self, error: ErrorDetail) -> LogRecord {
        self.error = Some(error);
        self
    }
}

/// Forwards [`LogRecord`]s at or above a minimum [`Severity`] to a collector.
///
/// When used as a [`Layer`](tracing_subscriber::layer::Layer) there is no caller to hand a failed
/// send back to, and a subscriber can't usefully emit [`tracing`] events of its own from inside a
/// callback; such failures are counted here instead (see [`RecordHandler::failures`]) and also
/// logged through [`log`] under [`INTERNAL_TARGET`].
pub struct RecordHandler<F: Formatter = TextFormatter, T: Transport = UdpTransport> {
    min_severity: Severity,
    sender: Sender<F, T>,
    failures: AtomicU64,
    last_failure: Mutex<Option<String>>,
}

impl RecordHandler<TextFormatter, UdpTransport> {
    /// Attempt to construct a [`RecordHandler`] sending plain-text packets via UDP to
    /// `host`:`port`
    pub fn open(min_severity: Severity, host: &str, port: u16) -> Result<Self> {
        Ok(RecordHandler::new(min_severity, Sender::open(host, port)?))
    }
    pub fn from_config(cfg: &Config) -> Result<Self> {
        RecordHandler::open(cfg.min_severity(), cfg.host(), cfg.port())
    }
}

impl<F: Formatter, T: Transport> RecordHandler<F, T> {
    pub fn new(min_severity: Severity, sender: Sender<F, T>) -> Self {
        RecordHandler {
            min_severity,
            sender,
            failures: AtomicU64::new(0),
            last_failure: Mutex::new(None),
        }
    }
    pub fn min_severity(&self) -> Severity {
        self.min_severity
    }
    pub fn is_loggable(&self, record: &LogRecord) -> bool {
        Severity::from_record_level(&record.level) >= self.min_severity
    }
    /// Forward `record`, if it is at or above the minimum severity.
    ///
    /// Fails with [`Error::ClosedTransport`] once this handler has been closed, whatever the
    /// record's severity.
    pub fn publish(&self, record: &LogRecord) -> Result<()> {
        if self.sender.is_closed() {
            return Err(Error::closed());
        }
        if !self.is_loggable(record) {
            return Ok(());
        }
        let event = LogEvent {
            logger: &record.logger,
            thread: thread_label(record.thread_id),
            severity: Severity::from_record_level(&record.level),
            timestamp: local_time_from_millis(record.millis),
            message: &record.message,
            error: record.error.as_ref(),
        };
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
    /// The number of [`tracing`] events this handler failed to forward
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
    /// A description of the most recent such failure
    pub fn last_failure(&self) -> Option<String> {
        self.last_failure.lock().clone()
    }
    fn report(&self, err: &Error) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        *self.last_failure.lock() = Some(err.to_string());
        log::warn!(target: INTERNAL_TARGET, "failed to forward a tracing event: {}", err);
    }
}

/// Collects the message & any error from a [`tracing`] [`Event`].
#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    error: Option<ErrorDetail>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        }
    }
    fn record_error(
        &mut self,
        _field: &Field,
        value: &(dyn std::error::Error + 'static),
    ) {
        self.error = Some(ErrorDetail::from_dyn_error(value));
    }
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            // The tracing macros pre-format the `message` field so that `value` is really a
            // `std::fmt::Arguments`, whose `Debug` output carries no enclosing quotes.
            "message" => self.message = Some(format!("{:?}", value)),
            "error" if self.error.is_none() => {
                self.error = Some(ErrorDetail::new("Error", format!("{:?}", value)))
            }
            _ => (),
        }
    }
}

impl<S, F, T> tracing_subscriber::layer::Layer<S> for RecordHandler<F, T>
where
    S: tracing::Subscriber,
    F: Formatter + 'static,
    T: Transport + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        #[cfg(feature = "tracing-log")]
        let normalized_meta = event.normalized_metadata();
        #[cfg(feature = "tracing-log")]
        let meta = normalized_meta.as_ref().unwrap_or_else(|| event.metadata());
        #[cfg(not(feature = "tracing-log"))]
        let meta = event.metadata();

        // Our own complaints go to whatever else is listening, never back to the collector.
        if meta.target().starts_with(INTERNAL_TARGET) {
            return;
        }
        // Below threshold: don't bother visiting. Not done in `Layer::enabled`, which would hide
        // the event from every other layer, too.
        if Severity::from_record_level(meta.level()) < self.min_severity {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        let record = LogRecord {
            logger: meta.target().to_string(),
            thread_id: current_thread_id(),
            level: *meta.level(),
            millis: now_millis(),
            message: visitor.message.unwrap_or_default(),
            error: visitor.error,
        };
        self.publish(&record).unwrap_or_else(|err| self.report(&err))
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::transport::test::{listener, nothing_pending, recv, Recorder};

    use std::sync::Arc;

    use tracing::{debug, error, info, trace, warn};
    use tracing_subscriber::{
        layer::SubscriberExt, // Needed to get `with()`
        registry::Registry,
    };

    fn recording(min: Severity) -> (RecordHandler<TextFormatter, Arc<Recorder>>, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let handler = RecordHandler::new(min, Sender::with_transport(recorder.clone()));
        (handler, recorder)
    }

    #[test]
    fn filtering() {
        let (handler, recorder) = recording(Severity::Warn);
        for level in [
            tracing::Level::TRACE,
            tracing::Level::DEBUG,
            tracing::Level::INFO,
        ] {
            let rec = LogRecord::new("filter", level, "dropped");
            assert!(!handler.is_loggable(&rec));
            handler.publish(&rec).unwrap();
        }
        handler
            .publish(&LogRecord::new("filter", tracing::Level::WARN, "kept"))
            .unwrap();
        handler
            .publish(&LogRecord::new("filter", tracing::Level::ERROR, "also kept"))
            .unwrap();
        let texts = recorder.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].ends_with(" kept"));
        assert!(texts[0].contains(" WARN "));
        assert!(texts[1].ends_with("also kept"));
        assert!(texts[1].contains(" ERROR "));
    }

    #[test]
    fn record_fields() {
        let (handler, recorder) = recording(Severity::Debug);
        let rec = LogRecord::new("icecube.daq.eventBuilder", tracing::Level::INFO, "run 1234 started")
            .with_thread_id(42)
            .with_millis(0);
        handler.publish(&rec).unwrap();
        let stamp = local_time_from_millis(0)
            .format(crate::formatter::TIMESTAMP_FORMAT)
            .to_string();
        assert_eq!(
            recorder.texts(),
            vec![format!(
                "icecube.daq.eventBuilder Thread#42 INFO [{}] run 1234 started",
                stamp
            )]
        );
    }

    #[test]
    fn closed() {
        let (handler, recorder) = recording(Severity::Info);
        handler.flush();
        handler.close();
        handler.close();
        assert!(handler.is_closed());
        let err = handler
            .publish(&LogRecord::new("late", tracing::Level::ERROR, "x"))
            .unwrap_err();
        assert!(err.is_closed());
        // even a record that would have been filtered reports the closed transport
        let err = handler
            .publish(&LogRecord::new("late", tracing::Level::TRACE, "x"))
            .unwrap_err();
        assert!(err.is_closed());
        assert!(recorder.texts().is_empty());
    }

    /// The end-to-end scenario: minimum INFO; DEBUG is dropped, INFO goes out as-is, WARN goes out
    /// with its error detail following the message.
    #[test]
    fn end_to_end() {
        let (collector, port) = listener();
        let cfg = Config::builder()
            .host("127.0.0.1")
            .port(port)
            .min_severity(Severity::Info)
            .build();
        let handler = RecordHandler::from_config(&cfg).unwrap();

        handler
            .publish(&LogRecord::new("e2e", tracing::Level::DEBUG, "x"))
            .unwrap();
        assert!(nothing_pending(&collector));

        handler
            .publish(&LogRecord::new("e2e", tracing::Level::INFO, "y"))
            .unwrap();
        let packet = recv(&collector).unwrap();
        assert!(packet.ends_with(b"y"));

        let detail = ErrorDetail::new("StateError", "bad state")
            .with_frames(["daq::hub::Hub::poll (src/hub.rs:12)"]);
        handler
            .publish(&LogRecord::new("e2e", tracing::Level::WARN, "z").with_error(detail.clone()))
            .unwrap();
        let packet = String::from_utf8(recv(&collector).unwrap()).unwrap();
        assert!(packet.ends_with(&detail.render()));
        assert!(packet.ends_with(&format!("z{}", detail.render())));

        assert!(nothing_pending(&collector));
        handler.close();
    }

    #[derive(Debug)]
    struct HubTimeout;
    impl std::fmt::Display for HubTimeout {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "hub 61 timed out")
        }
    }
    impl std::error::Error for HubTimeout {}

    #[test]
    fn tracing_layer() {
        let (handler, recorder) = recording(Severity::Info);
        let subscriber = Registry::default().with(handler);
        tracing::subscriber::with_default(subscriber, || {
            trace!("Hello, 世界!");
            debug!("Hello, 世界!");
            info!("Hello, 世界!");
            warn!(target: "icecube.daq.hub", "Hello, 世界!");
            let err = HubTimeout;
            error!(error = &err as &(dyn std::error::Error + 'static), "giving up");
            // never forwarded, whatever its level
            error!(target: INTERNAL_TARGET, "internal");
        });

        let texts = recorder.texts();
        assert_eq!(texts.len(), 3);
        assert!(texts[0].ends_with("Hello, 世界!"));
        assert!(texts[0].contains(" INFO "));
        assert!(texts[1].starts_with("icecube.daq.hub Thread#"));
        assert!(texts[1].contains(" WARN "));
        assert!(texts[2].contains(" ERROR "));
        assert!(texts[2].ends_with("giving up\nError: hub 61 timed out"));
    }

    /// Counts every event it sees
    #[derive(Clone, Default)]
    struct Tally(Arc<AtomicU64>);

    impl<S: tracing::Subscriber> tracing_subscriber::layer::Layer<S> for Tally {
        fn on_event(&self, _event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn layer_failures_are_counted() {
        let (handler, recorder) = recording(Severity::Info);
        handler.close();
        let dispatch = tracing::Dispatch::new(Registry::default().with(handler));
        tracing::dispatcher::with_default(&dispatch, || {
            debug!("below threshold: never attempted");
            info!("hub 61 reporting");
        });

        let handler = dispatch
            .downcast_ref::<RecordHandler<TextFormatter, Arc<Recorder>>>()
            .unwrap();
        assert_eq!(handler.failures(), 1);
        assert_eq!(
            handler.last_failure().as_deref(),
            Some("The log transport has been closed")
        );
        assert!(recorder.texts().is_empty());
    }

    #[test]
    fn filtered_events_still_reach_other_layers() {
        let (handler, recorder) = recording(Severity::Warn);
        let tally = Tally::default();
        let subscriber = Registry::default().with(handler).with(tally.clone());
        tracing::subscriber::with_default(subscriber, || {
            debug!("one");
            info!("two");
            warn!("three");
        });
        assert_eq!(tally.0.load(Ordering::Relaxed), 3);
        let texts = recorder.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].ends_with("three"));
    }
}
