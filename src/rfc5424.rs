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

//! RFC [5424]-compliant wire format
//!
//! [5424]: https://datatracker.ietf.org/doc/html/rfc5424
//!
//! [`Rfc5424`] is a [`Formatter`] for collectors that speak syslog. The canonical event maps onto
//! the RFC 5424 header like so:
//!
//! | header field | source                                        |
//! |--------------|-----------------------------------------------|
//! | PRI          | facility, or'd with the severity's [`Level`]  |
//! | TIMESTAMP    | event timestamp, microsecond precision        |
//! | HOSTNAME     | this host                                     |
//! | APP-NAME     | logger name                                   |
//! | PROCID       | this process' pid                             |
//! | MSGID        | thread label                                  |
//!
//! No structured data is emitted, and the MSG is the message followed by any error detail, so the
//! packet still ends with the message.

use crate::{
    error::{Error, Result},
    event::LogEvent,
    facility::{priority, Facility, Level},
    formatter::{put_body, Formatter},
};

use backtrace::Backtrace;
use bytes::buf::BufMut;
use chrono::SecondsFormat;

type StdResult<T, E> = std::result::Result<T, E>;

/// Header fields are printable US-ASCII only (PRINTUSASCII in the RFC's ABNF), and bounded in
/// length; anything else is replaced with '_' & anything too long is truncated. An empty field
/// becomes the NILVALUE.
fn header_field(text: &str, max: usize) -> String {
    let field: String = text
        .chars()
        .take(max)
        .map(|c| if ('!'..='~').contains(&c) { c } else { '_' })
        .collect();
    if field.is_empty() {
        "-".to_string()
    } else {
        field
    }
}

/// A [`Vec<u8>`] instance with the additional constraint that it must be less than 256 bytes
/// of ASCII.
pub struct Rfc5424Hostname(Vec<u8>);

impl Rfc5424Hostname {
    /// An RFC 5424-compliant hostname is at most 255 bytes of ASCII
    pub fn new(bytes: Vec<u8>) -> Result<Rfc5424Hostname> {
        if bytes.is_ascii() && !bytes.is_empty() && bytes.len() < 256 {
            Ok(Rfc5424Hostname(bytes))
        } else {
            Err(Error::BadRfc5424Hostname {
                name: bytes,
                back: Backtrace::new(),
            })
        }
    }
}

impl std::default::Default for Rfc5424Hostname {
    /// Try [gethostname()], then any local IP address, then give up & use the NILVALUE.
    ///
    /// [gethostname()]: https://man7.org/linux/man-pages/man2/gethostname.2.html
    fn default() -> Self {
        hostname::get()
            .ok()
            .and_then(|hn| Rfc5424Hostname::new(hn.to_string_lossy().into_owned().into_bytes()).ok())
            .or_else(|| {
                local_ip_address::local_ip()
                    .ok()
                    .and_then(|ip| Rfc5424Hostname::new(ip.to_string().into_bytes()).ok())
            })
            .unwrap_or_else(|| Rfc5424Hostname(b"-".to_vec()))
    }
}

impl std::convert::TryFrom<String> for Rfc5424Hostname {
    type Error = Error;
    fn try_from(x: String) -> StdResult<Self, Self::Error> {
        Rfc5424Hostname::new(x.into_bytes())
    }
}

/// A formatter that produces RFC [5424]-conformant syslog messages.
///
/// [5424]: https://datatracker.ietf.org/doc/html/rfc5424
pub struct Rfc5424 {
    facility: Facility,
    hostname: Rfc5424Hostname,
    pid: String,
    with_bom: bool,
}

impl std::default::Default for Rfc5424 {
    fn default() -> Self {
        Rfc5424 {
            facility: Facility::default(),
            hostname: Rfc5424Hostname::default(),
            pid: format!("{}", std::process::id()),
            with_bom: false,
        }
    }
}

pub struct Rfc5424Builder {
    imp: Rfc5424,
}

impl Rfc5424Builder {
    pub fn facility(mut self, facility: Facility) -> Self {
        self.imp.facility = facility;
        self
    }
    pub fn hostname(mut self, hostname: Rfc5424Hostname) -> Self {
        self.imp.hostname = hostname;
        self
    }
    pub fn hostname_as_string(mut self, hostname: String) -> Result<Self> {
        self.imp.hostname = Rfc5424Hostname::try_from(hostname)?;
        Ok(self)
    }
    pub fn pid(mut self, pid: u32) -> Self {
        self.imp.pid = format!("{}", pid);
        self
    }
    pub fn with_bom(mut self, with_bom: bool) -> Self {
        self.imp.with_bom = with_bom;
        self
    }
    pub fn build(self) -> Rfc5424 {
        self.imp
    }
}

impl Rfc5424 {
    pub fn builder() -> Rfc5424Builder {
        Rfc5424Builder {
            imp: Rfc5424::default(),
        }
    }
}

impl Formatter for Rfc5424 {
    type Output = Vec<u8>;
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>> {
        let mut buf = format!(
            "<{}>1 {} ",
            priority(self.facility, Level::from(event.severity)),
            event
                .timestamp
                .to_rfc3339_opts(SecondsFormat::Micros, false)
        )
        .into_bytes();
        buf.put_slice(&self.hostname.0);
        buf.put_slice(
            format!(
                " {} {} {} - ",
                header_field(event.logger, 48),
                self.pid,
                header_field(&event.thread, 32)
            )
            .as_bytes(),
        );

        // "If a syslog application encodes MSG in UTF-8, the string MUST start with the Unicode
        // byte order mask (BOM)"
        if self.with_bom {
            buf.put_slice(&[0xef, 0xbb, 0xbf]);
        }

        put_body(&mut buf, event);
        Ok(buf)
    }
}
