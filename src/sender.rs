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

//! The transport sender: a [`Formatter`] & a [`Transport`], glued together.

use crate::{
    error::Result,
    event::LogEvent,
    formatter::{Formatter, TextFormatter},
    transport::{Transport, UdpTransport},
};

/// Turns [`LogEvent`]s into packets & ships them.
///
/// Every adapter in this crate owns one of these. Both type parameters default to what a plain
/// UDP collector wants.
pub struct Sender<F: Formatter = TextFormatter, T: Transport = UdpTransport> {
    formatter: F,
    transport: T,
}

impl Sender<TextFormatter, UdpTransport> {
    /// Attempt to construct a [`Sender`] that will send plain-text packets via UDP to
    /// `host`:`port`
    pub fn open(host: &str, port: u16) -> Result<Self> {
        Ok(Sender {
            formatter: TextFormatter,
            transport: UdpTransport::open(host, port)?,
        })
    }
}

impl<T: Transport> Sender<TextFormatter, T> {
    /// Construct a [`Sender`] that will send plain-text packets via `transport`
    pub fn with_transport(transport: T) -> Self {
        Sender {
            formatter: TextFormatter,
            transport,
        }
    }
}

impl<F: Formatter, T: Transport> Sender<F, T> {
    /// construct a Sender with custom inners
    pub fn new(formatter: F, transport: T) -> Self {
        Sender {
            formatter,
            transport,
        }
    }
    /// Format `event` & send it as a single packet. Nothing is retried; a local failure comes
    /// straight back to the caller.
    pub fn send(&self, event: &LogEvent) -> Result<usize> {
        let packet = self.formatter.format(event)?;
        self.transport.send(&packet)
    }
    pub fn close(&self) {
        self.transport.close()
    }
    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
