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

//! Wire formatting primitives.
//!
//! This module defines the [`Formatter`] trait, along with the default, plain-text wire format
//! [`TextFormatter`].

use crate::{error::Result, event::LogEvent};

use bytes::buf::BufMut;

use std::ops::Deref;

/// Operations all formatters must support
/// ======================================
///
/// # Introduction
///
/// Getting a log event to the collector happens in three parts:
///
/// 1. reducing whatever the front-end handed us to a canonical [`LogEvent`]
///
/// 2. rendering that event into a single packet
///
/// 3. transporting that packet to the collector
///
/// [`Formatter`] implements step 2.
///
/// # The suffix contract
///
/// Collectors (and our own tests) are entitled to recover the message by looking at nothing but
/// the tail of the packet. Every implementation must therefore put any structured prefix (logger,
/// thread, severity, timestamp) _before_ the message, and end the packet with the message
/// followed, only if one is attached, by [`ErrorDetail::render`].
///
/// [`ErrorDetail::render`]: crate::event::ErrorDetail::render
///
/// # Design
///
/// The associated type `Output` need only dereference to a slice of `u8`, which is all a
/// datagram transport wants.
pub trait Formatter {
    type Output: Deref<Target = [u8]>;
    fn format(&self, event: &LogEvent) -> Result<Self::Output>;
}

/// Append the message & any rendered error detail; the last thing every formatter does.
pub(crate) fn put_body(buf: &mut Vec<u8>, event: &LogEvent) {
    buf.put_slice(event.message.as_bytes());
    if let Some(error) = event.error {
        buf.put_slice(error.render().as_bytes());
    }
}

/// The default wire format:
///
/// ```text
/// <logger> <thread> <SEVERITY> [<yyyy-mm-dd HH:MM:SS.mmm +zzzz>] <message>[<error detail>]
/// ```
///
/// Timestamps are in the local time zone of the producing process.
#[derive(Clone, Debug, Default)]
pub struct TextFormatter;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %z";

impl Formatter for TextFormatter {
    type Output = Vec<u8>;
    fn format(&self, event: &LogEvent) -> Result<Vec<u8>> {
        let mut buf = format!(
            "{} {} {} [{}] ",
            event.logger,
            event.thread,
            event.severity,
            event.timestamp.format(TIMESTAMP_FORMAT)
        )
        .into_bytes();
        put_body(&mut buf, event);
        Ok(buf)
    }
}
