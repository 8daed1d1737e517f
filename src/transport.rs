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

//! The transport layer.
//!
//! This module defines the [`Transport`] trait that all implementations must support, as well as
//! the UDP implementation.
//!
//! # Examples
//!
//! To send log packets over UDP to a collector listening on port 6666 on localhost:
//!
//! ```rust
//! use daq_log::transport::UdpTransport;
//! let transpo = UdpTransport::open("127.0.0.1", 6666).unwrap();
//! ```
//!
//! On a host that doesn't exist:
//!
//! ```rust
//! use daq_log::transport::UdpTransport;
//! let transpo = UdpTransport::open("some-host.domain.invalid", 5514);
//! assert!(transpo.is_err()); // no such host, after all
//! ```
//!
//! # Delivery
//!
//! Delivery is best-effort: one datagram per packet, no acknowledgement, no retry. A packet
//! larger than [`MAX_DATAGRAM`] is refused outright with [`Error::Transport`]; it is neither
//! split nor truncated, so callers logging very large messages should expect that error.

use crate::error::{Error, Result};

use backtrace::Backtrace;
use parking_lot::RwLock;

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

/// The largest UDP payload that can be carried over IPv4.
pub const MAX_DATAGRAM: usize = 65_507;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
///
/// Implementations are shared between every thread that logs, so all operations take `&self`.
pub trait Transport {
    /// Send one packet; returns the number of bytes sent.
    fn send(&self, buf: &[u8]) -> Result<usize>;
    /// Release the underlying resource. Calling this more than once is harmless, and every
    /// subsequent [`send`](Transport::send) fails with [`Error::ClosedTransport`].
    fn close(&self);
    fn is_closed(&self) -> bool;
}

/// Sending log packets via UDP datagrams.
///
/// The socket lives behind a reader-writer lock: any number of threads may be sending at once
/// (each `send(2)` on a datagram socket is atomic, so packets never interleave), while
/// [`close`](Transport::close) waits for in-flight sends to finish before dropping the socket.
pub struct UdpTransport {
    socket: RwLock<Option<UdpSocket>>,
    peer: SocketAddr,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    ///
    /// `addr` is resolved once, here; the first address it resolves to is used for the lifetime
    /// of the transport.
    pub fn new<A: ToSocketAddrs + std::fmt::Debug>(addr: A) -> Result<UdpTransport> {
        let resolution = |err: std::io::Error| Error::Resolution {
            target: format!("{:?}", addr),
            source: Box::new(err),
            back: Backtrace::new(),
        };
        let peer = addr
            .to_socket_addrs()
            .map_err(resolution)?
            .next()
            .ok_or_else(|| {
                resolution(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no addresses found",
                ))
            })?;
        // Bind to any available port on an address of the same family as the collector...
        let local: SocketAddr = if peer.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(local).map_err(resolution)?;
        // and connect to it, so that `send()` needn't repeat the address:
        socket.connect(peer).map_err(resolution)?;
        Ok(UdpTransport {
            socket: RwLock::new(Some(socket)),
            peer,
        })
    }
    /// Construct a [`Transport`] implementation via UDP at `host`:`port`
    pub fn open(host: &str, port: u16) -> Result<UdpTransport> {
        UdpTransport::new((host, port))
    }
    /// The collector's address, as resolved at construction
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        if buf.len() > MAX_DATAGRAM {
            return Err(Error::transport(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "{}-byte packet exceeds the {}-byte datagram limit",
                    buf.len(),
                    MAX_DATAGRAM
                ),
            )));
        }
        match self.socket.read().as_ref() {
            Some(socket) => socket.send(buf).map_err(Error::transport),
            None => Err(Error::closed()),
        }
    }
    fn close(&self) {
        // `take()` leaves `None` behind, so a second close finds nothing to drop.
        self.socket.write().take();
    }
    fn is_closed(&self) -> bool {
        self.socket.read().is_none()
    }
}

/// Lets several adapters share one transport (and so one socket).
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
    fn close(&self) {
        (**self).close()
    }
    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

#[cfg(test)]
pub(crate) mod test {

    use super::*;

    use parking_lot::Mutex;

    use std::time::Duration;

    /// A [`Transport`] that just remembers what it was asked to send
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub(crate) packets: Mutex<Vec<Vec<u8>>>,
        closed: Mutex<bool>,
    }

    impl Recorder {
        pub(crate) fn texts(&self) -> Vec<String> {
            self.packets
                .lock()
                .iter()
                .map(|p| String::from_utf8(p.clone()).unwrap())
                .collect()
        }
    }

    impl Transport for Recorder {
        fn send(&self, buf: &[u8]) -> Result<usize> {
            if *self.closed.lock() {
                return Err(Error::closed());
            }
            self.packets.lock().push(buf.to_vec());
            Ok(buf.len())
        }
        fn close(&self) {
            *self.closed.lock() = true;
        }
        fn is_closed(&self) -> bool {
            *self.closed.lock()
        }
    }

    /// A local collector; stands in for the real thing
    pub(crate) fn listener() -> (UdpSocket, u16) {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        sock.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let port = sock.local_addr().unwrap().port();
        (sock, port)
    }

    pub(crate) fn recv(sock: &UdpSocket) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        sock.recv(&mut buf).ok().map(|n| buf[..n].to_vec())
    }

    /// Wait briefly for a packet that shouldn't come
    pub(crate) fn nothing_pending(sock: &UdpSocket) -> bool {
        sock.set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let quiet = recv(sock).is_none();
        sock.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        quiet
    }

    #[test]
    fn udp_round_trip() {
        let (collector, port) = listener();
        let transpo = UdpTransport::open("127.0.0.1", port).unwrap();
        assert_eq!(transpo.peer().port(), port);
        assert_eq!(transpo.send(b"Hello, world!").unwrap(), 13);
        assert_eq!(recv(&collector).unwrap(), b"Hello, world!");
    }

    #[test]
    fn bad_host() {
        let err = UdpTransport::open("some-host.domain.invalid", 5514)
            .err()
            .unwrap();
        assert!(matches!(err, Error::Resolution { .. }));
    }

    #[test]
    fn close_is_idempotent() {
        let (_collector, port) = listener();
        let transpo = UdpTransport::open("127.0.0.1", port).unwrap();
        assert!(!transpo.is_closed());
        transpo.close();
        transpo.close();
        assert!(transpo.is_closed());
        assert!(transpo.send(b"too late").unwrap_err().is_closed());
    }

    #[test]
    fn oversized() {
        let (collector, port) = listener();
        let transpo = UdpTransport::open("127.0.0.1", port).unwrap();
        let big = vec![b'x'; MAX_DATAGRAM + 1];
        assert!(matches!(
            transpo.send(&big).unwrap_err(),
            Error::Transport { .. }
        ));
        assert!(nothing_pending(&collector));
    }
}
