//! Transport abstraction: a connector that opens fresh, secured byte
//! streams to the remote store.
//!
//! The client is generic over [`Connector`], so the device TLS stack and
//! the host test doubles plug in without changes to the request logic.
//! A connection is released by dropping it.

#![allow(async_fn_in_trait)]

use core::fmt;
use std::io;

use futures_lite::io::{AsyncRead, AsyncWrite};

/// Default port for secured connections to the remote store.
pub const HTTPS_PORT: u16 = 443;

/// Errors originating from the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// DNS resolution or TCP connect failed.
    Connect,
    /// TLS handshake or session error.
    Tls,
    /// Socket read or write failed.
    Io,
    /// The peer closed or reset the connection mid-exchange.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect failed"),
            Self::Tls => write!(f, "TLS handshake or session error"),
            Self::Io => write!(f, "socket I/O error"),
            Self::Closed => write!(f, "connection closed by peer"),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => Self::Closed,
            _ => Self::Io,
        }
    }
}

/// Opens connections to `host:port`.
pub trait Connector {
    /// A bidirectional byte stream. Dropping it closes the connection.
    type Connection: AsyncRead + AsyncWrite + Unpin;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Connection, TransportError>;
}

impl<C: Connector> Connector for &C {
    type Connection = C::Connection;

    async fn connect(&self, host: &str, port: u16) -> Result<Self::Connection, TransportError> {
        (**self).connect(host, port).await
    }
}
