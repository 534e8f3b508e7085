//! Unified error types for the doorlink firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the
//! long-running tasks can log any failure uniformly. All variants are
//! `Copy` so they can be handed to loggers and backoff logic without
//! allocation.

use core::fmt;

use crate::app::ports::ConnectivityError;
use crate::remote::transport::TransportError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Connecting, reading or writing the remote connection failed.
    Transport(TransportError),
    /// The peer closed the event stream (zero-byte read).
    StreamClosed,
    /// The remote store answered with a non-2xx status.
    Status(u16),
    /// The reply did not start with a parseable HTTP status line.
    MalformedResponse,
    /// A value could not be serialised to JSON.
    Encode,
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// The network link rejected the request.
    Connectivity(ConnectivityError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::StreamClosed => write!(f, "stream closed by peer"),
            Self::Status(code) => write!(f, "remote replied with status {code}"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Encode => write!(f, "JSON encode failed"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Connectivity(e) => write!(f, "connectivity: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ConnectivityError> for Error {
    fn from(e: ConnectivityError) -> Self {
        Self::Connectivity(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Transport(e.into())
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
