//! TLS client transport adapter.
//!
//! Implements [`Connector`](crate::remote::transport::Connector) for the
//! remote store: a non-blocking TCP socket registered with the
//! `async-io-mini` reactor, wrapped in an mbedTLS client session that
//! verifies the server against the ESP-IDF certificate bundle.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real lwIP socket + mbedTLS session.
//! - **all other targets**: not provided. Host tests drive the client
//!   through in-memory connectors instead.
//!
//! ## Connection model
//!
//! 1. `connect()` resolves the host on a helper thread (see
//!    [`dns`](crate::adapters::dns)), connects the socket through the
//!    reactor and runs the handshake, parking on socket readiness
//!    whenever mbedTLS reports WANT_READ / WANT_WRITE.
//! 2. The returned [`TlsStream`] implements `AsyncRead` + `AsyncWrite`.
//! 3. Dropping the stream sends close_notify, frees the session and
//!    closes the socket.

#[cfg(target_os = "espidf")]
mod esp_impl;

#[cfg(target_os = "espidf")]
pub use esp_impl::{TlsConnector, TlsStream};
