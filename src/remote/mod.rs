//! Remote key-value store client: transport port, HTTP framing, event
//! stream grammar, reconnect backoff and the client itself.

pub mod backoff;
pub mod client;
pub mod event_stream;
pub mod http;
pub mod transport;

pub use client::RemoteStateClient;
