//! Client for the remote key-value store.
//!
//! Two independent operations share the host and secret but no mutable
//! state:
//!
//! - **One-shot writes** (`patch_value`, `put_value`): fresh connection,
//!   one request, read the reply (at most [`MAX_RESPONSE_LEN`] bytes), close. REMOTE_IO is shown for the whole
//!   exchange and NORMAL restored on every exit path. Errors go back to
//!   the caller; nothing is retried here.
//! - **Watch** (`watch_key`): a long-lived event stream with unbounded
//!   reconnect and exponential backoff. Errors never leave the loop.
//!
//! ```text
//!   connect ──▶ GET (event-stream) ──▶ read_line ──▶ parse ──▶ on_update
//!      ▲                                   │ 0 bytes / error
//!      └──────── sleep(backoff) ◀──────────┘
//! ```

use core::convert::Infallible;

use futures_lite::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use log::{debug, info, warn};
use serde::Serialize;

use crate::app::ports::{Sleeper, UpdateHandler};
use crate::drivers::led_patterns::{BlinkPattern, PatternSlot};
use crate::error::{Error, Result};
use crate::remote::backoff::Backoff;
use crate::remote::event_stream::{self, LineRead, MAX_LINE_LEN, StreamEvent, parse_line};
use crate::remote::http::{self, Method};
use crate::remote::transport::{Connector, HTTPS_PORT};

/// Largest reply accepted from a one-shot write. The store echoes the
/// written value, so real replies are a few hundred bytes.
pub const MAX_RESPONSE_LEN: usize = 4096;

pub struct RemoteStateClient<'a, C, S> {
    connector: C,
    sleeper: S,
    host: String,
    secret: String,
    slot: &'a PatternSlot,
}

impl<'a, C: Connector, S: Sleeper> RemoteStateClient<'a, C, S> {
    pub fn new(connector: C, sleeper: S, host: &str, secret: &str, slot: &'a PatternSlot) -> Self {
        Self {
            connector,
            sleeper,
            host: host.to_owned(),
            secret: secret.to_owned(),
            slot,
        }
    }

    /// Merge `value` into the object at `path`. Returns the HTTP status.
    pub async fn patch_value<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<u16> {
        let body = serde_json::to_string(value).map_err(|_| Error::Encode)?;
        self.exchange(Method::Patch, path, &body).await
    }

    /// Replace the value at `path`. Returns the HTTP status.
    pub async fn put_value<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> Result<u16> {
        let body = serde_json::to_string(value).map_err(|_| Error::Encode)?;
        self.exchange(Method::Put, path, &body).await
    }

    async fn exchange(&self, method: Method, path: &str, body: &str) -> Result<u16> {
        let request = http::write_request(method, &self.host, path, &self.secret, body);
        debug!("{} {}: request\n{}", method, path, http::redact(&request, &self.secret));

        let _io = self.slot.hold(BlinkPattern::REMOTE_IO, BlinkPattern::NORMAL);

        let mut conn = self.connector.connect(&self.host, HTTPS_PORT).await?;
        conn.write_all(request.as_bytes()).await?;
        conn.flush().await?;

        let mut response = Vec::new();
        (&mut conn)
            .take(MAX_RESPONSE_LEN as u64 + 1)
            .read_to_end(&mut response)
            .await?;
        if let Err(e) = conn.close().await {
            debug!("{} {}: close: {}", method, path, e);
        }
        drop(conn);

        if response.len() > MAX_RESPONSE_LEN {
            warn!("{} {}: reply over {} bytes", method, path, MAX_RESPONSE_LEN);
            return Err(Error::MalformedResponse);
        }
        let code = http::check_response(&response)?;
        info!("{} {}: done ({})", method, path, code);
        Ok(code)
    }

    /// Watch `key` forever, handing each payload to `handler` in arrival
    /// order. Never returns.
    pub async fn watch_key<H: UpdateHandler>(&self, key: &str, handler: &H) {
        let mut backoff = Backoff::new();
        loop {
            let err = match self.stream_once(key, handler, &mut backoff).await {
                Ok(never) => match never {},
                Err(e) => e,
            };
            let wait = backoff.next_wait();
            warn!("stream {}: {}; reconnecting in {}s", key, err, wait.as_secs());
            self.sleeper.sleep(wait).await;
        }
    }

    /// One connection's worth of streaming. Only ever ends in an error;
    /// the connection is dropped on the way out.
    async fn stream_once<H: UpdateHandler>(
        &self,
        key: &str,
        handler: &H,
        backoff: &mut Backoff,
    ) -> Result<Infallible> {
        let mut conn = self.connector.connect(&self.host, HTTPS_PORT).await?;
        let request = http::stream_request(&self.host, key, &self.secret);
        conn.write_all(request.as_bytes()).await?;
        conn.flush().await?;

        let mut reader = BufReader::new(conn);
        let mut line = Vec::with_capacity(256);
        let mut first = true;

        loop {
            let event = match event_stream::read_line(&mut reader, &mut line, MAX_LINE_LEN).await? {
                LineRead::Eof => return Err(Error::StreamClosed),
                LineRead::Oversized => StreamEvent::Malformed,
                LineRead::Line => parse_line(&line),
            };
            backoff.reset();

            if first {
                first = false;
                match core::str::from_utf8(&line).ok().and_then(http::parse_status) {
                    Some(200) => info!("stream {}: connected", key),
                    Some(code) => warn!("stream {}: status {}", key, code),
                    None => {}
                }
            }

            match event {
                StreamEvent::Update(payload) => {
                    debug!("stream {}: update {}", key, payload);
                    handler.on_update(key, payload).await;
                }
                StreamEvent::KeepAlive => debug!("stream {}: keep-alive", key),
                StreamEvent::Malformed => warn!("stream {}: discarding malformed line", key),
                StreamEvent::Ignored => {}
            }
        }
    }
}
