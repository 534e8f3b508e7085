//! Minimal HTTP/1.1 framing for the remote store's REST interface.
//!
//! Only what the device needs: request heads for one-shot writes and
//! for the event stream, status-line parsing, and secret redaction for
//! log output. Bodies are JSON text produced by `serde_json`.

use core::fmt;

use crate::error::{Error, Result};

/// Write verbs the client issues. Both carry a JSON body and close the
/// connection after the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Merge the body into the object at the path.
    Patch,
    /// Replace the value at the path.
    Put,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "PATCH",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request for a one-shot write of `body` to `{path}.json`.
pub fn write_request(method: Method, host: &str, path: &str, secret: &str, body: &str) -> String {
    format!(
        "{method} {path}.json?auth={secret} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\
         \r\n\
         {body}",
        len = body.len(),
    )
}

/// Request that opens a server-push event stream on `{key}.json`.
pub fn stream_request(host: &str, key: &str, secret: &str) -> String {
    format!(
        "GET {key}.json?auth={secret} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Accept: text/event-stream\r\n\
         Connection: keep-alive\r\n\
         \r\n"
    )
}

/// Parse the code out of a status line such as `HTTP/1.1 200 OK`.
pub fn parse_status(line: &str) -> Option<u16> {
    let mut parts = line.split_ascii_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    let code = parts.next()?;
    if code.len() != 3 {
        return None;
    }
    code.parse().ok()
}

/// Status code of a complete response. Fails on a missing or garbled
/// status line and on any non-2xx code.
pub fn check_response(response: &[u8]) -> Result<u16> {
    let head = response.split(|&b| b == b'\n').next().unwrap_or_default();
    let line = core::str::from_utf8(head).map_err(|_| Error::MalformedResponse)?;
    let code = parse_status(line).ok_or(Error::MalformedResponse)?;
    if (200..300).contains(&code) {
        Ok(code)
    } else {
        Err(Error::Status(code))
    }
}

/// Replace every occurrence of `secret` with `***`.
pub fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_owned();
    }
    text.replace(secret, "***")
}
