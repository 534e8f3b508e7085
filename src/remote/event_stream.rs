//! Line grammar of the server-push event stream.
//!
//! Only `data:` lines carry anything the device acts on. The remote store
//! wraps each update as `{"path": ..., "data": <payload>}` and emits
//! `data: null` as a keep-alive; every other field line (`event:`, `id:`,
//! blank separators, HTTP headers) is skipped.

use std::io;

use futures_lite::io::{AsyncBufRead, AsyncBufReadExt};
use serde_json::Value;

const DATA_PREFIX: &[u8] = b"data:";
const PAYLOAD_FIELD: &str = "data";

/// Longest stream line kept in memory. Longer lines are drained and
/// reported as [`StreamEvent::Malformed`].
pub const MAX_LINE_LEN: usize = 4096;

/// Outcome of parsing one stream line.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Payload to hand to the update handler.
    Update(Value),
    /// `data: null`.
    KeepAlive,
    /// Not a data line, or a data object without a payload field.
    Ignored,
    /// A data line whose remainder is not valid JSON, or an oversized line.
    Malformed,
}

pub fn parse_line(line: &[u8]) -> StreamEvent {
    let Some(rest) = line.trim_ascii_end().strip_prefix(DATA_PREFIX) else {
        return StreamEvent::Ignored;
    };

    let value: Value = match serde_json::from_slice(rest.trim_ascii()) {
        Ok(v) => v,
        Err(_) => return StreamEvent::Malformed,
    };

    match value {
        Value::Null => StreamEvent::KeepAlive,
        Value::Object(mut obj) => match obj.remove(PAYLOAD_FIELD) {
            Some(payload) => StreamEvent::Update(payload),
            None => StreamEvent::Ignored,
        },
        _ => StreamEvent::Ignored,
    }
}

/// Result of one [`read_line`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRead {
    /// A line (possibly unterminated at EOF) is in the buffer.
    Line,
    /// A line longer than the limit was consumed and discarded.
    Oversized,
    /// The peer closed the stream before any byte arrived.
    Eof,
}

/// Read raw bytes up to and including the next `\n` into `buf`.
///
/// At most `max` bytes are buffered. Past that the rest of the line is
/// drained without being stored, so memory stays bounded whatever the
/// peer sends.
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut seen = false;
    let mut oversized = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            break;
        }
        seen = true;

        let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
            Some(i) => (&available[..=i], true),
            None => (available, false),
        };
        let n = chunk.len();

        if !oversized {
            if buf.len() + n > max {
                oversized = true;
                buf.clear();
            } else {
                buf.extend_from_slice(chunk);
            }
        }
        reader.consume(n);

        if done {
            break;
        }
    }

    Ok(match (seen, oversized) {
        (false, _) => LineRead::Eof,
        (true, true) => LineRead::Oversized,
        (true, false) => LineRead::Line,
    })
}
