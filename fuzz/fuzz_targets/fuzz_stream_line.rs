//! Fuzz target: `event_stream::parse_line`
//!
//! Any raw line off the wire must classify without panicking, and a
//! line that does not start with `data:` is always skipped.
//!
//! cargo fuzz run fuzz_stream_line

#![no_main]

use doorlink::remote::event_stream::{StreamEvent, parse_line};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let event = parse_line(data);
    if !data.trim_ascii_end().starts_with(b"data:") {
        assert_eq!(event, StreamEvent::Ignored);
    }
});
