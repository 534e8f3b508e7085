//! Mock hardware and network adapters for integration tests.
//!
//! Every mock records what the firmware did to it so tests can assert on
//! the full history without real GPIO, radio or sockets.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::io;
use std::net::Ipv4Addr;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_lite::future;
use futures_lite::io::{AsyncRead, AsyncWrite, Cursor};
use serde_json::Value;

use doorlink::app::connectivity::WifiCredentials;
use doorlink::app::ports::{
    ConnectivityError, ConnectivityPort, SensorLine, Sleeper, SystemControl, TransitionHandler, UpdateHandler,
};
use doorlink::drivers::led_patterns::{BlinkPattern, PatternSlot};
use doorlink::error::Result;
use doorlink::events::EdgeSignal;
use doorlink::remote::transport::{Connector, TransportError};
use doorlink::sensors::SensorState;

/// Poll until `cond` holds, yielding between checks. Used with
/// `future::or` to stop tasks that never return.
pub async fn until(cond: impl Fn() -> bool) {
    while !cond() {
        future::yield_now().await;
    }
}

pub fn leaked_signal() -> &'static EdgeSignal {
    Box::leak(Box::new(EdgeSignal::new()))
}

// ── Sleeper ───────────────────────────────────────────────────

/// Records each requested duration (and the blink pattern current at
/// that moment, if observing a slot), then yields once.
#[derive(Default)]
pub struct RecordingSleeper<'a> {
    slot: Option<&'a PatternSlot>,
    log: RefCell<Vec<(Duration, Option<BlinkPattern>)>>,
}

#[allow(dead_code)]
impl<'a> RecordingSleeper<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observing(slot: &'a PatternSlot) -> Self {
        Self {
            slot: Some(slot),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn durations(&self) -> Vec<Duration> {
        self.log.borrow().iter().map(|(d, _)| *d).collect()
    }

    pub fn secs(&self) -> Vec<u64> {
        self.durations().iter().map(Duration::as_secs).collect()
    }

    pub fn patterns(&self) -> Vec<Option<BlinkPattern>> {
        self.log.borrow().iter().map(|(_, p)| *p).collect()
    }

    pub fn count(&self) -> usize {
        self.log.borrow().len()
    }

    /// Number of sleeps of exactly `d`.
    pub fn count_of(&self, d: Duration) -> usize {
        self.log.borrow().iter().filter(|(x, _)| *x == d).count()
    }
}

impl Sleeper for &RecordingSleeper<'_> {
    async fn sleep(&self, duration: Duration) {
        let pattern = self.slot.map(PatternSlot::get);
        self.log.borrow_mut().push((duration, pattern));
        future::yield_now().await;
    }
}

// ── Sensor line ───────────────────────────────────────────────

/// Input line that returns scripted levels, then repeats the last one.
pub struct ScriptedLine {
    levels: RefCell<VecDeque<bool>>,
    last: Cell<bool>,
    pub reads: Cell<u32>,
    pub rearms: Cell<u32>,
    pub subscribed: Cell<bool>,
}

#[allow(dead_code)]
impl ScriptedLine {
    pub fn new(levels: &[bool]) -> Self {
        Self {
            levels: RefCell::new(levels.iter().copied().collect()),
            last: Cell::new(true),
            reads: Cell::new(0),
            rearms: Cell::new(0),
            subscribed: Cell::new(false),
        }
    }

    pub fn push(&self, level: bool) {
        self.levels.borrow_mut().push_back(level);
    }
}

impl SensorLine for &ScriptedLine {
    fn is_high(&mut self) -> bool {
        self.reads.set(self.reads.get() + 1);
        if let Some(level) = self.levels.borrow_mut().pop_front() {
            self.last.set(level);
        }
        self.last.get()
    }

    fn subscribe(&mut self, _signal: &'static EdgeSignal) -> Result<()> {
        self.subscribed.set(true);
        Ok(())
    }

    fn rearm(&mut self) {
        self.rearms.set(self.rearms.get() + 1);
    }
}

// ── Output pin ────────────────────────────────────────────────

/// Output pin whose clones share one level history.
#[derive(Clone, Default)]
pub struct MockPin {
    history: Rc<RefCell<Vec<bool>>>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn history(&self) -> Vec<bool> {
        self.history.borrow().clone()
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> core::result::Result<(), Infallible> {
        self.history.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Infallible> {
        self.history.borrow_mut().push(true);
        Ok(())
    }
}

// ── Network ───────────────────────────────────────────────────

/// What the next connection attempt does.
#[allow(dead_code)]
pub enum Script {
    /// `connect` fails.
    Refuse,
    /// Connection that serves these bytes, then EOF.
    Respond(Vec<u8>),
    /// Connection whose first read fails with a reset.
    Reset,
}

/// Connector that plays one [`Script`] per connection attempt and
/// records every byte written. Attempts beyond the script are refused.
#[derive(Default)]
pub struct MockConnector<'a> {
    scripts: RefCell<VecDeque<Script>>,
    slot: Option<&'a PatternSlot>,
    requests: RefCell<Vec<Rc<RefCell<Vec<u8>>>>>,
    connects: Cell<usize>,
    live: Rc<Cell<usize>>,
    patterns: RefCell<Vec<BlinkPattern>>,
}

#[allow(dead_code)]
impl<'a> MockConnector<'a> {
    pub fn new(scripts: impl IntoIterator<Item = Script>) -> Self {
        Self {
            scripts: RefCell::new(scripts.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Also record the blink pattern current at each connect.
    pub fn observing(mut self, slot: &'a PatternSlot) -> Self {
        self.slot = Some(slot);
        self
    }

    pub fn push(&self, script: Script) {
        self.scripts.borrow_mut().push_back(script);
    }

    pub fn connects(&self) -> usize {
        self.connects.get()
    }

    /// Connections not yet dropped.
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Bytes written on each accepted connection, as text.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .borrow()
            .iter()
            .map(|buf| String::from_utf8_lossy(&buf.borrow()).into_owned())
            .collect()
    }

    pub fn patterns_at_connect(&self) -> Vec<BlinkPattern> {
        self.patterns.borrow().clone()
    }
}

impl Connector for MockConnector<'_> {
    type Connection = MockConn;

    async fn connect(&self, _host: &str, _port: u16) -> core::result::Result<MockConn, TransportError> {
        self.connects.set(self.connects.get() + 1);
        if let Some(slot) = self.slot {
            self.patterns.borrow_mut().push(slot.get());
        }

        let script = self.scripts.borrow_mut().pop_front().unwrap_or(Script::Refuse);
        let (input, fail_read) = match script {
            Script::Refuse => return Err(TransportError::Connect),
            Script::Respond(bytes) => (bytes, false),
            Script::Reset => (Vec::new(), true),
        };

        let output = Rc::new(RefCell::new(Vec::new()));
        self.requests.borrow_mut().push(Rc::clone(&output));
        self.live.set(self.live.get() + 1);

        Ok(MockConn {
            input: Cursor::new(input),
            output,
            fail_read,
            live: Rc::clone(&self.live),
        })
    }
}

pub struct MockConn {
    input: Cursor<Vec<u8>>,
    output: Rc<RefCell<Vec<u8>>>,
    fail_read: bool,
    live: Rc<Cell<usize>>,
}

impl Drop for MockConn {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

impl AsyncRead for MockConn {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        if self.fail_read {
            return Poll::Ready(Err(io::ErrorKind::ConnectionReset.into()));
        }
        Pin::new(&mut self.input).poll_read(cx, buf)
    }
}

impl AsyncWrite for MockConn {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.output.borrow_mut().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Minimal successful reply to a one-shot write.
pub fn ok_response() -> Script {
    Script::Respond(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\n{}".to_vec())
}

/// Event stream response: status line, headers, then `lines`, then EOF.
pub fn stream_response(lines: &[&str]) -> Script {
    let mut body = String::from("HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\n");
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    Script::Respond(body.into_bytes())
}

// ── Connectivity ──────────────────────────────────────────────

/// Link that comes up on the `up_after`-th poll (never when `None`).
pub struct ScriptedLink {
    up_after: Option<u32>,
    reject: bool,
    polls: Cell<u32>,
    pub begins: Cell<u32>,
}

#[allow(dead_code)]
impl ScriptedLink {
    pub fn up_after(polls: u32) -> Self {
        Self {
            up_after: Some(polls),
            reject: false,
            polls: Cell::new(0),
            begins: Cell::new(0),
        }
    }

    pub fn never_up() -> Self {
        Self {
            up_after: None,
            ..Self::up_after(0)
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::never_up()
        }
    }

    pub fn polls(&self) -> u32 {
        self.polls.get()
    }
}

impl ConnectivityPort for &ScriptedLink {
    fn begin_connect(&mut self, _credentials: &WifiCredentials) -> core::result::Result<(), ConnectivityError> {
        self.begins.set(self.begins.get() + 1);
        if self.reject {
            return Err(ConnectivityError::DriverFailed);
        }
        Ok(())
    }

    fn is_up(&self) -> bool {
        let n = self.polls.get();
        self.polls.set(n + 1);
        self.up_after.is_some_and(|limit| n >= limit)
    }

    fn address(&self) -> Option<Ipv4Addr> {
        Some(Ipv4Addr::new(10, 0, 0, 42))
    }
}

#[derive(Default)]
pub struct MockRestart {
    pub restarts: Cell<u32>,
}

impl SystemControl for &MockRestart {
    fn restart(&self) {
        self.restarts.set(self.restarts.get() + 1);
    }
}

// ── Handlers ──────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingHandler {
    pub transitions: RefCell<Vec<SensorState>>,
    pub updates: RefCell<Vec<(String, Value)>>,
}

impl TransitionHandler for RecordingHandler {
    async fn on_transition(&self, state: SensorState) {
        self.transitions.borrow_mut().push(state);
    }
}

impl UpdateHandler for RecordingHandler {
    async fn on_update(&self, key: &str, payload: Value) {
        self.updates.borrow_mut().push((key.to_owned(), payload));
    }
}
