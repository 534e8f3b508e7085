//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Monitor / Supervisor / Client (domain)
//! ```
//!
//! Driven adapters (GPIO, Wi-Fi driver, timers, system control) implement
//! these traits. The long-running tasks consume them via generics, so the
//! domain core never touches hardware directly and every task can be
//! driven on the host with mocks.
//!
//! Digital outputs (status LED, relay) use `embedded_hal::digital::OutputPin`
//! directly instead of a bespoke port.

#![allow(async_fn_in_trait)]

use core::fmt;
use core::time::Duration;
use std::net::Ipv4Addr;

use serde_json::Value;

use crate::app::connectivity::WifiCredentials;
use crate::error::Result;
use crate::events::EdgeSignal;
use crate::sensors::SensorState;

// ───────────────────────────────────────────────────────────────
// Timing port
// ───────────────────────────────────────────────────────────────

/// Cooperative suspension. Every timed wait in the firmware goes through
/// this port, so tests can record durations instead of sleeping.
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// A digital input with both-edge interrupt delivery.
pub trait SensorLine {
    /// Raw electrical level; `true` when the line reads high.
    fn is_high(&mut self) -> bool;

    /// Route rising and falling edge interrupts on this line to `signal`.
    fn subscribe(&mut self, signal: &'static EdgeSignal) -> Result<()>;

    /// Re-enable edge delivery after a wake. Drivers that keep the
    /// interrupt armed leave this empty.
    fn rearm(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Connectivity port (driven adapter: domain ↔ radio driver)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    InvalidSsid,
    InvalidPassword,
    DriverFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::DriverFailed => write!(f, "Wi-Fi driver rejected the request"),
        }
    }
}

/// Station-mode network link. Polled, not event-driven.
pub trait ConnectivityPort {
    /// Start an association attempt; returns before the link is up.
    fn begin_connect(&mut self, credentials: &WifiCredentials) -> core::result::Result<(), ConnectivityError>;

    /// Whether the link is associated and has an address.
    fn is_up(&self) -> bool;

    /// The address acquired via DHCP, once up.
    fn address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// System control port
// ───────────────────────────────────────────────────────────────

/// Whole-device control. On hardware `restart` does not return.
pub trait SystemControl {
    fn restart(&self);
}

// ───────────────────────────────────────────────────────────────
// Delegates (domain → application callbacks)
// ───────────────────────────────────────────────────────────────

/// Receives debounced door transitions. The monitor awaits each call
/// before observing the next edge.
pub trait TransitionHandler {
    async fn on_transition(&self, state: SensorState);
}

/// Receives payloads parsed off a watched key's event stream, in
/// arrival order.
pub trait UpdateHandler {
    async fn on_update(&self, key: &str, payload: Value);
}
