//! Door controller: the glue between the sensor, the remote store and
//! the relay.
//!
//! ```text
//!  SensorMonitor ──on_transition──▶ ┌────────────────┐ ──PATCH {status}──▶ remote
//!                                   │ DoorController │
//!  watch_key ─────on_update───────▶ └────────────────┘ ──pulse──▶ relay
//!                                                       ──PUT "IDLE"──▶ remote
//! ```
//!
//! Write failures are logged and dropped. A lost status update is only
//! corrected by the next transition.

use core::fmt;
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::app::ports::{Sleeper, TransitionHandler, UpdateHandler};
use crate::drivers::led_patterns::PatternSlot;
use crate::drivers::relay::RelayDriver;
use crate::remote::RemoteStateClient;
use crate::remote::transport::Connector;
use crate::sensors::SensorState;

/// Value written back to the command key once a command has run.
pub const IDLE_COMMAND: &str = "IDLE";

// ───────────────────────────────────────────────────────────────
// Commands
// ───────────────────────────────────────────────────────────────

/// A command read off the command key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoorCommand {
    Open,
    Close,
    Idle,
    Unknown(String),
}

impl DoorCommand {
    pub fn from_payload(payload: &Value) -> Self {
        match payload.as_str() {
            Some("OPEN") => Self::Open,
            Some("CLOSE") => Self::Close,
            Some(IDLE_COMMAND) => Self::Idle,
            Some(other) => Self::Unknown(other.to_owned()),
            None => Self::Unknown(payload.to_string()),
        }
    }

    /// Whether this command presses the opener button.
    pub fn actuates(&self) -> bool {
        matches!(self, Self::Open | Self::Close)
    }
}

impl fmt::Display for DoorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::Close => f.write_str("CLOSE"),
            Self::Idle => f.write_str(IDLE_COMMAND),
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

#[derive(Serialize)]
struct StatusReport {
    status: SensorState,
}

// ───────────────────────────────────────────────────────────────
// DoorController
// ───────────────────────────────────────────────────────────────

pub struct DoorController<'a, C, S, P> {
    client: &'a RemoteStateClient<'a, C, S>,
    sleeper: S,
    slot: &'a PatternSlot,
    relay: Option<Mutex<NoopRawMutex, RelayDriver<P>>>,
    pulse_width: Duration,
    status_path: String,
    command_key: String,
}

impl<'a, C, S, P> DoorController<'a, C, S, P>
where
    C: Connector,
    S: Sleeper,
    P: OutputPin,
{
    pub fn new(
        client: &'a RemoteStateClient<'a, C, S>,
        sleeper: S,
        slot: &'a PatternSlot,
        status_path: &str,
        command_key: &str,
    ) -> Self {
        Self {
            client,
            sleeper,
            slot,
            relay: None,
            pulse_width: Duration::from_millis(500),
            status_path: status_path.to_owned(),
            command_key: command_key.to_owned(),
        }
    }

    /// Attach the opener relay. Without one, actuating commands are
    /// logged and ignored.
    pub fn with_relay(mut self, relay: RelayDriver<P>, pulse_width: Duration) -> Self {
        self.relay = Some(Mutex::new(relay));
        self.pulse_width = pulse_width;
        self
    }

    pub fn command_key(&self) -> &str {
        &self.command_key
    }

    async fn run_command(&self, command: DoorCommand) {
        let Some(relay) = &self.relay else {
            warn!("command: {} ignored, no relay configured", command);
            return;
        };

        info!("command: {}", command);
        relay
            .lock()
            .await
            .pulse(self.pulse_width, &self.sleeper, self.slot)
            .await;

        if let Err(e) = self.client.put_value(&self.command_key, IDLE_COMMAND).await {
            warn!("command: reset of {} failed: {}", self.command_key, e);
        }
    }
}

impl<C, S, P> TransitionHandler for DoorController<'_, C, S, P>
where
    C: Connector,
    S: Sleeper,
    P: OutputPin,
{
    async fn on_transition(&self, state: SensorState) {
        let report = StatusReport { status: state };
        if let Err(e) = self.client.patch_value(&self.status_path, &report).await {
            warn!("patch {}: {} not reported: {}", self.status_path, state, e);
        }
    }
}

impl<C, S, P> UpdateHandler for DoorController<'_, C, S, P>
where
    C: Connector,
    S: Sleeper,
    P: OutputPin,
{
    async fn on_update(&self, key: &str, payload: Value) {
        let command = DoorCommand::from_payload(&payload);
        if command.actuates() {
            self.run_command(command).await;
        } else if command == DoorCommand::Idle {
            debug!("command: {} is idle", key);
        } else {
            warn!("command: ignoring {} on {}", command, key);
        }
    }
}
