//! Network bring-up with a bounded wait and restart as the failure path.
//!
//! ```text
//!   Disconnected ──connect()──▶ Connecting ──is_up──▶ Connected
//!                                   │
//!                                   └─timeout / driver error──▶ Failed ──5 s──▶ restart
//! ```
//!
//! There is no in-process retry. A headless device that cannot associate
//! restarts its whole stack instead.

use core::time::Duration;

use log::{error, info, warn};

use crate::app::ports::{ConnectivityError, ConnectivityPort, Sleeper, SystemControl};
use crate::drivers::led_patterns::{BlinkPattern, PatternSlot};

/// Poll interval while waiting for the link.
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Pause between giving up and restarting, so the log line gets out.
const RESTART_DELAY: Duration = Duration::from_secs(5);

pub const DEFAULT_TIMEOUT_SECS: u32 = 10;

// ───────────────────────────────────────────────────────────────
// Credentials
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Validated station credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WifiCredentials {
    ssid: heapless::String<32>,
    password: heapless::String<64>,
}

impl WifiCredentials {
    /// SSID must be 1-32 printable ASCII bytes; the password is either
    /// empty (open network) or 8-64 bytes.
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        if ssid.is_empty() || !is_printable_ascii(ssid) {
            return Err(ConnectivityError::InvalidSsid);
        }
        if !password.is_empty() && password.len() < 8 {
            return Err(ConnectivityError::InvalidPassword);
        }
        Ok(Self {
            ssid: ssid.try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: password.try_into().map_err(|_| ConnectivityError::InvalidPassword)?,
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

pub struct ConnectivitySupervisor<'a, L, S, R> {
    link: L,
    sleeper: S,
    system: R,
    slot: &'a PatternSlot,
    state: ConnectionState,
}

impl<'a, L, S, R> ConnectivitySupervisor<'a, L, S, R>
where
    L: ConnectivityPort,
    S: Sleeper,
    R: SystemControl,
{
    pub fn new(link: L, sleeper: S, system: R, slot: &'a PatternSlot) -> Self {
        Self {
            link,
            sleeper,
            system,
            slot,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Bring the link up, polling once per second for up to
    /// `timeout_secs` polls.
    ///
    /// On failure this waits five seconds and restarts the device; the
    /// `Failed` return is only observable where restart returns (tests).
    pub async fn connect(&mut self, credentials: &WifiCredentials, timeout_secs: u32) -> ConnectionState {
        self.state = ConnectionState::Connecting;
        self.slot.set(BlinkPattern::WIFI_CONNECTING);
        info!("wifi: connecting to '{}'", credentials.ssid());

        if let Err(e) = self.link.begin_connect(credentials) {
            error!("wifi: {}", e);
            return self.fail().await;
        }

        let mut remaining = timeout_secs;
        while !self.link.is_up() && remaining > 0 {
            self.sleeper.sleep(POLL_INTERVAL).await;
            remaining -= 1;
        }

        if !self.link.is_up() {
            warn!("wifi: not connected after {}s", timeout_secs);
            return self.fail().await;
        }

        match self.link.address() {
            Some(ip) => info!("wifi: connected, IP {}", ip),
            None => info!("wifi: connected"),
        }
        self.state = ConnectionState::Connected;
        self.slot.set(BlinkPattern::NORMAL);
        self.state
    }

    async fn fail(&mut self) -> ConnectionState {
        self.state = ConnectionState::Failed;
        warn!("wifi: restarting in {}s", RESTART_DELAY.as_secs());
        self.sleeper.sleep(RESTART_DELAY).await;
        self.system.restart();
        self.state
    }

    pub fn into_link(self) -> L {
        self.link
    }
}
