//! Device configuration.
//!
//! Every value is fixed at build time and baked into the image. A whole
//! JSON document can be supplied through `DOORLINK_CONFIG`; the
//! individual `DOORLINK_WIFI_SSID`, `DOORLINK_WIFI_PASS`,
//! `DOORLINK_REMOTE_HOST` and `DOORLINK_REMOTE_SECRET` variables are
//! layered over it (or over the defaults).

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::connectivity::WifiCredentials;
use crate::error::{Error, Result};
use crate::pins;

/// Longest accepted debounce window.
const MAX_DEBOUNCE_MS: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Network ---
    pub wifi_ssid: String,
    pub wifi_password: String,
    /// Seconds to wait for association before restarting.
    pub wifi_timeout_secs: u32,

    // --- Remote store ---
    /// Hostname of the realtime database, without scheme.
    pub remote_host: String,
    /// Database secret appended as `?auth=`.
    pub remote_secret: String,
    /// Object that receives `{"status": ...}` updates.
    pub status_path: String,
    /// Key watched for OPEN/CLOSE commands.
    pub command_key: String,

    // --- Door sensor ---
    pub door_sensor_gpio: i32,
    pub door_sensor_debounce_ms: u32,

    // --- Outputs ---
    pub status_led_gpio: i32,
    /// Opener relay; `None` disables remote commands.
    pub relay_gpio: Option<i32>,
    pub relay_pulse_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi_ssid: String::new(),
            wifi_password: String::new(),
            wifi_timeout_secs: 10,

            remote_host: String::new(),
            remote_secret: String::new(),
            status_path: "/garage".into(),
            command_key: "/command".into(),

            door_sensor_gpio: pins::DOOR_SENSOR_GPIO,
            door_sensor_debounce_ms: 50,

            status_led_gpio: pins::STATUS_LED_GPIO,
            relay_gpio: None,
            relay_pulse_ms: 500,
        }
    }
}

impl DeviceConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|_| Error::Config("invalid JSON document"))
    }

    /// Load the configuration baked in at build time and validate it.
    pub fn from_build_env() -> Result<Self> {
        let mut cfg = match option_env!("DOORLINK_CONFIG") {
            Some(json) => Self::from_json(json)?,
            None => Self::default(),
        };
        let overrides = [
            ("DOORLINK_WIFI_SSID", option_env!("DOORLINK_WIFI_SSID")),
            ("DOORLINK_WIFI_PASS", option_env!("DOORLINK_WIFI_PASS")),
            ("DOORLINK_REMOTE_HOST", option_env!("DOORLINK_REMOTE_HOST")),
            ("DOORLINK_REMOTE_SECRET", option_env!("DOORLINK_REMOTE_SECRET")),
        ];
        for (name, value) in overrides {
            if let Some(value) = value {
                cfg.apply_override(name, value)?;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Set the field named by a `DOORLINK_*` variable.
    pub fn apply_override(&mut self, name: &str, value: &str) -> Result<()> {
        let field = match name {
            "DOORLINK_WIFI_SSID" => &mut self.wifi_ssid,
            "DOORLINK_WIFI_PASS" => &mut self.wifi_password,
            "DOORLINK_REMOTE_HOST" => &mut self.remote_host,
            "DOORLINK_REMOTE_SECRET" => &mut self.remote_secret,
            _ => return Err(Error::Config("unknown override")),
        };
        *field = value.to_owned();
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote_host.is_empty() {
            return Err(Error::Config("remote_host is empty"));
        }
        if self.door_sensor_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::Config("door_sensor_debounce_ms over 1000"));
        }
        let gpios = [Some(self.door_sensor_gpio), Some(self.status_led_gpio), self.relay_gpio];
        if gpios.into_iter().flatten().any(|g| !(0..=pins::MAX_GPIO).contains(&g)) {
            return Err(Error::Config("GPIO number out of range"));
        }
        if !self.status_path.starts_with('/') || !self.command_key.starts_with('/') {
            return Err(Error::Config("paths must start with '/'"));
        }
        Ok(())
    }

    pub fn credentials(&self) -> Result<WifiCredentials> {
        Ok(WifiCredentials::new(&self.wifi_ssid, &self.wifi_password)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(u64::from(self.door_sensor_debounce_ms))
    }

    pub fn relay_pulse(&self) -> Duration {
        Duration::from_millis(u64::from(self.relay_pulse_ms))
    }
}
