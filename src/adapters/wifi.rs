//! Wi-Fi station-mode adapter.
//!
//! Implements [`ConnectivityPort`]. `begin_connect` configures the
//! station and kicks off association without waiting; the supervisor
//! then polls `is_up`.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF Wi-Fi driver via `esp_idf_svc::wifi`.
//! - **all other targets**: a simulated link that comes up after a
//!   configurable number of polls, for host-side runs.

use std::net::Ipv4Addr;

use log::info;

use crate::app::connectivity::WifiCredentials;
use crate::app::ports::{ConnectivityError, ConnectivityPort};

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub use esp::WifiLink;

#[cfg(target_os = "espidf")]
mod esp {
    use super::*;

    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::modem::Modem;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi};
    use log::warn;

    pub struct WifiLink {
        wifi: EspWifi<'static>,
    }

    impl WifiLink {
        pub fn new(
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: EspDefaultNvsPartition,
        ) -> Result<Self, EspError> {
            Ok(Self {
                wifi: EspWifi::new(modem, sysloop, Some(nvs))?,
            })
        }
    }

    impl ConnectivityPort for WifiLink {
        fn begin_connect(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectivityError> {
            let auth_method = if credentials.is_open() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let config = Configuration::Client(ClientConfiguration {
                ssid: credentials
                    .ssid()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidSsid)?,
                password: credentials
                    .password()
                    .try_into()
                    .map_err(|_| ConnectivityError::InvalidPassword)?,
                auth_method,
                ..Default::default()
            });

            let driver = |e: EspError| {
                warn!("wifi(espidf): {}", e);
                ConnectivityError::DriverFailed
            };
            self.wifi.set_configuration(&config).map_err(driver)?;
            if !self.wifi.is_started().unwrap_or(false) {
                self.wifi.start().map_err(driver)?;
            }
            self.wifi.connect().map_err(driver)?;
            info!("wifi(espidf): association started");
            Ok(())
        }

        fn is_up(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
        }

        fn address(&self) -> Option<Ipv4Addr> {
            self.wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

/// Simulated station. Comes up on the `up_after`-th poll after
/// `begin_connect`; never comes up when `up_after` is `None`.
#[cfg(not(target_os = "espidf"))]
pub struct SimWifiLink {
    up_after: Option<u32>,
    polls: core::cell::Cell<u32>,
    started: bool,
    address: Ipv4Addr,
}

#[cfg(not(target_os = "espidf"))]
impl SimWifiLink {
    pub fn new(up_after: Option<u32>) -> Self {
        Self {
            up_after,
            polls: core::cell::Cell::new(0),
            started: false,
            address: Ipv4Addr::new(192, 168, 4, 2),
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl ConnectivityPort for SimWifiLink {
    fn begin_connect(&mut self, credentials: &WifiCredentials) -> Result<(), ConnectivityError> {
        info!("wifi(sim): connecting to '{}'", credentials.ssid());
        self.started = true;
        self.polls.set(0);
        Ok(())
    }

    fn is_up(&self) -> bool {
        if !self.started {
            return false;
        }
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        self.up_after.is_some_and(|n| polls > n)
    }

    fn address(&self) -> Option<Ipv4Addr> {
        self.started.then_some(self.address)
    }
}
