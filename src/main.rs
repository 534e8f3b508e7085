//! Doorlink firmware: main entry point.
//!
//! Four long-running tasks share one cooperative executor and run until
//! the device restarts. The executor lives on its own thread with an
//! explicit stack; the main task only bootstraps and joins it.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  thread "supervisor" (16 KB)                                     │
//! │  futures_lite::block_on ─▶ edge_executor::LocalExecutor          │
//! │                                                                  │
//! │  StatusIndicator.run()        blinks the current PatternSlot     │
//! │  ConnectivitySupervisor       Wi-Fi up or restart                │
//! │  SensorMonitor.run()  ──▶ DoorController ──▶ PATCH {status}     │
//! │  watch_key(command)   ──▶ DoorController ──▶ relay + PUT "IDLE" │
//! │                                                                  │
//! │  GPIO ISR ──signal()──▶ DOOR_EDGE (EdgeSignal)                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

use core::future::pending;

use anyhow::{Result, anyhow};
use edge_executor::LocalExecutor;
use futures_lite::future;
use log::info;

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sys::{esp, esp_vfs_eventfd_config_t, esp_vfs_eventfd_register};

use doorlink::adapters::hardware::{DoorSensorPin, output_pin};
use doorlink::adapters::system::DeviceSystem;
use doorlink::adapters::time::ReactorSleeper;
use doorlink::adapters::tls_transport::TlsConnector;
use doorlink::adapters::wifi::WifiLink;
use doorlink::app::connectivity::ConnectivitySupervisor;
use doorlink::app::service::DoorController;
use doorlink::config::DeviceConfig;
use doorlink::drivers::led_patterns::PatternSlot;
use doorlink::drivers::relay::RelayDriver;
use doorlink::drivers::status_led::StatusIndicator;
use doorlink::drivers::task::{EXECUTOR_STACK_KB, spawn_with_stack};
use doorlink::error::Error;
use doorlink::events::EdgeSignal;
use doorlink::remote::RemoteStateClient;
use doorlink::sensors::door::SensorMonitor;

/// Door switch edges, set from the GPIO ISR.
static DOOR_EDGE: EdgeSignal = EdgeSignal::new();

/// eventfd slots for the async-io-mini reactor.
const EVENTFD_MAX_FDS: usize = 5;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Doorlink v{}                         ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // SAFETY: called once at boot, before any reactor use.
    esp!(unsafe {
        esp_vfs_eventfd_register(&esp_vfs_eventfd_config_t {
            max_fds: EVENTFD_MAX_FDS as _,
        })
    })?;

    let supervisor = spawn_with_stack("supervisor", EXECUTOR_STACK_KB, run)?;
    match supervisor.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("supervisor thread panicked")),
    }
}

/// Build the adapters and run the tasks. Only returns on a bootstrap error.
fn run() -> Result<()> {
    // ── 2. Configuration ──────────────────────────────────────
    let config = DeviceConfig::from_build_env()?;
    let credentials = config.credentials()?;
    let wifi_timeout = config.wifi_timeout_secs;
    info!(
        "Config: host={}, sensor=GPIO{}, debounce={}ms, relay={:?}",
        config.remote_host, config.door_sensor_gpio, config.door_sensor_debounce_ms, config.relay_gpio
    );

    // ── 3. Peripherals + adapters ─────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let slot = PatternSlot::default();
    let sleeper = ReactorSleeper;

    let led = StatusIndicator::new(output_pin(config.status_led_gpio, "status LED")?, sleeper, &slot);

    let wifi = WifiLink::new(peripherals.modem, sysloop, nvs)?;
    let mut connectivity = ConnectivitySupervisor::new(wifi, sleeper, DeviceSystem, &slot);

    let monitor = SensorMonitor::arm(
        DoorSensorPin::new(config.door_sensor_gpio)?,
        &DOOR_EDGE,
        sleeper,
        config.debounce(),
    )?;

    let connector = TlsConnector::new().map_err(Error::from)?;
    let client = RemoteStateClient::new(connector, sleeper, &config.remote_host, &config.remote_secret, &slot);

    let mut controller = DoorController::new(&client, sleeper, &slot, &config.status_path, &config.command_key);
    if let Some(gpio) = config.relay_gpio {
        controller = controller.with_relay(RelayDriver::new(output_pin(gpio, "relay")?), config.relay_pulse());
    }

    // ── 4. Tasks ──────────────────────────────────────────────
    let executor: LocalExecutor<'_, 8> = LocalExecutor::new();

    executor.spawn(led.run()).detach();
    executor
        .spawn(async move {
            connectivity.connect(&credentials, wifi_timeout).await;
        })
        .detach();
    executor.spawn(monitor.run(&controller)).detach();
    executor
        .spawn(client.watch_key(controller.command_key(), &controller))
        .detach();

    info!("System ready. Entering executor.");

    future::block_on(executor.run(pending::<()>()));
    Ok(())
}
