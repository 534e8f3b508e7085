//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements         | Connects to                  |
//! |-----------------|--------------------|------------------------------|
//! | `dns`           | (Resolver)         | getaddrinfo off-executor     |
//! | `hardware`      | SensorLine         | ESP32 GPIO + ISR service     |
//! |                 | (OutputPin)        | ESP32 GPIO outputs           |
//! | `system`        | SystemControl      | esp_restart / process exit   |
//! | `time`          | Sleeper            | async-io-mini reactor timers |
//! | `tls_transport` | Connector          | lwIP TCP + mbedTLS client    |
//! | `wifi`          | ConnectivityPort   | ESP-IDF Wi-Fi STA / sim link |

pub mod dns;
pub mod hardware;
pub mod system;
pub mod time;
pub mod tls_transport;
pub mod wifi;
