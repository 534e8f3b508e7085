//! Default GPIO assignments for the door controller board.
//!
//! [`DeviceConfig`](crate::config::DeviceConfig) starts from these and
//! may override any of them.

/// Digital input: door reed switch to GND, internal pull-up.
/// LOW = door closed, HIGH = door open.
pub const DOOR_SENSOR_GPIO: i32 = 14;

/// Digital output: on-board status LED (active HIGH).
pub const STATUS_LED_GPIO: i32 = 2;

/// Highest GPIO number on the ESP32.
pub const MAX_GPIO: i32 = 39;
