//! Output drivers, the blink patterns they show, and thread setup.

pub mod led_patterns;
pub mod relay;
pub mod status_led;
pub mod task;
