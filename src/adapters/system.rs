//! Whole-device control.
//!
//! - **`target_os = "espidf"`**: `esp_restart()`; never returns.
//! - **all other targets**: logs and exits the process, standing in for
//!   a reboot on simulation runs.

use log::error;

use crate::app::ports::SystemControl;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceSystem;

impl SystemControl for DeviceSystem {
    #[cfg(target_os = "espidf")]
    fn restart(&self) {
        error!("system: restarting");
        esp_idf_svc::hal::reset::restart();
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&self) {
        error!("system(sim): restart requested, exiting");
        std::process::exit(1);
    }
}
