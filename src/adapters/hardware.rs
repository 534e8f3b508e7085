//! GPIO adapters: the door sensor input and plain digital outputs.
//!
//! This is the only module that touches pin drivers. The sensor input
//! implements [`SensorLine`]; outputs are `esp_idf_hal` `PinDriver`s,
//! which already implement `embedded_hal::digital::OutputPin`.
//!
//! Compiled only for `target_os = "espidf"`.

#![cfg(target_os = "espidf")]

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyOutputPin, Input, InterruptType, Output, PinDriver, Pull};
use log::{info, warn};

use crate::app::ports::SensorLine;
use crate::error::{Error, Result};
use crate::events::EdgeSignal;

pub type OutputDriver = PinDriver<'static, AnyOutputPin, Output>;

/// Door switch input: pull-up, interrupt on both edges.
pub struct DoorSensorPin {
    pin: PinDriver<'static, AnyIOPin, Input>,
}

impl DoorSensorPin {
    pub fn new(gpio: i32) -> Result<Self> {
        // SAFETY: the GPIO number comes from validated config and is not
        // claimed by any other driver in this firmware.
        let pin = unsafe { AnyIOPin::new(gpio) };
        let mut pin = PinDriver::input(pin).map_err(|_| Error::Init("door sensor pin"))?;
        pin.set_pull(Pull::Up).map_err(|_| Error::Init("door sensor pull-up"))?;
        pin.set_interrupt_type(InterruptType::AnyEdge)
            .map_err(|_| Error::Init("door sensor interrupt type"))?;
        info!("gpio: door sensor on GPIO{} (pull-up, any edge)", gpio);
        Ok(Self { pin })
    }
}

impl SensorLine for DoorSensorPin {
    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }

    fn subscribe(&mut self, signal: &'static EdgeSignal) -> Result<()> {
        // SAFETY: the callback runs in ISR context and only calls
        // `EdgeSignal::signal`, which is non-blocking and allocation-free.
        unsafe { self.pin.subscribe(move || signal.signal()) }
            .map_err(|_| Error::Init("door sensor ISR subscribe"))?;
        self.pin
            .enable_interrupt()
            .map_err(|_| Error::Init("door sensor interrupt enable"))
    }

    fn rearm(&mut self) {
        // ESP-IDF disables the GPIO interrupt after each delivery.
        if let Err(e) = self.pin.enable_interrupt() {
            warn!("gpio: door sensor re-arm failed: {}", e);
        }
    }
}

/// Claim `gpio` as a push-pull output, driven low.
pub fn output_pin(gpio: i32, what: &'static str) -> Result<OutputDriver> {
    // SAFETY: as for `DoorSensorPin::new`.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    let mut pin = PinDriver::output(pin).map_err(|_| Error::Init(what))?;
    pin.set_low().map_err(|_| Error::Init(what))?;
    info!("gpio: {} on GPIO{}", what, gpio);
    Ok(pin)
}
