//! Status LED driver.
//!
//! Blinks a single digital output according to whatever pattern is
//! current in the shared [`PatternSlot`]. The slot is re-read before each
//! half-cycle, so a new selection shows within one on+off period.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives a `PinDriver` output (active high).
//! On host/test: any `embedded_hal::digital::OutputPin` mock.

use embedded_hal::digital::OutputPin;

use crate::app::ports::Sleeper;
use crate::drivers::led_patterns::PatternSlot;

pub struct StatusIndicator<'a, P, S> {
    pin: P,
    sleeper: S,
    slot: &'a PatternSlot,
}

impl<'a, P: OutputPin, S: Sleeper> StatusIndicator<'a, P, S> {
    pub fn new(pin: P, sleeper: S, slot: &'a PatternSlot) -> Self {
        Self { pin, sleeper, slot }
    }

    /// One on+off cycle.
    pub async fn blink_once(&mut self) {
        // The output is assumed always writable; a failed write only
        // costs one visual phase.
        let _ = self.pin.set_high();
        self.sleeper.sleep(self.slot.get().on).await;

        let _ = self.pin.set_low();
        self.sleeper.sleep(self.slot.get().off).await;
    }

    /// Blink forever.
    pub async fn run(mut self) {
        loop {
            self.blink_once().await;
        }
    }
}
