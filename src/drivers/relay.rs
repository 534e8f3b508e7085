//! Door opener relay driver.
//!
//! The relay contact is wired in parallel with the wall button of the
//! garage door opener, so a short closure acts as one button press. The
//! opener toggles on each press; this driver has no notion of direction.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives a `PinDriver` output (active high).
//! On host/test: any `embedded_hal::digital::OutputPin` mock.

use core::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{info, warn};

use crate::app::ports::Sleeper;
use crate::drivers::led_patterns::{BlinkPattern, PatternSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Open,
    Closed,
}

pub struct RelayDriver<P> {
    pin: P,
    state: RelayState,
    pulses: u32,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Take ownership of the output and drive it to the open state.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            warn!("relay: failed to drive output low at init");
        }
        Self {
            pin,
            state: RelayState::Open,
            pulses: 0,
        }
    }

    /// Close the contact for `width`, then open it again.
    ///
    /// The status LED shows RELAY_CLOSED while the contact is closed and
    /// NORMAL afterwards.
    pub async fn pulse<S: Sleeper>(&mut self, width: Duration, sleeper: &S, slot: &PatternSlot) {
        let _closed = slot.hold(BlinkPattern::RELAY_CLOSED, BlinkPattern::NORMAL);

        self.drive(RelayState::Closed);
        sleeper.sleep(width).await;
        self.drive(RelayState::Open);

        self.pulses = self.pulses.wrapping_add(1);
        info!("relay: pulsed {}ms (total {})", width.as_millis(), self.pulses);
    }

    fn drive(&mut self, state: RelayState) {
        let res = match state {
            RelayState::Closed => self.pin.set_high(),
            RelayState::Open => self.pin.set_low(),
        };
        if res.is_err() {
            warn!("relay: output write failed ({:?})", state);
        }
        self.state = state;
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    pub fn pulse_count(&self) -> u32 {
        self.pulses
    }
}
