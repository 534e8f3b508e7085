//! Door sensor monitor: edge interrupt, debounce, dedup.
//!
//! ## Debounce policy
//!
//! Wait-then-confirm: after an edge wakes the task it sleeps for the
//! debounce window, re-reads the line once, and reports a transition only
//! if the settled level differs from the last reported one. A bounce that
//! returns to the previous level inside the window is suppressed.
//!
//! | Step | Action                                   |
//! |------|------------------------------------------|
//! | 1    | `wait_and_clear()` on the edge signal     |
//! | 2    | re-arm the GPIO interrupt                 |
//! | 3    | sleep `debounce`                          |
//! | 4    | read level; equal to last → discard       |
//! | 5    | otherwise update last, await the handler  |

use core::time::Duration;

use log::{debug, info};

use crate::app::ports::{SensorLine, Sleeper, TransitionHandler};
use crate::error::Result;
use crate::events::EdgeSignal;

use super::SensorState;

pub struct SensorMonitor<L, S> {
    line: L,
    signal: &'static EdgeSignal,
    sleeper: S,
    debounce: Duration,
    last_level: bool,
}

impl<L: SensorLine, S: Sleeper> SensorMonitor<L, S> {
    /// Subscribe the line's edge interrupts to `signal`, then take the
    /// initial reading. The initial state is not reported.
    pub fn arm(
        mut line: L,
        signal: &'static EdgeSignal,
        sleeper: S,
        debounce: Duration,
    ) -> Result<Self> {
        line.subscribe(signal)?;
        let last_level = line.is_high();
        info!(
            "door: armed (initial={}, debounce={}ms)",
            SensorState::from_level(last_level),
            debounce.as_millis()
        );
        Ok(Self {
            line,
            signal,
            sleeper,
            debounce,
            last_level,
        })
    }

    /// Last confirmed position.
    pub fn state(&self) -> SensorState {
        SensorState::from_level(self.last_level)
    }

    /// Wait for the next edge and run one debounce cycle.
    ///
    /// Returns the new position if the settled level differs from the
    /// last confirmed one, `None` for a bounce.
    pub async fn settle_edge(&mut self) -> Option<SensorState> {
        self.signal.wait_and_clear().await;
        self.line.rearm();
        self.sleeper.sleep(self.debounce).await;

        let level = self.line.is_high();
        if level == self.last_level {
            debug!("door: bounce suppressed (still {})", self.state());
            return None;
        }

        self.last_level = level;
        let state = SensorState::from_level(level);
        info!("door: sensor signaled {}", state);
        Some(state)
    }

    /// Run forever, handing each confirmed transition to `handler`.
    /// The next edge is not examined until the handler returns.
    pub async fn run<H: TransitionHandler>(mut self, handler: &H) {
        loop {
            if let Some(state) = self.settle_edge().await {
                handler.on_transition(state).await;
            }
        }
    }
}
