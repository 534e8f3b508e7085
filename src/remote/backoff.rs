//! Reconnect backoff for the event stream.
//!
//! Doubling from 5 s, capped at one hour, back to 5 s as soon as the
//! stream delivers any line. The Nth consecutive failure waits
//! `min(5 * 2^(N-1), 3600)` seconds.

use core::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    secs: u32,
}

impl Backoff {
    pub const BASE_SECS: u32 = 5;
    pub const MAX_SECS: u32 = 3600;

    pub const fn new() -> Self {
        Self {
            secs: Self::BASE_SECS,
        }
    }

    /// Wait before the next reconnect.
    pub fn current(&self) -> Duration {
        Duration::from_secs(u64::from(self.secs))
    }

    /// Return the wait for this failure and double it for the next one.
    pub fn next_wait(&mut self) -> Duration {
        let wait = self.current();
        self.secs = self.secs.saturating_mul(2).min(Self::MAX_SECS);
        wait
    }

    pub fn reset(&mut self) {
        self.secs = Self::BASE_SECS;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}
