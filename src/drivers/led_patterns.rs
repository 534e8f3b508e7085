//! Blink patterns for the single-colour status LED.
//!
//! Exactly one pattern is current at any time. Components select a
//! pattern by writing the shared [`PatternSlot`]; the indicator task
//! re-reads it every half-cycle. Last writer wins: there is no queue
//! and no priority.
//!
//! | Pattern          | On     | Off    | Meaning                       |
//! |------------------|--------|--------|-------------------------------|
//! | `BOOT`           | 500 ms | 500 ms | powered, nothing started yet  |
//! | `WIFI_CONNECTING`| 100 ms | 100 ms | association in progress       |
//! | `REMOTE_IO`      | 1 s    | 0      | a remote write is in flight   |
//! | `NORMAL`         | 100 ms | 400 ms | online, idle                  |
//! | `RELAY_CLOSED`   | 20 ms  | 80 ms  | relay contact is closed       |

use core::cell::Cell;
use core::time::Duration;

/// On/off timing for one blink cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkPattern {
    pub on: Duration,
    pub off: Duration,
}

impl BlinkPattern {
    pub const BOOT: Self = Self::from_millis(500, 500);
    pub const WIFI_CONNECTING: Self = Self::from_millis(100, 100);
    pub const REMOTE_IO: Self = Self::from_millis(1000, 0);
    pub const NORMAL: Self = Self::from_millis(100, 400);
    pub const RELAY_CLOSED: Self = Self::from_millis(20, 80);

    pub const fn from_millis(on_ms: u64, off_ms: u64) -> Self {
        Self {
            on: Duration::from_millis(on_ms),
            off: Duration::from_millis(off_ms),
        }
    }

    /// Length of one full on+off cycle.
    pub fn period(&self) -> Duration {
        self.on + self.off
    }
}

/// The process-wide "current pattern".
///
/// Shared by reference between tasks of the single-threaded executor, so
/// a plain `Cell` is enough: writes are instantaneous and never straddle
/// a suspension point.
#[derive(Debug)]
pub struct PatternSlot {
    current: Cell<BlinkPattern>,
}

impl PatternSlot {
    pub const fn new(initial: BlinkPattern) -> Self {
        Self {
            current: Cell::new(initial),
        }
    }

    pub fn set(&self, pattern: BlinkPattern) {
        self.current.set(pattern);
    }

    pub fn get(&self) -> BlinkPattern {
        self.current.get()
    }

    /// Select `active` until the returned guard drops, then select `restore`.
    pub fn hold(&self, active: BlinkPattern, restore: BlinkPattern) -> PatternGuard<'_> {
        self.set(active);
        PatternGuard {
            slot: self,
            restore,
        }
    }
}

impl Default for PatternSlot {
    fn default() -> Self {
        Self::new(BlinkPattern::BOOT)
    }
}

/// Restores a pattern on drop, including early returns via `?`.
#[must_use = "the pattern is restored as soon as the guard is dropped"]
pub struct PatternGuard<'a> {
    slot: &'a PatternSlot,
    restore: BlinkPattern,
}

impl Drop for PatternGuard<'_> {
    fn drop(&mut self) {
        self.slot.set(self.restore);
    }
}
