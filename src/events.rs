//! Interrupt-to-task edge notification.
//!
//! A GPIO ISR calls [`EdgeSignal::signal`]; the sensor task parks in
//! [`EdgeSignal::wait_and_clear`] until the next edge.
//!
//! ```text
//! ┌─────────────┐  signal()   ┌──────────────┐  wait_and_clear()  ┌─────────────┐
//! │ GPIO ISR    │────────────▶│  single slot │───────────────────▶│ Sensor task │
//! │ (any edge)  │  coalesces  │  SET / CLEAR │   consumes + wakes │  (async)    │
//! └─────────────┘             └──────────────┘                    └─────────────┘
//! ```
//!
//! The slot holds at most one notification. Edges that fire before the
//! task consumes the slot collapse into a single wake; the task re-reads
//! the live pin level instead of counting edges.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Single-slot, coalescing, ISR-safe notification.
///
/// Backed by an `embassy-sync` [`Signal`] guarded by a critical section,
/// so `signal()` never blocks or allocates. Usable from a `static`.
pub struct EdgeSignal {
    slot: Signal<CriticalSectionRawMutex, ()>,
}

impl EdgeSignal {
    pub const fn new() -> Self {
        Self {
            slot: Signal::new(),
        }
    }

    /// Mark the slot SET and wake the waiting task, if any.
    /// Safe to call from interrupt context.
    #[inline]
    pub fn signal(&self) {
        self.slot.signal(());
    }

    /// Park until the slot is SET, then clear it.
    ///
    /// A `signal()` that lands after the previous clear is never lost:
    /// it either completes this wait immediately or wakes it later.
    pub async fn wait_and_clear(&self) {
        self.slot.wait().await;
    }

    /// Whether a notification is pending.
    pub fn is_pending(&self) -> bool {
        self.slot.signaled()
    }

    /// Drop any pending notification without waiting.
    pub fn clear(&self) {
        self.slot.reset();
    }
}

impl Default for EdgeSignal {
    fn default() -> Self {
        Self::new()
    }
}
