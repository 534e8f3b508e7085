//! Reactor-backed timing adapter.
//!
//! Implements [`Sleeper`] on top of `async_io_mini::Timer`, so every
//! timed wait parks the task in the reactor instead of blocking the
//! executor thread.
//!
//! A zero-length wait yields once instead of arming a timer. The
//! REMOTE_IO pattern has a zero off-phase and would otherwise keep the
//! indicator task spinning without giving siblings a turn.

use core::time::Duration;

use futures_lite::future;

use crate::app::ports::Sleeper;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReactorSleeper;

impl Sleeper for ReactorSleeper {
    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            future::yield_now().await;
        } else {
            async_io_mini::Timer::after(duration).await;
        }
    }
}
