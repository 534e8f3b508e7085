//! Threads with an explicit stack.
//!
//! ESP-IDF gives the main task a 3.5 KB stack by default, too small for
//! an mbedTLS handshake with certificate-bundle verification. The
//! supervisor executor therefore runs on its own thread sized here
//! rather than relying on `CONFIG_ESP_MAIN_TASK_STACK_SIZE`.

use std::io;
use std::thread::{self, JoinHandle};

use log::info;

/// Stack for the thread running the task executor (TLS handshake,
/// JSON encoding and the stream reader all run here).
pub const EXECUTOR_STACK_KB: usize = 16;

/// Spawn `f` on a named thread with a `stack_kb` KiB stack.
pub fn spawn_with_stack<T, F>(name: &str, stack_kb: usize, f: F) -> io::Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    info!("Spawning '{}' (stack={}KB)", name, stack_kb);
    thread::Builder::new()
        .name(name.into())
        .stack_size(stack_kb * 1024)
        .spawn(f)
}
