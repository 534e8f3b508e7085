//! Host name resolution off the executor thread.
//!
//! `getaddrinfo` blocks for as long as lwIP waits on the DNS server. Run
//! inline it would freeze every task on the single-threaded executor, so
//! each lookup runs on a short-lived helper thread and the caller awaits
//! the answer through a [`Signal`].
//!
//! The last good address is cached; the connector drops it when a
//! connect to it fails so the next attempt resolves again.

use std::cell::RefCell;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, warn};

use crate::remote::transport::TransportError;

/// Stack for the lookup thread. lwIP's resolver runs in the tcpip task,
/// the caller only waits on it.
pub const LOOKUP_STACK_SIZE: usize = 6 * 1024;

type Answer = Signal<CriticalSectionRawMutex, Option<SocketAddr>>;

struct Cached {
    host: String,
    port: u16,
    addr: SocketAddr,
}

#[derive(Default)]
pub struct Resolver {
    cached: RefCell<Option<Cached>>,
}

impl Resolver {
    pub const fn new() -> Self {
        Self {
            cached: RefCell::new(None),
        }
    }

    /// Address for `host:port`, from the cache when possible.
    pub async fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, TransportError> {
        if let Some(hit) = self.cached.borrow().as_ref() {
            if hit.host == host && hit.port == port {
                return Ok(hit.addr);
            }
        }

        let addr = lookup(host, port).await?;
        debug!("dns: {} -> {}", host, addr);
        *self.cached.borrow_mut() = Some(Cached {
            host: host.to_owned(),
            port,
            addr,
        });
        Ok(addr)
    }

    /// Drop the cached address.
    pub fn forget(&self) {
        self.cached.borrow_mut().take();
    }

    pub fn cached(&self) -> Option<SocketAddr> {
        self.cached.borrow().as_ref().map(|c| c.addr)
    }
}

/// One blocking lookup on a helper thread.
async fn lookup(host: &str, port: u16) -> Result<SocketAddr, TransportError> {
    let answer: Arc<Answer> = Arc::new(Signal::new());
    let reply = Arc::clone(&answer);
    let target = (host.to_owned(), port);

    thread::Builder::new()
        .name("dns".into())
        .stack_size(LOOKUP_STACK_SIZE)
        .spawn(move || {
            let addr = match (target.0.as_str(), target.1).to_socket_addrs() {
                Ok(mut addrs) => addrs.next(),
                Err(e) => {
                    warn!("dns: {} failed: {}", target.0, e);
                    None
                }
            };
            reply.signal(addr);
        })
        .map_err(|e| {
            warn!("dns: lookup thread not started: {}", e);
            TransportError::Connect
        })?;

    answer.wait().await.ok_or(TransportError::Connect)
}
