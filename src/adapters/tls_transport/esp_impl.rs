//! ESP-IDF implementation of the TLS client transport.
//!
//! Compiled only for `target_os = "espidf"`.

use core::ffi::{c_int, c_void};
use std::ffi::CString;
use std::io;
use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use async_io_mini::Async;
use futures_lite::io::{AsyncRead, AsyncWrite};
use futures_lite::ready;
use log::{debug, info, warn};

use esp_idf_svc::sys::{
    EAGAIN, MBEDTLS_ERR_SSL_PEER_CLOSE_NOTIFY, MBEDTLS_ERR_SSL_RECEIVED_NEW_SESSION_TICKET,
    MBEDTLS_ERR_SSL_WANT_READ, MBEDTLS_ERR_SSL_WANT_WRITE, MBEDTLS_SSL_IS_CLIENT,
    MBEDTLS_SSL_PRESET_DEFAULT, MBEDTLS_SSL_TRANSPORT_STREAM, MBEDTLS_SSL_VERIFY_REQUIRED,
    esp_crt_bundle_attach, lwip_recv, lwip_send, mbedtls_ctr_drbg_context, mbedtls_ctr_drbg_free,
    mbedtls_ctr_drbg_init, mbedtls_ctr_drbg_random, mbedtls_ctr_drbg_seed,
    mbedtls_entropy_context, mbedtls_entropy_free, mbedtls_entropy_func, mbedtls_entropy_init,
    mbedtls_ssl_close_notify, mbedtls_ssl_conf_authmode, mbedtls_ssl_conf_rng,
    mbedtls_ssl_config, mbedtls_ssl_config_defaults, mbedtls_ssl_config_free,
    mbedtls_ssl_config_init, mbedtls_ssl_context, mbedtls_ssl_free, mbedtls_ssl_handshake,
    mbedtls_ssl_init, mbedtls_ssl_read, mbedtls_ssl_set_bio, mbedtls_ssl_set_hostname,
    mbedtls_ssl_setup, mbedtls_ssl_write,
};

use crate::adapters::dns::Resolver;
use crate::remote::transport::{Connector, TransportError};

const DRBG_SEED_LABEL: &[u8] = b"doorlink-tls";

fn last_errno() -> i32 {
    // SAFETY: __errno() returns the pointer to the current task errno,
    // which is valid to read in any task context.
    unsafe { *esp_idf_svc::sys::__errno() }
}

// ── BIO callbacks ─────────────────────────────────────────────────────────────
//
// The socket fd is passed to mbedTLS as the `p_bio` context. The socket is
// non-blocking; EAGAIN becomes WANT_READ / WANT_WRITE so the caller can park
// on reactor readiness and retry.

/// # Safety
///
/// `ctx` must be a raw socket fd cast to `*mut c_void`, valid for the
/// lifetime of the session (guaranteed by `TlsStream::socket`).
unsafe extern "C" fn bio_send(ctx: *mut c_void, buf: *const u8, len: usize) -> c_int {
    let fd = ctx as usize as c_int;
    let ret = unsafe { lwip_send(fd, buf.cast(), len, 0) } as c_int;
    if ret < 0 && last_errno() == EAGAIN as i32 {
        return MBEDTLS_ERR_SSL_WANT_WRITE;
    }
    ret
}

/// # Safety
///
/// Same invariants as `bio_send`.
unsafe extern "C" fn bio_recv(ctx: *mut c_void, buf: *mut u8, len: usize) -> c_int {
    let fd = ctx as usize as c_int;
    let ret = unsafe { lwip_recv(fd, buf.cast(), len, 0) } as c_int;
    if ret < 0 && last_errno() == EAGAIN as i32 {
        return MBEDTLS_ERR_SSL_WANT_READ;
    }
    ret
}

// ── Shared client config ──────────────────────────────────────────────────────

/// mbedTLS client config + RNG, shared by every session it creates.
/// Sessions hold an `Rc` so the config outlives them.
struct TlsConfig {
    conf: Box<mbedtls_ssl_config>,
    entropy: Box<mbedtls_entropy_context>,
    drbg: Box<mbedtls_ctr_drbg_context>,
}

impl Drop for TlsConfig {
    fn drop(&mut self) {
        // SAFETY: all fields were initialised in `TlsConfig::new` and are
        // freed exactly once here.
        unsafe {
            mbedtls_ssl_config_free(self.conf.as_mut());
            mbedtls_ctr_drbg_free(self.drbg.as_mut());
            mbedtls_entropy_free(self.entropy.as_mut());
        }
    }
}

impl TlsConfig {
    fn new() -> Result<Self, TransportError> {
        // Heap-allocated to keep large mbedTLS structs off the task stack.
        let mut cfg = Self {
            conf: Box::new(mbedtls_ssl_config::default()),
            entropy: Box::new(mbedtls_entropy_context::default()),
            drbg: Box::new(mbedtls_ctr_drbg_context::default()),
        };

        // SAFETY: all pointers come from Box::as_mut() and are valid,
        // aligned and exclusively owned. Init is done before any fallible
        // call so `Drop` is sound on every early return.
        unsafe {
            mbedtls_entropy_init(cfg.entropy.as_mut());
            mbedtls_ctr_drbg_init(cfg.drbg.as_mut());
            mbedtls_ssl_config_init(cfg.conf.as_mut());

            let rc = mbedtls_ctr_drbg_seed(
                cfg.drbg.as_mut(),
                Some(mbedtls_entropy_func),
                cfg.entropy.as_mut() as *mut _ as *mut c_void,
                DRBG_SEED_LABEL.as_ptr(),
                DRBG_SEED_LABEL.len(),
            );
            if rc != 0 {
                warn!("tls(espidf): ctr_drbg_seed failed (rc={})", rc);
                return Err(TransportError::Tls);
            }

            let rc = mbedtls_ssl_config_defaults(
                cfg.conf.as_mut(),
                MBEDTLS_SSL_IS_CLIENT as _,
                MBEDTLS_SSL_TRANSPORT_STREAM as _,
                MBEDTLS_SSL_PRESET_DEFAULT as _,
            );
            if rc != 0 {
                warn!("tls(espidf): ssl_config_defaults failed (rc={})", rc);
                return Err(TransportError::Tls);
            }

            mbedtls_ssl_conf_authmode(cfg.conf.as_mut(), MBEDTLS_SSL_VERIFY_REQUIRED as _);
            mbedtls_ssl_conf_rng(
                cfg.conf.as_mut(),
                Some(mbedtls_ctr_drbg_random),
                cfg.drbg.as_mut() as *mut _ as *mut c_void,
            );

            let rc = esp_crt_bundle_attach(cfg.conf.as_mut() as *mut _ as *mut c_void);
            if rc != 0 {
                warn!("tls(espidf): crt_bundle_attach failed (rc={})", rc);
                return Err(TransportError::Tls);
            }
        }

        Ok(cfg)
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

/// One TLS session over a reactor-registered socket.
pub struct TlsStream {
    ssl: Box<mbedtls_ssl_context>,
    socket: Async<TcpStream>,
    _config: Rc<TlsConfig>,
}

impl Drop for TlsStream {
    fn drop(&mut self) {
        // SAFETY: `ssl` was initialised by `mbedtls_ssl_init` right after
        // allocation and is freed exactly once here. The socket closes
        // when `socket` drops after this.
        unsafe {
            mbedtls_ssl_close_notify(self.ssl.as_mut());
            mbedtls_ssl_free(self.ssl.as_mut());
        }
    }
}

fn session_error(op: &str, rc: c_int) -> io::Error {
    warn!("tls(espidf): {} failed (rc={})", op, rc);
    io::Error::other(TransportError::Tls.to_string())
}

impl TlsStream {
    async fn handshake(&mut self) -> Result<(), TransportError> {
        loop {
            // SAFETY: ssl is set up with valid BIO callbacks and config.
            let rc = unsafe { mbedtls_ssl_handshake(self.ssl.as_mut()) };
            match rc {
                0 => return Ok(()),
                MBEDTLS_ERR_SSL_WANT_READ => {
                    self.socket.readable().await.map_err(|_| TransportError::Io)?;
                }
                MBEDTLS_ERR_SSL_WANT_WRITE => {
                    self.socket.writable().await.map_err(|_| TransportError::Io)?;
                }
                rc => {
                    warn!("tls(espidf): handshake failed (rc={})", rc);
                    return Err(TransportError::Tls);
                }
            }
        }
    }
}

impl AsyncRead for TlsStream {
    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        loop {
            // SAFETY: session is established; buf is a valid mutable slice.
            let rc = unsafe { mbedtls_ssl_read(this.ssl.as_mut(), buf.as_mut_ptr(), buf.len()) };
            match rc {
                n if n > 0 => return Poll::Ready(Ok(n as usize)),
                0 | MBEDTLS_ERR_SSL_PEER_CLOSE_NOTIFY => return Poll::Ready(Ok(0)),
                MBEDTLS_ERR_SSL_WANT_READ => ready!(this.socket.poll_readable(cx))?,
                MBEDTLS_ERR_SSL_WANT_WRITE => ready!(this.socket.poll_writable(cx))?,
                MBEDTLS_ERR_SSL_RECEIVED_NEW_SESSION_TICKET => {}
                rc => return Poll::Ready(Err(session_error("ssl_read", rc))),
            }
        }
    }
}

impl AsyncWrite for TlsStream {
    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        loop {
            // SAFETY: session is established; buf is a valid slice.
            let rc = unsafe { mbedtls_ssl_write(this.ssl.as_mut(), buf.as_ptr(), buf.len()) };
            match rc {
                n if n >= 0 => return Poll::Ready(Ok(n as usize)),
                MBEDTLS_ERR_SSL_WANT_WRITE => ready!(this.socket.poll_writable(cx))?,
                MBEDTLS_ERR_SSL_WANT_READ => ready!(this.socket.poll_readable(cx))?,
                rc => return Poll::Ready(Err(session_error("ssl_write", rc))),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        // mbedtls_ssl_write hands complete records to the socket.
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        // SAFETY: session is valid; a non-blocking close_notify is best effort.
        let rc = unsafe { mbedtls_ssl_close_notify(this.ssl.as_mut()) };
        if rc != 0 {
            debug!("tls(espidf): close_notify rc={}", rc);
        }
        Poll::Ready(Ok(()))
    }
}

// ── Connector ─────────────────────────────────────────────────────────────────

/// Opens verified TLS sessions to the remote store.
pub struct TlsConnector {
    config: Rc<TlsConfig>,
    resolver: Resolver,
}

impl TlsConnector {
    pub fn new() -> Result<Self, TransportError> {
        let config = Rc::new(TlsConfig::new()?);
        info!("tls(espidf): client config ready (certificate bundle attached)");
        Ok(Self {
            config,
            resolver: Resolver::new(),
        })
    }
}

impl Connector for TlsConnector {
    type Connection = TlsStream;

    async fn connect(&self, host: &str, port: u16) -> Result<TlsStream, TransportError> {
        let addr = self.resolver.resolve(host, port).await?;

        let socket = Async::<TcpStream>::connect(addr).await.map_err(|e| {
            warn!("tls(espidf): connect {} failed: {}", addr, e);
            self.resolver.forget();
            TransportError::Connect
        })?;
        let fd = socket.get_ref().as_raw_fd();
        let hostname = CString::new(host).map_err(|_| TransportError::Connect)?;

        let mut stream = TlsStream {
            ssl: Box::new(mbedtls_ssl_context::default()),
            socket,
            _config: Rc::clone(&self.config),
        };

        // SAFETY: ssl is freshly allocated and initialised before use; the
        // config outlives the session through the `Rc`; fd stays open while
        // `stream.socket` lives.
        unsafe {
            mbedtls_ssl_init(stream.ssl.as_mut());

            let rc = mbedtls_ssl_setup(stream.ssl.as_mut(), self.config.conf.as_ref());
            if rc != 0 {
                warn!("tls(espidf): ssl_setup failed (rc={})", rc);
                return Err(TransportError::Tls);
            }

            let rc = mbedtls_ssl_set_hostname(stream.ssl.as_mut(), hostname.as_ptr());
            if rc != 0 {
                warn!("tls(espidf): set_hostname failed (rc={})", rc);
                return Err(TransportError::Tls);
            }

            mbedtls_ssl_set_bio(
                stream.ssl.as_mut(),
                fd as usize as *mut c_void,
                Some(bio_send),
                Some(bio_recv),
                None,
            );
        }

        stream.handshake().await?;
        debug!("tls(espidf): session up with {}:{} (fd={})", host, port, fd);
        Ok(stream)
    }
}
