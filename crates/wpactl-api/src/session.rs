//! Control-socket session: one connection, one reader, one command in flight.
//!
//! The daemon's protocol carries no request identifiers, so replies are
//! correlated purely by position: while a command is outstanding, the first
//! message that is not an event is its reply. Everything else is published
//! on the session's [`EventBus`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio::net::UnixDatagram;
//! use wpactl_api::{Session, SessionConfig, command, event};
//!
//! let socket = UnixDatagram::unbound()?;
//! socket.connect("/var/run/wpa_supplicant/wlan0")?;
//!
//! let session = Session::open(socket, SessionConfig::default());
//! session.attach().await?;
//!
//! let done = session.subscribe([event::SCAN_RESULTS_READY]);
//! session.send_command_bool(&[command::SCAN]).await?;
//! done.next().await;
//! ```

use std::sync::{Arc, PoisonError};

use tokio::net::UnixDatagram;
use tokio::sync::{Mutex, OwnedMutexGuard, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace, warn};

use crate::bus::{DEFAULT_EVENT_BUFFER, EventBus, Subscription};
use crate::command::{self, REPLY_OK, REPLY_PONG};
use crate::error::Error;
use crate::event::{EVENT_MARKER, Event};

/// Receive buffer size used when no explicit size is configured.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024;

/// The outstanding command's reply slot. It owns the command lock, so
/// exclusivity ends when the reply is consumed (or the session closes),
/// not when the caller stops waiting.
struct PendingReply {
    tx: oneshot::Sender<Result<String, Error>>,
    _in_flight: OwnedMutexGuard<()>,
}

// ── SessionConfig ────────────────────────────────────────────────────

/// Tuning for a single control session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Capacity of each subscription's event buffer. Default: 64.
    pub event_buffer: usize,

    /// Largest message the reader accepts; longer datagrams are truncated
    /// by the socket. Default: 16 KiB.
    pub max_message_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            event_buffer: DEFAULT_EVENT_BUFFER,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// Handle to a running control session.
///
/// Cheaply cloneable. The background reader runs until
/// [`close`](Self::close) is called, the socket fails, or the last handle
/// is dropped.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
    _alive: Arc<DropGuard>,
}

struct SessionInner {
    socket: UnixDatagram,
    bus: Arc<EventBus>,
    /// Held from send until the reply is consumed, so at most one command
    /// is outstanding.
    command_lock: Arc<Mutex<()>>,
    /// Never held across an await.
    pending: std::sync::Mutex<Option<PendingReply>>,
    cancel: CancellationToken,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Take ownership of a connected socket and spawn the reader task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(socket: UnixDatagram, config: SessionConfig) -> Self {
        let inner = Arc::new(SessionInner {
            socket,
            bus: Arc::new(EventBus::new(config.event_buffer)),
            command_lock: Arc::new(Mutex::new(())),
            pending: std::sync::Mutex::new(None),
            cancel: CancellationToken::new(),
            reader: Mutex::new(None),
        });

        let handle = tokio::spawn(read_loop(
            Arc::clone(&inner),
            config.max_message_size.max(1),
        ));
        // Freshly created and uncontended.
        if let Ok(mut slot) = inner.reader.try_lock() {
            *slot = Some(handle);
        }

        debug!("control session opened");
        let alive = Arc::new(inner.cancel.clone().drop_guard());
        Self {
            inner,
            _alive: alive,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Send a command and return the raw reply.
    ///
    /// Blocks until any command already in flight has been answered. If
    /// the returned future is dropped before its reply arrives, the next
    /// command still waits for that reply, which is then discarded.
    pub async fn send_command(&self, parts: &[&str]) -> Result<String, Error> {
        let verb = command::verb(parts);
        let message = command::encode(parts);

        let in_flight = Arc::clone(&self.inner.command_lock).lock_owned().await;
        if self.inner.cancel.is_cancelled() {
            return Err(Error::Closed);
        }

        // Install the reply slot before writing so a fast reply is never
        // misread as an event.
        let (tx, mut rx) = oneshot::channel();
        self.inner.set_pending(PendingReply {
            tx,
            _in_flight: in_flight,
        });
        let unsent = Unsent(self.inner.as_ref());

        debug!(command = verb, "sending command");
        if let Err(e) = self.inner.socket.send(message.as_bytes()).await {
            drop(unsent);
            warn!(command = verb, error = %e, "control socket send failed");
            return Err(Error::Io(e));
        }
        unsent.sent();

        tokio::select! {
            biased;
            reply = &mut rx => reply.map_err(|_| Error::Closed)?,
            () = self.inner.cancel.cancelled() => Err(Error::Closed),
        }
    }

    /// Send a command that answers `OK` on success.
    pub async fn send_command_bool(&self, parts: &[&str]) -> Result<(), Error> {
        let reply = self.send_command(parts).await?;
        if reply.trim().eq_ignore_ascii_case(REPLY_OK) {
            Ok(())
        } else {
            Err(Error::Rejected {
                command: command::verb(parts).to_owned(),
                reply: reply.trim().to_owned(),
            })
        }
    }

    /// Send a command that answers with a decimal integer.
    pub async fn send_command_int(&self, parts: &[&str]) -> Result<i32, Error> {
        let reply = self.send_command(parts).await?;
        reply.trim().parse().map_err(|e: std::num::ParseIntError| Error::Protocol {
            command: command::verb(parts).to_owned(),
            reply: reply.trim().to_owned(),
            reason: e.to_string(),
        })
    }

    /// Ask the daemon to deliver unsolicited events on this socket.
    pub async fn attach(&self) -> Result<(), Error> {
        self.send_command_bool(&[command::ATTACH]).await
    }

    /// Stop unsolicited event delivery on this socket.
    pub async fn detach(&self) -> Result<(), Error> {
        self.send_command_bool(&[command::DETACH]).await
    }

    /// Liveness check; the daemon answers `PONG`.
    pub async fn ping(&self) -> Result<(), Error> {
        let reply = self.send_command(&[command::PING]).await?;
        if reply.trim() == REPLY_PONG {
            Ok(())
        } else {
            Err(Error::Protocol {
                command: command::PING.to_owned(),
                reply: reply.trim().to_owned(),
                reason: format!("expected {REPLY_PONG}"),
            })
        }
    }

    // ── Events ───────────────────────────────────────────────────────

    /// Subscribe to the given event names on this session.
    pub fn subscribe<I, S>(&self, topics: I) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.bus.subscribe(topics)
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.inner.bus
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Close the session: fail the pending command, close every
    /// subscription, and wait for the reader to exit. Idempotent.
    pub async fn close(&self) {
        self.inner.shutdown();

        let handle = self.inner.reader.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "control session reader ended abnormally");
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("closed", &self.is_closed())
            .field("subscribers", &self.inner.bus.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl SessionInner {
    fn set_pending(&self, pending: PendingReply) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(pending);
    }

    fn take_pending(&self) -> Option<PendingReply> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Route one inbound message to the waiting command or to the bus.
    fn dispatch(&self, message: String) {
        if !message.starts_with(EVENT_MARKER) {
            if let Some(pending) = self.take_pending() {
                trace!(bytes = message.len(), "reply received");
                if pending.tx.send(Ok(message)).is_err() {
                    debug!("discarding reply to abandoned command");
                }
                return;
            }
        }

        match Event::parse(&message) {
            Some(event) => {
                debug!(event = %event.name, "event received");
                self.bus.publish(&event);
            }
            None => trace!("discarding empty message"),
        }
    }

    fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            debug!("control session closing");
        }
        self.cancel.cancel();
        self.bus.close();
        if let Some(pending) = self.take_pending() {
            let _ = pending.tx.send(Err(Error::Closed));
        }
    }
}

/// Clears the reply slot, and with it the command lock, if a command is
/// dropped or fails before reaching the socket.
struct Unsent<'a>(&'a SessionInner);

impl Unsent<'_> {
    fn sent(self) {
        std::mem::forget(self);
    }
}

impl Drop for Unsent<'_> {
    fn drop(&mut self) {
        drop(self.0.take_pending());
    }
}

// ── Background reader ────────────────────────────────────────────────

/// Read messages until the session is cancelled or the socket fails.
async fn read_loop(inner: Arc<SessionInner>, max_message_size: usize) {
    let mut buf = vec![0u8; max_message_size];

    loop {
        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => break,
            received = inner.socket.recv(&mut buf) => match received {
                Ok(0) => {
                    debug!("control socket returned end of stream");
                    break;
                }
                Ok(len) => {
                    let message = String::from_utf8_lossy(&buf[..len]).into_owned();
                    inner.dispatch(message);
                }
                Err(e) => {
                    warn!(error = %e, "control socket receive failed");
                    break;
                }
            },
        }
    }

    inner.shutdown();
    debug!("control session reader exiting");
}
