//! Stream controller: the façade over transport, registry, and bus
//!
//! One controller serves every in-process consumer of the same feed; the
//! single-symbol and multi-symbol cases are the same operation with a set
//! of size one. The background receive loop is the only reader of the
//! socket, and control operations never block it: the registry and state
//! take short mutexes, the transport's async mutex is held only across
//! connect/send/close.

use super::registry::SubscriptionRegistry;
use super::types::{StreamError, StreamState};
use crate::bus::{ListenerHandle, Subscription, SymbolFilter, UpdateBus};
use crate::config::FeedConfig;
use crate::feed;
use crate::ws::{Frame, FrameReader, Transport, TransportError};
use std::sync::Arc;
use tokio::task::JoinHandle;

struct Inner {
    transport: tokio::sync::Mutex<Transport>,
    registry: SubscriptionRegistry,
    bus: UpdateBus,
    state: parking_lot::Mutex<StreamState>,
    receive_loop: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

/// Coordinates the shared feed connection for any number of consumers
///
/// Cheap to clone; clones share the same connection, registry, and bus.
#[derive(Clone)]
pub struct StreamController {
    inner: Arc<Inner>,
}

impl StreamController {
    /// Create a controller for the configured feed; does not connect
    pub fn new(config: FeedConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport: tokio::sync::Mutex::new(Transport::new(config.endpoint())),
                registry: SubscriptionRegistry::new(),
                bus: UpdateBus::new(),
                state: parking_lot::Mutex::new(StreamState::Idle),
                receive_loop: parking_lot::Mutex::new(None),
            }),
        }
    }

    /// Current controller state
    pub fn state(&self) -> StreamState {
        *self.inner.state.lock()
    }

    /// Whether the upstream connection is open
    pub async fn is_connected(&self) -> bool {
        self.inner.transport.lock().await.is_open()
    }

    /// Register a bus listener; see [`UpdateBus::subscribe`]
    pub fn subscribe_to_updates(&self, filter: SymbolFilter) -> Subscription {
        self.inner.bus.subscribe(filter)
    }

    /// Deregister a bus listener; idempotent
    pub fn unsubscribe(&self, handle: ListenerHandle) {
        self.inner.bus.remove(handle);
    }

    /// Start (or resume) streaming for the given symbols
    ///
    /// Connects if needed, subscribes upstream only for symbols gaining
    /// their first interested consumer, and launches the receive loop if
    /// not already running. After a lost connection this reconnects and
    /// resubscribes every symbol still held in the registry.
    pub async fn start<I, S>(&self, symbols: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut transport = self.inner.transport.lock().await;

        // The Closed check must happen under the transport lock: stop()
        // commits the terminal state while holding it, so a start racing
        // with stop either completes first or observes Closed here.
        if self.state() == StreamState::Closed {
            return Err(StreamError::Closed);
        }

        if !transport.is_open() {
            *self.inner.state.lock() = StreamState::Connecting;
        }
        let newly_connected = match transport.connect().await {
            Ok(newly_connected) => newly_connected,
            Err(e) => {
                self.settle_state_after_failure();
                return Err(StreamError::Connection(e));
            }
        };

        // Track which symbols this call acquired so a send failure can
        // roll the counts back.
        let mut acquired: Vec<String> = Vec::new();
        let mut first_interest: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim();
            if symbol.is_empty() {
                continue;
            }
            if self.inner.registry.acquire(symbol) {
                first_interest.push(symbol.to_string());
            } else {
                tracing::debug!(symbol, "Symbol already subscribed upstream");
            }
            acquired.push(symbol.to_string());
        }

        // A fresh connection knows nothing: resubscribe everything active,
        // not just the symbols newly acquired by this call.
        let to_subscribe = if newly_connected {
            self.inner.registry.active()
        } else {
            first_interest
        };

        for symbol in &to_subscribe {
            if let Err(reason) = send_control(&mut transport, symbol, true).await {
                for held in &acquired {
                    self.inner.registry.release(held);
                }
                self.settle_state_after_failure();
                return Err(StreamError::Subscription {
                    symbol: symbol.clone(),
                    reason,
                });
            }
            tracing::info!(symbol, "Subscribed");
        }

        self.spawn_receive_loop(&mut transport);
        *self.inner.state.lock() = StreamState::Streaming;
        Ok(())
    }

    /// Release the given symbols, unsubscribing upstream for any whose
    /// last interested consumer just left
    ///
    /// The connection stays open for the remaining consumers; the state
    /// drops to `Paused` only once no symbol is subscribed at all. A
    /// failed unsubscribe send is logged and the first one surfaced after
    /// all symbols have been released.
    pub async fn pause<I, S>(&self, symbols: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut transport = self.inner.transport.lock().await;

        // Same terminal-state discipline as start(): Closed is only
        // written under the transport lock.
        if self.state() == StreamState::Closed {
            return Err(StreamError::Closed);
        }

        let mut first_err: Option<StreamError> = None;

        for symbol in symbols {
            let symbol = symbol.as_ref().trim();
            if symbol.is_empty() || !self.inner.registry.release(symbol) {
                continue;
            }
            if !transport.is_open() {
                continue;
            }
            match send_control(&mut transport, symbol, false).await {
                Ok(()) => tracing::info!(symbol, "Unsubscribed"),
                Err(reason) => {
                    tracing::warn!(symbol, %reason, "Failed to send unsubscribe");
                    first_err.get_or_insert(StreamError::Subscription {
                        symbol: symbol.to_string(),
                        reason,
                    });
                }
            }
        }

        if self.inner.registry.is_empty() {
            let mut state = self.inner.state.lock();
            if *state == StreamState::Streaming {
                *state = StreamState::Paused;
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Stop the controller: release all symbols, close the connection,
    /// end the receive loop, and terminate every bus listener
    ///
    /// Terminal; subsequent control operations fail with
    /// [`StreamError::Closed`] and repeated calls are no-ops.
    pub async fn stop(&self) {
        // The terminal transition happens entirely under the transport
        // lock so it cannot interleave with a start() that is mid-connect:
        // whichever takes the lock first runs to completion, and a start
        // that loses the race observes Closed before touching the registry.
        // The lock is released before awaiting the loop: its exit path
        // takes it too.
        {
            let mut transport = self.inner.transport.lock().await;
            {
                let mut state = self.inner.state.lock();
                if *state == StreamState::Closed {
                    return;
                }
                *state = StreamState::Closed;
            }

            let released = self.inner.registry.clear();
            if !released.is_empty() {
                tracing::info!(symbols = ?released, "Released all subscriptions");
            }

            transport.close().await;
        }

        let handle = self.inner.receive_loop.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "Receive loop panicked");
                }
            }
        }

        self.inner.bus.close();
        tracing::info!("Stream controller closed");
    }

    fn spawn_receive_loop(&self, transport: &mut Transport) {
        let mut guard = self.inner.receive_loop.lock();
        if let Some(handle) = guard.as_ref() {
            if !handle.is_finished() {
                return;
            }
        }
        let Some(reader) = transport.take_reader() else {
            return;
        };
        let inner = Arc::clone(&self.inner);
        *guard = Some(tokio::spawn(run_receive_loop(reader, inner)));
    }

    // After a failed connect or subscribe the controller is restartable:
    // Paused when symbols are still held, Idle otherwise.
    fn settle_state_after_failure(&self) {
        let mut state = self.inner.state.lock();
        if *state == StreamState::Closed {
            return;
        }
        *state = if self.inner.registry.is_empty() {
            StreamState::Idle
        } else {
            StreamState::Paused
        };
    }
}

async fn send_control(
    transport: &mut Transport,
    symbol: &str,
    subscribe: bool,
) -> Result<(), String> {
    let frame = if subscribe {
        feed::subscribe_frame(symbol)
    } else {
        feed::unsubscribe_frame(symbol)
    }
    .map_err(|e| e.to_string())?;
    transport.send(frame).await.map_err(|e| e.to_string())
}

/// The single background receive loop: read, decode, publish
///
/// No error escapes this loop. Per-frame decode failures are logged and
/// skipped; transport failures end the loop and demote the state so the
/// caller can decide whether to `start` again (no automatic reconnect).
async fn run_receive_loop(mut reader: FrameReader, inner: Arc<Inner>) {
    tracing::info!("Receive loop started");
    let generation = reader.generation();

    loop {
        match reader.receive().await {
            Ok(Frame::Text(text)) => match feed::decode(&text) {
                Ok(updates) => {
                    for update in updates {
                        inner.bus.publish(&update);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        preview = %text.chars().take(100).collect::<String>(),
                        "Skipping malformed frame"
                    );
                }
            },
            Ok(Frame::Closed) => {
                tracing::info!("Feed connection closed");
                break;
            }
            Err(TransportError::ClosedPrematurely) => {
                tracing::warn!("Feed connection closed prematurely; call start to resume");
                break;
            }
            Err(e) => {
                tracing::error!(error = %e, "Receive loop transport error");
                break;
            }
        }
    }

    // Release the dead socket so a later start() reconnects, and drop
    // Streaming so the state reflects that updates stopped flowing.
    // Both are no-ops when stop() already closed the controller.
    inner.transport.lock().await.invalidate(generation).await;
    {
        let mut state = inner.state.lock();
        if *state == StreamState::Streaming {
            *state = StreamState::Paused;
        }
    }
    tracing::info!("Receive loop stopped");
}
