//! Stream controller types and errors

use crate::ws::TransportError;
use thiserror::Error;

/// Lifecycle state of the stream controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Created, nothing started
    Idle,
    /// Connect attempt in flight
    Connecting,
    /// Receive loop running with at least one active subscription
    Streaming,
    /// Connection lost or all subscriptions released; restartable
    Paused,
    /// Stopped; terminal
    Closed,
}

/// Errors surfaced by stream control operations
#[derive(Debug, Error)]
pub enum StreamError {
    /// Connect attempt failed
    #[error("failed to connect to feed: {0}")]
    Connection(#[source] TransportError),
    /// A subscribe/unsubscribe control frame could not be delivered
    #[error("subscription failed for {symbol}: {reason}")]
    Subscription {
        /// Symbol whose control frame failed
        symbol: String,
        /// Underlying send failure
        reason: String,
    },
    /// The controller was stopped and accepts no further operations
    #[error("stream controller is closed")]
    Closed,
}
