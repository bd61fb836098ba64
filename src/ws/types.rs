//! Transport types and errors

use thiserror::Error;

/// Lifecycle state of the upstream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket held
    Disconnected,
    /// Connect attempt in flight
    Connecting,
    /// Socket established, send/receive allowed
    Open,
    /// Close handshake in progress
    Closing,
}

/// One inbound frame from the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text payload
    Text(String),
    /// Peer closed cleanly, or the transport was cancelled locally
    Closed,
}

/// Transport errors
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connect attempt failed (network, TLS, handshake)
    #[error("connection failed: {0}")]
    Connect(String),
    /// Operation requires an open connection
    #[error("not connected")]
    NotConnected,
    /// Frame could not be written to the socket
    #[error("send failed: {0}")]
    Send(String),
    /// Peer dropped the connection without a close handshake; recoverable
    /// by reconnecting
    #[error("connection closed prematurely")]
    ClosedPrematurely,
    /// Any other socket-level failure
    #[error("websocket error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Connect("timeout".to_string());
        assert_eq!(err.to_string(), "connection failed: timeout");

        let err = TransportError::NotConnected;
        assert_eq!(err.to_string(), "not connected");

        let err = TransportError::ClosedPrematurely;
        assert_eq!(err.to_string(), "connection closed prematurely");
    }

    #[test]
    fn test_connection_state_equality() {
        assert_eq!(ConnectionState::Open, ConnectionState::Open);
        assert_ne!(ConnectionState::Open, ConnectionState::Connecting);
    }

    #[test]
    fn test_frame_variants() {
        let frame = Frame::Text("{}".to_string());
        assert!(matches!(frame, Frame::Text(_)));
        assert_eq!(Frame::Closed, Frame::Closed);
    }
}
