//! WebSocket transport owning the single feed connection
//!
//! The transport is split in two at connect time: the write half stays with
//! the `Transport` (connect/send/close are serialized by the caller), while
//! the read half is handed out once as a [`FrameReader`] to the background
//! receive loop, which is the sole reader of the socket.

use super::types::{ConnectionState, Frame, TransportError};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Byte-level conduit to one upstream feed endpoint
pub struct Transport {
    url: String,
    state: ConnectionState,
    generation: u64,
    write: Option<SplitSink<WsStream, Message>>,
    reader: Option<FrameReader>,
    cancel: CancellationToken,
}

impl Transport {
    /// Create a transport for the given endpoint; does not connect
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: ConnectionState::Disconnected,
            generation: 0,
            write: None,
            reader: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the connection is open
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Establish the connection if not already open
    ///
    /// Returns `Ok(true)` when a new connection was established and
    /// `Ok(false)` when the transport was already open. On failure the
    /// state falls back to `Disconnected`.
    pub async fn connect(&mut self) -> Result<bool, TransportError> {
        if self.state == ConnectionState::Open {
            return Ok(false);
        }

        self.state = ConnectionState::Connecting;
        tracing::info!(url = %self.url, "Connecting to feed");

        let (ws_stream, _response) = match connect_async(&self.url).await {
            Ok(ok) => ok,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(TransportError::Connect(e.to_string()));
            }
        };

        let (write, read) = ws_stream.split();
        self.cancel = CancellationToken::new();
        self.generation += 1;
        self.write = Some(write);
        self.reader = Some(FrameReader {
            read,
            cancel: self.cancel.child_token(),
            generation: self.generation,
        });
        self.state = ConnectionState::Open;

        tracing::info!("Feed connected");
        Ok(true)
    }

    /// Send a text frame to the feed
    pub async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.state != ConnectionState::Open {
            return Err(TransportError::NotConnected);
        }
        let write = self.write.as_mut().ok_or(TransportError::NotConnected)?;
        write
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    /// Hand out the read half of the current connection
    ///
    /// Returns `None` when not connected or when the reader was already
    /// taken; there is exactly one reader per connection.
    pub fn take_reader(&mut self) -> Option<FrameReader> {
        self.reader.take()
    }

    /// Close the connection
    ///
    /// Sends a close frame when open (best effort), cancels the reader so an
    /// in-flight receive unblocks, and always releases the socket. Idempotent
    /// and never fails.
    pub async fn close(&mut self) {
        if self.state == ConnectionState::Open {
            self.state = ConnectionState::Closing;
            if let Some(write) = self.write.as_mut() {
                if let Err(e) = write.send(Message::Close(None)).await {
                    tracing::debug!(error = %e, "Close frame not delivered");
                }
            }
        }
        self.cancel.cancel();
        self.write = None;
        self.reader = None;
        self.state = ConnectionState::Disconnected;
    }

    /// Release the socket if `generation` still names the live connection
    ///
    /// Called by the receive loop after its reader dies so a later `connect`
    /// starts fresh; a no-op if the transport has reconnected since.
    pub async fn invalidate(&mut self, generation: u64) {
        if self.generation == generation && self.state == ConnectionState::Open {
            tracing::debug!(generation, "Invalidating dead connection");
            self.close().await;
        }
    }
}

/// Sole reader of one connection's inbound frames
pub struct FrameReader {
    read: SplitStream<WsStream>,
    cancel: CancellationToken,
    generation: u64,
}

impl FrameReader {
    /// Connection generation this reader belongs to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Read the next inbound frame
    ///
    /// Cancellation (via `Transport::close`) and a clean peer close both
    /// yield `Frame::Closed`. A peer that drops the socket without a close
    /// handshake yields `TransportError::ClosedPrematurely`; other socket
    /// failures yield `TransportError::Io`.
    pub async fn receive(&mut self) -> Result<Frame, TransportError> {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(Frame::Closed),
                msg = self.read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => return Ok(Frame::Text(text)),
                        Some(Ok(Message::Close(_))) => return Ok(Frame::Closed),
                        // WebSocket-level ping/pong/binary are protocol noise here
                        Some(Ok(_)) => continue,
                        Some(Err(WsError::ConnectionClosed)) | Some(Err(WsError::AlreadyClosed)) => {
                            return Ok(Frame::Closed)
                        }
                        Some(Err(WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake))) => {
                            return Err(TransportError::ClosedPrematurely)
                        }
                        Some(Err(e)) => return Err(TransportError::Io(e.to_string())),
                        None => return Err(TransportError::ClosedPrematurely),
                    }
                }
            }
        }
    }
}
