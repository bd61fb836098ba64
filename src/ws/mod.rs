//! WebSocket transport layer
//!
//! Owns the single upstream feed connection: connect, send, the sole
//! frame reader, and cancellable teardown.

mod transport;
mod types;

pub use transport::{FrameReader, Transport};
pub use types::{ConnectionState, Frame, TransportError};
