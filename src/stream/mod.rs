//! Stream orchestration
//!
//! The controller coordinates the transport, the subscription registry,
//! and the update bus; the registry reference-counts symbol interest so
//! concurrent consumers share one upstream subscription per symbol.

mod controller;
mod registry;
mod types;

pub use controller::StreamController;
pub use registry::SubscriptionRegistry;
pub use types::{StreamError, StreamState};
