//! Market data feed protocol
//!
//! Decodes inbound feed envelopes into typed price updates and builds the
//! outbound subscribe/unsubscribe control frames.

mod codec;
mod types;

pub use codec::{decode, subscribe_frame, unsubscribe_frame, DecodeError};
pub use types::PriceUpdate;
