//! Price feed data model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price update decoded from the feed
///
/// Immutable value; the feed may resend the same trade, duplicates are valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    /// Ticker symbol (e.g. "AAPL")
    pub symbol: String,
    /// Trade price, full precision as supplied by the feed
    pub price: Decimal,
    /// Trade timestamp, epoch milliseconds
    pub timestamp_ms: i64,
    /// Trade volume, when the feed supplies it
    pub volume: Option<u64>,
}
