//! Feed envelope encoding and decoding
//!
//! The feed speaks JSON text frames. Outbound control frames:
//! `{"type":"subscribe","symbol":"AAPL"}` (and `"unsubscribe"`). Inbound
//! data frames wrap a batch of trades:
//! `{"type":"trade","data":[{"s":"AAPL","p":150.25,"t":1700000000000,"v":10}]}`.
//! Keepalive frames (`{"type":"ping"}`) carry no data and decode to nothing.

use super::PriceUpdate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const TYPE_TRADE: &str = "trade";

/// Frame decoding errors; per-frame, never fatal to the receive loop
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame is not a well-formed feed envelope
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Vec<TradeEntry>,
}

#[derive(Debug, Deserialize)]
struct TradeEntry {
    /// Symbol
    s: String,
    /// Price; parsed from the raw JSON number so no float rounding occurs
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    p: Decimal,
    /// Trade timestamp, epoch milliseconds
    t: i64,
    /// Volume
    #[serde(default)]
    v: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ControlMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    symbol: &'a str,
}

/// Decode one inbound frame into zero or more price updates
///
/// Non-data envelopes (keepalive pings and anything else without trades)
/// decode to an empty vec. Malformed frames fail with [`DecodeError`]; the
/// caller logs and skips them.
pub fn decode(frame: &str) -> Result<Vec<PriceUpdate>, DecodeError> {
    let envelope: Envelope = serde_json::from_str(frame)?;
    if envelope.kind != TYPE_TRADE {
        return Ok(Vec::new());
    }
    Ok(envelope
        .data
        .into_iter()
        .map(|entry| PriceUpdate {
            symbol: entry.s,
            price: entry.p,
            timestamp_ms: entry.t,
            volume: entry.v,
        })
        .collect())
}

/// Build the subscribe control frame for a symbol
pub fn subscribe_frame(symbol: &str) -> serde_json::Result<String> {
    control_frame("subscribe", symbol)
}

/// Build the unsubscribe control frame for a symbol
pub fn unsubscribe_frame(symbol: &str) -> serde_json::Result<String> {
    control_frame("unsubscribe", symbol)
}

fn control_frame(kind: &str, symbol: &str) -> serde_json::Result<String> {
    serde_json::to_string(&ControlMessage { kind, symbol })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_decode_ping_yields_nothing() {
        let updates = decode(r#"{"type":"ping"}"#).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn test_decode_single_trade() {
        let frame = r#"{"type":"trade","data":[{"s":"AAPL","p":150.25,"t":1700000000000,"v":10}]}"#;
        let updates = decode(frame).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].symbol, "AAPL");
        assert_eq!(updates[0].price, dec!(150.25));
        assert_eq!(updates[0].timestamp_ms, 1_700_000_000_000);
        assert_eq!(updates[0].volume, Some(10));
    }

    #[test]
    fn test_decode_batch_preserves_order_and_count() {
        let frame = r#"{"type":"trade","data":[
            {"s":"AAPL","p":150.25,"t":1700000000000,"v":10},
            {"s":"MSFT","p":310.1,"t":1700000000001,"v":5},
            {"s":"AAPL","p":150.26,"t":1700000000002}
        ]}"#;
        let updates = decode(frame).unwrap();
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].symbol, "AAPL");
        assert_eq!(updates[1].symbol, "MSFT");
        assert_eq!(updates[1].price, dec!(310.1));
        assert_eq!(updates[2].volume, None);
    }

    #[test]
    fn test_decode_preserves_decimal_precision() {
        let frame = r#"{"type":"trade","data":[{"s":"BRK.A","p":628450.999999999,"t":1700000000000}]}"#;
        let updates = decode(frame).unwrap();
        assert_eq!(updates[0].price.to_string(), "628450.999999999");
    }

    #[test]
    fn test_decode_tolerates_unknown_fields() {
        // The live feed attaches trade conditions under "c"
        let frame = r#"{"type":"trade","data":[{"s":"AAPL","p":1.5,"t":1,"v":2,"c":["12","37"]}]}"#;
        let updates = decode(frame).unwrap();
        assert_eq!(updates[0].price, dec!(1.5));
    }

    #[test]
    fn test_decode_malformed_frame_fails() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"type":"trade","data":"nope"}"#).is_err());
    }

    #[test]
    fn test_decode_unknown_envelope_type_yields_nothing() {
        let updates = decode(r#"{"type":"news","headline":"..."}"#).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn test_subscribe_frame_wire_format() {
        let frame = subscribe_frame("AAPL").unwrap();
        assert_eq!(frame, r#"{"type":"subscribe","symbol":"AAPL"}"#);
    }

    #[test]
    fn test_unsubscribe_frame_wire_format() {
        let frame = unsubscribe_frame("MSFT").unwrap();
        assert_eq!(frame, r#"{"type":"unsubscribe","symbol":"MSFT"}"#);
    }
}
