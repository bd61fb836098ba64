//! tickstream: real-time stock market data streaming core
//!
//! Maintains a single persistent WebSocket connection to a price feed and
//! multiplexes symbol subscriptions from many in-process consumers over it:
//! - WebSocket transport with explicit lifecycle and cancellation
//! - Reference-counted symbol subscription registry
//! - Feed envelope decoding into typed price updates
//! - Broadcast bus with per-listener queues (slow consumers never block)
//! - Stream controller coordinating connect, subscribe, pause, and shutdown

pub mod bus;
pub mod cli;
pub mod config;
pub mod feed;
pub mod stream;
pub mod telemetry;
pub mod watchlist;
pub mod ws;
