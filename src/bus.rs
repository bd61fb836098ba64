//! Update bus: fan-out of price updates to independent listeners
//!
//! Every listener gets its own unbounded queue, so publishing never blocks
//! and a slow consumer cannot stall the receive loop or starve the other
//! listeners. Per-listener queues are FIFO, preserving decode order.

use crate::feed::PriceUpdate;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Symbol filter deciding which updates a listener receives
#[derive(Clone)]
pub enum SymbolFilter {
    /// Every update
    All,
    /// Updates for exactly one symbol
    Symbol(String),
    /// Updates for any symbol in a set
    Symbols(HashSet<String>),
    /// Arbitrary predicate on the symbol
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl SymbolFilter {
    /// Filter matching a single symbol
    pub fn symbol(symbol: impl Into<String>) -> Self {
        Self::Symbol(symbol.into())
    }

    /// Filter matching any symbol in the given set
    pub fn symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Symbols(symbols.into_iter().map(Into::into).collect())
    }

    /// Whether an update for `symbol` passes this filter
    pub fn matches(&self, symbol: &str) -> bool {
        match self {
            Self::All => true,
            Self::Symbol(s) => s == symbol,
            Self::Symbols(set) => set.contains(symbol),
            Self::Predicate(pred) => pred(symbol),
        }
    }
}

impl fmt::Debug for SymbolFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "SymbolFilter::All"),
            Self::Symbol(s) => write!(f, "SymbolFilter::Symbol({s})"),
            Self::Symbols(set) => write!(f, "SymbolFilter::Symbols({set:?})"),
            Self::Predicate(_) => write!(f, "SymbolFilter::Predicate(..)"),
        }
    }
}

/// Opaque token identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// A registered listener: its handle plus the update queue to drain
#[derive(Debug)]
pub struct Subscription {
    /// Token for [`UpdateBus::remove`]
    pub handle: ListenerHandle,
    /// Receives matching updates in publish order; yields `None` once the
    /// listener is removed or the bus is closed
    pub updates: mpsc::UnboundedReceiver<PriceUpdate>,
}

struct Listener {
    filter: SymbolFilter,
    tx: mpsc::UnboundedSender<PriceUpdate>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    closed: bool,
    listeners: HashMap<u64, Listener>,
}

/// Broadcast bus for decoded price updates
#[derive(Default)]
pub struct UpdateBus {
    inner: Mutex<BusInner>,
}

impl UpdateBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; updates matching `filter` land in its queue
    ///
    /// After [`close`](Self::close) the returned queue is already
    /// terminated and will never yield an update.
    pub fn subscribe(&self, filter: SymbolFilter) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        if inner.closed {
            drop(tx);
        } else {
            inner.listeners.insert(id, Listener { filter, tx });
        }
        Subscription {
            handle: ListenerHandle(id),
            updates: rx,
        }
    }

    /// Deliver one update to every matching listener
    ///
    /// Never blocks; listeners whose receiver was dropped are pruned here.
    pub fn publish(&self, update: &PriceUpdate) {
        let mut inner = self.inner.lock();
        inner.listeners.retain(|id, listener| {
            if !listener.filter.matches(&update.symbol) {
                return true;
            }
            match listener.tx.send(update.clone()) {
                Ok(()) => true,
                Err(_) => {
                    tracing::debug!(listener = *id, "Listener receiver dropped, pruning");
                    false
                }
            }
        });
    }

    /// Deregister a listener; its queue terminates after any already
    /// queued updates. Idempotent.
    pub fn remove(&self, handle: ListenerHandle) {
        let mut inner = self.inner.lock();
        if inner.listeners.remove(&handle.0).is_some() {
            tracing::debug!(listener = handle.0, "Listener removed");
        }
    }

    /// Drop every listener; all queues terminate and later subscriptions
    /// are inert
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.listeners.clear();
    }

    /// Number of currently registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn update(symbol: &str, price: i64) -> PriceUpdate {
        PriceUpdate {
            symbol: symbol.to_string(),
            price: Decimal::from(price),
            timestamp_ms: 1_700_000_000_000,
            volume: None,
        }
    }

    #[tokio::test]
    async fn test_filtered_listener_never_sees_other_symbols() {
        let bus = UpdateBus::new();
        let mut aapl = bus.subscribe(SymbolFilter::symbol("AAPL"));

        bus.publish(&update("MSFT", 1));
        bus.publish(&update("AAPL", 2));
        bus.publish(&update("TSLA", 3));
        bus.publish(&update("AAPL", 4));

        assert_eq!(aapl.updates.recv().await.unwrap().price, Decimal::from(2));
        assert_eq!(aapl.updates.recv().await.unwrap().price, Decimal::from(4));
        assert!(aapl.updates.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_set_filter_matches_members() {
        let bus = UpdateBus::new();
        let mut favorites = bus.subscribe(SymbolFilter::symbols(["AAPL", "GOOGL"]));

        bus.publish(&update("MSFT", 1));
        bus.publish(&update("GOOGL", 2));

        assert_eq!(favorites.updates.recv().await.unwrap().symbol, "GOOGL");
    }

    #[tokio::test]
    async fn test_predicate_filter() {
        let bus = UpdateBus::new();
        let mut sub = bus.subscribe(SymbolFilter::Predicate(Arc::new(|s: &str| {
            s.starts_with('A')
        })));

        bus.publish(&update("MSFT", 1));
        bus.publish(&update("AMZN", 2));

        assert_eq!(sub.updates.recv().await.unwrap().symbol, "AMZN");
    }

    #[tokio::test]
    async fn test_updates_arrive_in_publish_order() {
        let bus = UpdateBus::new();
        let mut sub = bus.subscribe(SymbolFilter::All);

        for i in 0..100 {
            bus.publish(&update("AAPL", i));
        }
        for i in 0..100 {
            assert_eq!(sub.updates.recv().await.unwrap().price, Decimal::from(i));
        }
    }

    #[tokio::test]
    async fn test_slow_listener_does_not_block_others() {
        let bus = UpdateBus::new();
        let _slow = bus.subscribe(SymbolFilter::All); // never drained
        let mut fast = bus.subscribe(SymbolFilter::All);

        for i in 0..1000 {
            bus.publish(&update("AAPL", i));
        }
        for i in 0..1000 {
            assert_eq!(fast.updates.recv().await.unwrap().price, Decimal::from(i));
        }
    }

    #[tokio::test]
    async fn test_remove_stops_delivery_and_is_idempotent() {
        let bus = UpdateBus::new();
        let mut sub = bus.subscribe(SymbolFilter::All);

        bus.publish(&update("AAPL", 1));
        bus.remove(sub.handle);
        bus.remove(sub.handle); // second call is a no-op
        bus.publish(&update("AAPL", 2));

        // Already-queued update drains, then the queue terminates
        assert_eq!(sub.updates.recv().await.unwrap().price, Decimal::from(1));
        assert!(sub.updates.recv().await.is_none());
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_remove_while_consuming() {
        let bus = UpdateBus::new();
        let mut sub = bus.subscribe(SymbolFilter::All);

        bus.publish(&update("AAPL", 1));
        let first = sub.updates.recv().await.unwrap();
        assert_eq!(first.price, Decimal::from(1));

        // Removing from the consumer's own context must not deadlock
        bus.remove(sub.handle);
        assert!(sub.updates.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned_on_publish() {
        let bus = UpdateBus::new();
        let sub = bus.subscribe(SymbolFilter::All);
        drop(sub);
        assert_eq!(bus.listener_count(), 1);

        bus.publish(&update("AAPL", 1));
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_close_terminates_all_listeners() {
        let bus = UpdateBus::new();
        let mut sub = bus.subscribe(SymbolFilter::All);

        bus.close();
        assert!(sub.updates.recv().await.is_none());

        // Subscriptions after close are inert
        let mut late = bus.subscribe(SymbolFilter::All);
        assert!(late.updates.recv().await.is_none());
    }

    #[test]
    fn test_filter_matches() {
        assert!(SymbolFilter::All.matches("AAPL"));
        assert!(SymbolFilter::symbol("AAPL").matches("AAPL"));
        assert!(!SymbolFilter::symbol("AAPL").matches("MSFT"));
        assert!(SymbolFilter::symbols(["A", "B"]).matches("B"));
        assert!(!SymbolFilter::symbols(["A", "B"]).matches("C"));
    }
}
