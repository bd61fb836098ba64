//! Reference-counted symbol subscription registry
//!
//! Tracks which symbols are subscribed upstream and how many in-process
//! consumers share each one. The map never leaves this module; all
//! mutations go through the mutex so concurrent acquire/release for the
//! same symbol can neither drive a count negative nor produce duplicate
//! upstream (un)subscribes.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Symbol-level reference counting shared by all consumers of one transport
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<HashMap<String, usize>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in a symbol
    ///
    /// Returns `true` when this caller registered the first interest, in
    /// which case the caller must send the upstream subscribe.
    pub fn acquire(&self, symbol: &str) -> bool {
        let mut entries = self.entries.lock();
        let count = entries.entry(symbol.to_string()).or_insert(0);
        *count += 1;
        *count == 1
    }

    /// Release interest in a symbol
    ///
    /// Returns `true` when the last interest was released and the entry
    /// removed, in which case the caller must send the upstream
    /// unsubscribe. Releasing a symbol with no entry is a no-op.
    pub fn release(&self, symbol: &str) -> bool {
        let mut entries = self.entries.lock();
        match entries.get_mut(symbol) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                entries.remove(symbol);
                true
            }
            None => false,
        }
    }

    /// Current reference count for a symbol (0 if absent)
    pub fn ref_count(&self, symbol: &str) -> usize {
        self.entries.lock().get(symbol).copied().unwrap_or(0)
    }

    /// All currently subscribed symbols, sorted
    pub fn active(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.entries.lock().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Whether no symbol is subscribed
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop every entry, returning the symbols that were subscribed
    pub fn clear(&self) -> Vec<String> {
        let mut entries = self.entries.lock();
        let mut symbols: Vec<String> = entries.keys().cloned().collect();
        symbols.sort();
        entries.clear();
        symbols
    }
}
