//! User watchlists supplying the initial subscription set
//!
//! The real user store lives behind an HTTP API outside this core; the
//! static source below serves the same shape of data.

use async_trait::async_trait;

/// Trait for symbol sources backing a user's watchlist
#[async_trait]
pub trait SymbolSource: Send + Sync {
    /// All symbols a user follows, in display order
    async fn symbols_for_user(&self, username: &str) -> anyhow::Result<Vec<String>>;

    /// The user's favorite symbols, a subset of the watchlist
    async fn favorites_for_user(&self, username: &str) -> anyhow::Result<Vec<String>>;
}

/// Static in-memory watchlist source
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticWatchlist;

#[async_trait]
impl SymbolSource for StaticWatchlist {
    async fn symbols_for_user(&self, username: &str) -> anyhow::Result<Vec<String>> {
        let symbols: &[&str] = match username {
            "emilys" => &["AAPL", "GOOGL", "MSFT", "META", "AMZN", "NFLX"],
            "michaelw" => &["CVX", "XOM", "NOV", "OXY", "SLB", "COP", "HAL"],
            _ => &[],
        };
        Ok(symbols.iter().map(|s| s.to_string()).collect())
    }

    async fn favorites_for_user(&self, username: &str) -> anyhow::Result<Vec<String>> {
        let symbols: &[&str] = match username {
            "emilys" => &["AAPL", "GOOGL", "MSFT"],
            "michaelw" => &["CVX", "XOM", "NOV"],
            _ => &[],
        };
        Ok(symbols.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_user_watchlist() {
        let symbols = StaticWatchlist.symbols_for_user("emilys").await.unwrap();
        assert_eq!(symbols.len(), 6);
        assert_eq!(symbols[0], "AAPL");
    }

    #[tokio::test]
    async fn test_favorites_are_subset_of_watchlist() {
        let all = StaticWatchlist.symbols_for_user("michaelw").await.unwrap();
        let favorites = StaticWatchlist
            .favorites_for_user("michaelw")
            .await
            .unwrap();
        assert!(favorites.iter().all(|s| all.contains(s)));
        assert!(favorites.len() < all.len());
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_symbols() {
        let symbols = StaticWatchlist.symbols_for_user("nobody").await.unwrap();
        assert!(symbols.is_empty());
    }
}
