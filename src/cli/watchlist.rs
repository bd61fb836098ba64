//! `watchlist` subcommand: show a user's symbols

use crate::watchlist::{StaticWatchlist, SymbolSource};
use clap::Args;

#[derive(Args, Debug)]
pub struct WatchlistArgs {
    /// User whose watchlist to show
    #[arg(default_value = "emilys")]
    pub user: String,

    /// Show only the user's favorites
    #[arg(long)]
    pub favorites: bool,
}

impl WatchlistArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let symbols = if self.favorites {
            StaticWatchlist.favorites_for_user(&self.user).await?
        } else {
            StaticWatchlist.symbols_for_user(&self.user).await?
        };

        if symbols.is_empty() {
            println!("No symbols for user '{}'", self.user);
        } else {
            for symbol in symbols {
                println!("{symbol}");
            }
        }
        Ok(())
    }
}
