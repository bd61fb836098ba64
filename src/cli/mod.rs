//! CLI interface for tickstream
//!
//! Provides subcommands for:
//! - `stream`: Subscribe to symbols and print live price updates
//! - `watchlist`: Show a user's watchlist symbols
//! - `config`: Show the effective configuration

mod stream;
mod watchlist;

pub use stream::StreamArgs;
pub use watchlist::WatchlistArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "tickstream")]
#[command(about = "Real-time stock market data streaming client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Subscribe to symbols and print live price updates
    Stream(StreamArgs),
    /// Show a user's watchlist symbols
    Watchlist(WatchlistArgs),
    /// Show the effective configuration
    Config,
}
