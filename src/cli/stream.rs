//! `stream` subcommand: live price updates on stdout

use crate::bus::SymbolFilter;
use crate::config::Config;
use crate::feed::PriceUpdate;
use crate::stream::StreamController;
use crate::watchlist::{StaticWatchlist, SymbolSource};
use chrono::{TimeZone, Utc};
use clap::Args;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Symbols to stream (e.g. AAPL MSFT); defaults to the user's watchlist
    #[arg(value_name = "SYMBOL")]
    pub symbols: Vec<String>,

    /// User whose watchlist to stream when no symbols are given
    #[arg(short, long, default_value = "emilys")]
    pub user: String,

    /// Stop after this many seconds (runs until Ctrl-C when omitted)
    #[arg(short, long)]
    pub duration: Option<u64>,
}

impl StreamArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let symbols = if self.symbols.is_empty() {
            StaticWatchlist.symbols_for_user(&self.user).await?
        } else {
            self.symbols.clone()
        };
        anyhow::ensure!(
            !symbols.is_empty(),
            "no symbols to stream (unknown user '{}'?)",
            self.user
        );

        let controller = StreamController::new(config.feed.clone());
        let mut subscription = controller.subscribe_to_updates(SymbolFilter::All);

        tracing::info!(symbols = ?symbols, "Starting stream");
        controller.start(&symbols).await?;

        tokio::select! {
            _ = async {
                while let Some(update) = subscription.updates.recv().await {
                    print_update(&update);
                }
            } => {
                tracing::warn!("Update stream ended");
            }
            _ = shutdown_signal(self.duration) => {}
        }

        controller.stop().await;
        Ok(())
    }
}

// Epoch millis are converted to display time only here, at the edge.
fn print_update(update: &PriceUpdate) {
    let timestamp = Utc
        .timestamp_millis_opt(update.timestamp_ms)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| update.timestamp_ms.to_string());

    match update.volume {
        Some(volume) => println!(
            "{}  {:<6} {}  vol {}",
            timestamp, update.symbol, update.price, volume
        ),
        None => println!("{}  {:<6} {}", timestamp, update.symbol, update.price),
    }
}

async fn shutdown_signal(duration: Option<u64>) {
    match duration {
        Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
        None => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    }
}
