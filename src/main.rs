use clap::Parser;
use tickstream::cli::{Cli, Commands};
use tickstream::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Initialize telemetry
    tickstream::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Stream(args) => {
            args.execute(&config).await?;
        }
        Commands::Watchlist(args) => {
            args.execute().await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Feed: {}", config.feed.url);
            println!(
                "  Token: {}",
                if config.feed.token.is_empty() {
                    "(none)"
                } else {
                    "(set)"
                }
            );
            println!("  Log level: {}", config.telemetry.log_level);
        }
    }

    Ok(())
}
