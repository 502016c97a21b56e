use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pickdraw::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "pickdraw",
    version,
    about = "Pick 3 / Pick 4 draw result scraper with idempotent ingestion",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides `[logging] format`
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Render one game's results page and print the extracted draws
    Scrape {
        /// Game to scrape (PICK3 or PICK4)
        #[arg(short, long, default_value = "PICK3")]
        game: String,
    },

    /// Run the full pipeline once: scrape both games, store, notify
    Retrieve,

    /// Extract draws from a saved HTML snapshot
    Extract {
        /// HTML file to read
        #[arg(short, long)]
        file: PathBuf,

        /// Game the snapshot belongs to
        #[arg(short, long)]
        game: String,
    },

    /// Show recently stored draws
    Recent {
        /// Restrict to one game
        #[arg(short, long)]
        game: Option<String>,

        /// Maximum rows to print
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    // Initialize tracing/logging
    let format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(format, &config.logging.level, cli.verbose)?;

    if let Err(e) = pickdraw::metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    match cli.command {
        Commands::Serve { host, port } => {
            commands::serve(config, host, port).await?;
        }

        Commands::Scrape { game } => {
            tracing::info!(game = %game, "Starting scrape command");
            commands::scrape(config, &game).await?;
        }

        Commands::Retrieve => {
            tracing::info!("Starting retrieve command");
            commands::retrieve(config).await?;
        }

        Commands::Extract { file, game } => {
            tracing::info!(file = %file.display(), game = %game, "Starting extract command");
            commands::extract(&file, &game)?;
        }

        Commands::Recent { game, limit } => {
            commands::recent(config, game.as_deref(), limit).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let default_filter = if verbose {
        "pickdraw=debug,tower_http=debug,info".to_string()
    } else {
        format!("pickdraw={level},warn")
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}
