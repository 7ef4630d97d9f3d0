//! soccerfetch CLI application
//!
//! Command-line interface for cache-aware fetching of soccer data endpoints.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use soccerfetch::cli::{handle_cache, handle_fetch, Cli, Commands};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> anyhow::Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(&cli);

    info!("soccerfetch v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Fetch(args) => handle_fetch(&cli.global, args).await,
        Commands::Cache(args) => handle_cache(&cli.global, args).await,
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("soccerfetch={}", cli.log_level()).parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();
}
