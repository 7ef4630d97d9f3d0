//! Command-line argument parsing for soccerfetch
//!
//! Defines the CLI structure using clap derive macros: a `fetch` command for
//! one-off cached downloads and a `cache` command for inspecting and
//! clearing the data directory.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// soccerfetch - cache-aware fetcher for soccer data endpoints
#[derive(Parser, Debug)]
#[command(
    name = "soccerfetch",
    version,
    about = "Fetch soccer data endpoints with disk caching and retry",
    long_about = "Fetches HTML pages and JSON/JSONP API responses with transparent disk \
caching, per-attempt session rotation, and extraction of payloads embedded in HTML documents."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Data directory for cached payloads
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a URL through the cache
    Fetch(FetchArgs),

    /// Cache inspection and maintenance
    Cache(CacheArgs),
}

/// Arguments for the fetch command
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// URL to fetch
    pub url: String,

    /// Cache file path, relative to the data directory unless absolute
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Maximum cache age in whole days
    #[arg(long, value_name = "DAYS")]
    pub max_age: Option<u64>,

    /// Force re-fetch even when the cached copy is fresh
    #[arg(short, long)]
    pub force: bool,

    /// Extract this embedded variable instead of the raw body
    #[arg(long, value_name = "NAME")]
    pub var: Option<String>,

    /// JSONP callback identifier; generated per request when omitted but
    /// --jsonp is set
    #[arg(long, value_name = "ID", requires = "var")]
    pub callback: Option<String>,

    /// Treat the response as JSONP-wrapped, generating a callback id
    #[arg(long, requires = "var", conflicts_with = "callback")]
    pub jsonp: bool,

    /// Proxy: "tor" or a proxy URL applied to both schemes
    #[arg(long, value_name = "PROXY")]
    pub proxy: Option<String>,

    /// Do not write the payload to disk
    #[arg(long)]
    pub no_store: bool,

    /// Print the payload to stdout
    #[arg(long)]
    pub print: bool,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show the cache location and contents summary
    Info,

    /// Delete all cached payloads
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Effective log level from the verbosity flags
    pub fn log_level(&self) -> &'static str {
        if self.global.very_verbose {
            "debug"
        } else if self.global.verbose {
            "info"
        } else if self.global.quiet {
            "error"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn fetch_parses_extraction_flags() {
        let cli = Cli::parse_from([
            "soccerfetch",
            "fetch",
            "https://example.com/matches",
            "--out",
            "matches.json",
            "--var",
            "allMatches",
            "--jsonp",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.var.as_deref(), Some("allMatches"));
                assert!(args.jsonp);
                assert!(args.callback.is_none());
            }
            other => panic!("Expected fetch command, got {other:?}"),
        }
    }

    #[test]
    fn quiet_lowers_log_level() {
        let cli = Cli::parse_from(["soccerfetch", "--quiet", "cache", "info"]);
        assert_eq!(cli.log_level(), "error");
    }
}
