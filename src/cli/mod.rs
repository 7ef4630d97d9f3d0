//! Command-line interface for soccerfetch

mod args;
mod commands;

pub use args::{CacheAction, CacheArgs, Cli, Commands, FetchArgs, GlobalArgs};
pub use commands::{handle_cache, handle_fetch};
