//! Error types for soccerfetch
//!
//! Only transport exhaustion and configuration problems are fatal to a fetch
//! call. Extraction misses are modelled as `Ok(None)` at the call sites, not
//! as errors, so they never appear here.

use std::path::PathBuf;

use thiserror::Error;

/// Session construction errors
///
/// Raised when a session identity cannot be built from its proxy and header
/// configuration. These are not retried: a configuration that fails to build
/// once will fail on every rebuild.
#[derive(Error, Debug)]
pub enum SessionError {
    /// HTTP client construction failed
    #[error("Failed to build HTTP client")]
    Http(#[from] reqwest::Error),

    /// Proxy descriptor could not be parsed
    #[error("Invalid proxy descriptor {url}: {reason}")]
    InvalidProxy { url: String, reason: String },

    /// Header name or value is not representable on the wire
    #[error("Invalid header {name}")]
    InvalidHeader { name: String },
}

/// Extraction engine errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A configured CSS selector failed to parse
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },
}

/// Fetch and download errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// All retry attempts exhausted by transport-level failures
    #[error("Could not download {url} after {attempts} attempts")]
    ConnectionFailed { url: String, attempts: u32 },

    /// Cache participation requested but no cache path supplied
    #[error("No cache path provided for cached data")]
    MissingCachePath,

    /// Malformed URL passed to a fetch call
    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Invalid client configuration value
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig { reason: String },

    /// HTTP request failed during a single attempt
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// I/O error during cache read or write
    #[error("File I/O error")]
    Io(#[from] std::io::Error),

    /// Extracted payload could not be re-serialized
    #[error("Payload serialization failed")]
    Json(#[from] serde_json::Error),

    /// Session rebuild failed between attempts
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Extraction engine could not be constructed
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

impl FetchError {
    /// Whether this error is a transport-level failure worth retrying with a
    /// rebuilt session. Everything else propagates immediately.
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Http(_) | FetchError::Io(_))
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// I/O error reading configuration
    #[error("I/O error reading configuration")]
    Io(#[from] std::io::Error),
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch error
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Session error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Extraction error
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Fetch(_) => "fetch",
            AppError::Session(_) => "session",
            AppError::Extract(_) => "extract",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Fetch result type alias
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Session result type alias
pub type SessionResult<T> = std::result::Result<T, SessionError>;
