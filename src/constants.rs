//! Application constants for soccerfetch
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for runtime toggles
pub mod env {
    /// Force refresh on every fetch, ignoring cache freshness
    pub const NO_CACHE: &str = "SOCCERFETCH_NOCACHE";

    /// Never write fetched payloads to disk
    pub const NO_STORE: &str = "SOCCERFETCH_NOSTORE";

    /// Default maximum cache age in whole days
    pub const MAX_AGE: &str = "SOCCERFETCH_MAXAGE";

    /// Root directory for cached data
    pub const DATA_DIR: &str = "SOCCERFETCH_DIR";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
        (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Browser-like default headers applied to every session
    pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
        ("Sec-Fetch-Mode", "cors"),
        ("Sec-Fetch-Site", "cross-site"),
        ("Sec-Fetch-Dest", "document"),
        ("Connection", "keep-alive"),
        ("Accept-Language", "en-US,en;q=0.5"),
    ];
}

/// Rate limiting and retry configuration
pub mod limits {
    use super::Duration;

    /// Maximum download attempts per URL before giving up
    pub const MAX_ATTEMPTS: u32 = 5;

    /// Default rate limit for outgoing requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Default fixed delay after each request
    pub const RATE_LIMIT_BASE_DELAY: Duration = Duration::ZERO;

    /// Default upper bound for the random delay added after each request
    pub const RATE_LIMIT_MAX_JITTER: Duration = Duration::ZERO;

    /// Jitter applied by the request-cadence limiter
    pub const LIMITER_JITTER: Duration = Duration::from_millis(100);
}

/// Proxy endpoints
pub mod proxies {
    /// Local Tor SOCKS proxy, resolved from the "tor" alias
    pub const TOR_SOCKS_URL: &str = "socks5://127.0.0.1:9050";
}

/// CSS selectors for embedded payload extraction
pub mod selectors {
    /// Inline JSON script tags scanned for named payloads
    pub const EMBEDDED_JSON_SELECTOR: &str = "script[type='application/json']";

    /// Option elements of the season list container
    pub const SEASON_LIST_SELECTOR: &str = "div#seasonlist option";
}

/// JSONP callback identifier format
pub mod callback {
    /// Fixed prefix of every generated callback identifier
    pub const CALLBACK_PREFIX: &str = "W3";

    /// Number of random lowercase hex characters after the prefix
    pub const CALLBACK_HEX_LEN: usize = 40;
}

/// File operation constants
pub mod files {
    /// Temporary file suffix for atomic cache writes
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";
}

// Re-export commonly used constants for convenience
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_ATTEMPTS};
pub use proxies::TOR_SOCKS_URL;
