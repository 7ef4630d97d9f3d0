//! soccerfetch library
//!
//! A fetch-and-cache layer for soccer data sources: freshness-aware disk
//! caching, retry with session rotation on failure, and extraction of named
//! payloads embedded in HTML or JSONP documents. Site-specific table
//! reshaping is out of scope; consumers receive a byte stream and take it
//! from there.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use app::{
    ExtractionSpec, FetchRequest, HttpReader, MaxAge, Payload, Reader, ReaderConfig,
};
pub use errors::{AppError, FetchError, Result};
