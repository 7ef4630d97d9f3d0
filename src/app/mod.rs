//! Core fetch-and-cache logic for soccerfetch
//!
//! This module contains the fetch client, session identity handling, disk
//! cache, embedded payload extraction, and the reader façade that ties them
//! together.
//!
//! # Examples
//!
//! ```rust,no_run
//! use soccerfetch::app::{
//!     ExtractionSpec, FetchRequest, HttpReader, Reader, ReaderConfig,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = HttpReader::new(ReaderConfig::default())?;
//!
//! let request = FetchRequest::new("https://example.com/en_GB/soccer/competitions")
//!     .cache_path("data/leagues.json")
//!     .max_age(1u64) // whole days
//!     .extraction(ExtractionSpec::new("continents"));
//!
//! match reader.fetch(request).await? {
//!     Some(payload) => println!("{} bytes", payload.len()),
//!     None => println!("document does not contain the requested data"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod extract;
pub mod reader;
pub mod session;

// Re-export main public API
pub use cache::{CacheStore, MaxAge};
pub use client::{ClientConfig, FetchClient, Payload};
pub use extract::{generate_callback_id, ExtractionSpec, Extractor};
pub use reader::{FetchRequest, HttpReader, Reader, ReaderConfig};
pub use session::{
    HeaderSetting, ProxyDescriptor, ProxySetting, SessionConfig, SessionIdentity,
};
