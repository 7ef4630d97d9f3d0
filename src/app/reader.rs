//! Fetch orchestration façade
//!
//! `Reader` is the single capability this crate exposes to site-specific
//! data sources: fetch a URL, preferring a fresh cached copy. `HttpReader`
//! is the production implementation composing the cache store and the fetch
//! client; alternates (a local-file-only backend for tests, say) implement
//! the same trait.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::errors::{FetchError, FetchResult};

use super::cache::{CacheStore, MaxAge};
use super::client::{ClientConfig, FetchClient, Payload};
use super::extract::ExtractionSpec;

/// One fetch: where to get the bytes, where to cache them, and what (if
/// anything) to extract
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// URL to download
    pub url: String,
    /// Path for the cached copy; required unless the reader stores nothing
    pub cache_path: Option<PathBuf>,
    /// Maximum cache age; falls back to the reader default, and `None` on
    /// both means the cache never expires by age
    pub max_age: Option<MaxAge>,
    /// Bypass cache freshness and always re-fetch
    pub force_refresh: bool,
    /// Embedded payload to extract instead of the raw body
    pub extraction: Option<ExtractionSpec>,
    /// Override for the cache-hit log message
    pub message: Option<String>,
}

impl FetchRequest {
    /// A plain request for `url` with no caching directives
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cache_path: None,
            max_age: None,
            force_refresh: false,
            extraction: None,
            message: None,
        }
    }

    /// Cache the payload at `path`
    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Reuse the cached copy only if younger than `max_age`
    pub fn max_age(mut self, max_age: impl Into<MaxAge>) -> Self {
        self.max_age = Some(max_age.into());
        self
    }

    /// Always re-fetch, even when the cache is fresh
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    /// Extract a named embedded payload instead of returning the raw body
    pub fn extraction(mut self, spec: ExtractionSpec) -> Self {
        self.extraction = Some(spec);
        self
    }

    /// Log `message` instead of the default cache-hit line
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// The fetch capability exposed to data sources
#[async_trait]
pub trait Reader {
    /// Fetch a URL, preferring a fresh cached copy
    ///
    /// Returns `Ok(None)` when extraction was requested and the document
    /// does not contain the requested data; callers must handle the empty
    /// case rather than assume a payload.
    async fn fetch(&mut self, request: FetchRequest) -> FetchResult<Option<Payload>>;
}

/// Configuration for the production reader
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Root directory for cached data
    pub data_dir: PathBuf,
    /// Always force refresh, ignoring cache freshness
    pub no_cache: bool,
    /// Never write fetched payloads to disk
    pub no_store: bool,
    /// Default maximum cache age applied when a request sets none
    pub default_max_age: Option<MaxAge>,
    /// Fetch client settings
    pub client: ClientConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            no_cache: false,
            no_store: false,
            default_max_age: None,
            client: ClientConfig::default(),
        }
    }
}

/// Production reader: networked fetches with disk write-through
pub struct HttpReader {
    store: CacheStore,
    client: FetchClient,
    no_cache: bool,
    no_store: bool,
    default_max_age: Option<MaxAge>,
}

impl HttpReader {
    /// Create a reader, preparing the data directory unless storage is
    /// disabled
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the data directory cannot be created or the
    /// fetch client cannot be constructed.
    pub fn new(config: ReaderConfig) -> FetchResult<Self> {
        let store = CacheStore::new(&config.data_dir);
        if config.no_store {
            info!("Caching is disabled");
        } else {
            store.ensure_root()?;
            info!("Saving cached data to {}", config.data_dir.display());
        }

        let client = FetchClient::new(config.client, store.clone())?;

        Ok(Self {
            store,
            client,
            no_cache: config.no_cache,
            no_store: config.no_store,
            default_max_age: config.default_max_age,
        })
    }

    /// The cache store backing this reader
    pub fn store(&self) -> &CacheStore {
        &self.store
    }
}

#[async_trait]
impl Reader for HttpReader {
    async fn fetch(&mut self, request: FetchRequest) -> FetchResult<Option<Payload>> {
        // A reader that stores payloads has nothing to read or write without
        // a path; fail before touching the network.
        if request.cache_path.is_none() && !self.no_store {
            return Err(FetchError::MissingCachePath);
        }

        let max_age = request.max_age.or(self.default_max_age);
        let fresh = self
            .store
            .is_fresh(request.cache_path.as_deref(), max_age);

        if fresh && !request.force_refresh && !self.no_cache {
            let path = request
                .cache_path
                .as_deref()
                .ok_or(FetchError::MissingCachePath)?;
            match &request.message {
                Some(message) => info!("{message}"),
                None => info!("Retrieving {} from cache", request.url),
            }
            let bytes = self.store.read(path).await?;
            return Ok(Some(Payload::from(bytes)));
        }

        info!("Scraping {}", request.url);
        let cache_path = if self.no_store {
            None
        } else {
            request.cache_path.as_deref()
        };
        self.client
            .download(&request.url, cache_path, request.extraction.as_ref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    /// Local-file-only backend exercising the trait seam
    struct FixtureReader {
        responses: HashMap<String, Vec<u8>>,
    }

    #[async_trait]
    impl Reader for FixtureReader {
        async fn fetch(&mut self, request: FetchRequest) -> FetchResult<Option<Payload>> {
            Ok(self
                .responses
                .get(&request.url)
                .cloned()
                .map(Payload::from))
        }
    }

    fn reader_config(dir: &std::path::Path) -> ReaderConfig {
        ReaderConfig {
            data_dir: dir.to_path_buf(),
            client: ClientConfig {
                rate_limit_rps: 100,
                ..ClientConfig::default()
            },
            ..ReaderConfig::default()
        }
    }

    #[tokio::test]
    async fn missing_cache_path_fails_before_any_network_call() {
        let dir = tempdir().unwrap();
        let mut reader = HttpReader::new(reader_config(dir.path())).unwrap();

        // Unroutable URL: an attempted network call would surface as a
        // connection error instead of the configuration error.
        let request = FetchRequest::new("http://127.0.0.1:1/unreachable");
        let err = reader.fetch(request).await.unwrap_err();
        assert!(matches!(err, FetchError::MissingCachePath));
    }

    #[tokio::test]
    async fn fresh_cache_is_read_without_network() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("leagues.json");
        std::fs::write(&cache_path, b"cached bytes").unwrap();

        let mut reader = HttpReader::new(reader_config(dir.path())).unwrap();
        let request = FetchRequest::new("http://127.0.0.1:1/unreachable").cache_path(&cache_path);

        let payload = reader.fetch(request).await.unwrap().unwrap();
        assert_eq!(payload.as_bytes(), b"cached bytes");
    }

    #[tokio::test]
    async fn stale_cache_triggers_refetch() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("leagues.json");
        std::fs::write(&cache_path, b"old").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(50));

        let mut config = reader_config(dir.path());
        config.client.max_attempts = 1;
        let mut reader = HttpReader::new(config).unwrap();

        let request = FetchRequest::new("http://127.0.0.1:1/unreachable")
            .cache_path(&cache_path)
            .max_age(std::time::Duration::from_millis(10));

        // The stale copy must not be served; with the network unreachable
        // the fetch exhausts its single attempt instead.
        let err = reader.fetch(request).await.unwrap_err();
        assert!(matches!(err, FetchError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn force_refresh_bypasses_a_fresh_cache() {
        let dir = tempdir().unwrap();
        let cache_path = dir.path().join("leagues.json");
        std::fs::write(&cache_path, b"cached bytes").unwrap();

        let mut config = reader_config(dir.path());
        config.client.max_attempts = 1;
        let mut reader = HttpReader::new(config).unwrap();

        let request = FetchRequest::new("http://127.0.0.1:1/unreachable")
            .cache_path(&cache_path)
            .force_refresh(true);

        let err = reader.fetch(request).await.unwrap_err();
        assert!(matches!(err, FetchError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn no_store_reader_may_fetch_without_a_path() {
        let dir = tempdir().unwrap();
        let mut config = reader_config(dir.path());
        config.no_store = true;
        config.client.max_attempts = 1;
        let mut reader = HttpReader::new(config).unwrap();

        let request = FetchRequest::new("http://127.0.0.1:1/unreachable");
        let err = reader.fetch(request).await.unwrap_err();
        // Reaches the network layer rather than failing on configuration.
        assert!(matches!(err, FetchError::ConnectionFailed { .. }));
    }

    #[tokio::test]
    async fn alternate_backend_implements_the_same_seam() {
        let mut reader = FixtureReader {
            responses: HashMap::from([(
                "https://example.test/seasons".to_string(),
                b"[\"2022/2023\"]".to_vec(),
            )]),
        };

        let hit = reader
            .fetch(FetchRequest::new("https://example.test/seasons"))
            .await
            .unwrap();
        assert_eq!(hit.unwrap().as_bytes(), b"[\"2022/2023\"]");

        let miss = reader
            .fetch(FetchRequest::new("https://example.test/other"))
            .await
            .unwrap();
        assert!(miss.is_none());
    }
}
