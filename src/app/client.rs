//! HTTP download client with retry and session rotation
//!
//! The client owns exactly one session identity at a time. A failed attempt
//! discards the identity and builds a fresh one before the next try, so a
//! proxy or anti-bot challenge that has poisoned the existing connection or
//! cookie state cannot poison the retry. Only declared transport-level
//! failures are retried; anything else propagates immediately.

use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;

use futures::StreamExt;
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use rand::Rng;
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::limits;
use crate::errors::{FetchError, FetchResult};

use super::cache::CacheStore;
use super::extract::{ExtractionSpec, Extractor};
use super::session::{SessionConfig, SessionIdentity};

/// An immutable byte buffer produced by a successful fetch
///
/// Either the raw response bytes or a re-serialized extracted JSON document.
/// `into_reader` hands the bytes to the caller as a stream positioned at the
/// start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
}

impl Payload {
    /// The payload bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the payload, returning the underlying buffer
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Consume the payload as a readable, seekable stream positioned at the
    /// start
    pub fn into_reader(self) -> std::io::Cursor<Vec<u8>> {
        std::io::Cursor::new(self.bytes)
    }

    /// Payload size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

/// Configuration for the fetch client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Session identity construction settings
    pub session: SessionConfig,
    /// Request cadence limit (requests per second)
    pub rate_limit_rps: u32,
    /// Fixed delay after each request
    pub rate_limit_base_delay: Duration,
    /// Upper bound for the random delay added after each request; breaks up
    /// an otherwise fixed, fingerprintable cadence
    pub rate_limit_max_jitter: Duration,
    /// Maximum attempts per URL
    pub max_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            rate_limit_base_delay: limits::RATE_LIMIT_BASE_DELAY,
            rate_limit_max_jitter: limits::RATE_LIMIT_MAX_JITTER,
            max_attempts: limits::MAX_ATTEMPTS,
        }
    }
}

/// Downloads URLs through a rotating session identity, with write-through to
/// the cache store
pub struct FetchClient {
    config: ClientConfig,
    session: SessionIdentity,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    extractor: Extractor,
    store: CacheStore,
}

impl FetchClient {
    /// Create a new client with a freshly built session identity
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the session, rate limiter, or extractor
    /// cannot be constructed.
    pub fn new(config: ClientConfig, store: CacheStore) -> FetchResult<Self> {
        let session = SessionIdentity::build(&config.session)?;
        let rate_limiter = build_rate_limiter(config.rate_limit_rps)?;
        let extractor = Extractor::new()?;

        Ok(Self {
            config,
            session,
            rate_limiter,
            extractor,
            store,
        })
    }

    /// Download `url`, optionally extracting a named embedded payload, and
    /// write the result through to `cache_path`
    ///
    /// Up to `max_attempts` tries; each transport failure rebuilds the
    /// session identity before the next attempt. An extraction miss returns
    /// `Ok(None)` without retrying: the document was fetched successfully and
    /// simply does not contain the requested data.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::ConnectionFailed` naming the URL once all
    /// attempts are exhausted by transport failures. Non-transport errors
    /// propagate from the first attempt that hits them.
    pub async fn download(
        &mut self,
        url: &str,
        cache_path: Option<&Path>,
        extraction: Option<&ExtractionSpec>,
    ) -> FetchResult<Option<Payload>> {
        Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let max_attempts = self.config.max_attempts;
        for attempt in 1..=max_attempts {
            self.rate_limiter
                .until_ready_with_jitter(Jitter::up_to(limits::LIMITER_JITTER))
                .await;

            match self.attempt(url, extraction).await {
                Ok(Some(payload)) => {
                    if let Some(path) = cache_path {
                        self.store.write(path, payload.as_bytes()).await?;
                    }
                    return Ok(Some(payload));
                }
                Ok(None) => {
                    info!("No embedded data found at {url}. Proceed to next url.");
                    return Ok(None);
                }
                Err(err) if err.is_transport() => {
                    warn!(
                        "Error while scraping {url}: {err}. Retrying... (attempt {attempt} of {max_attempts})"
                    );
                    self.session = SessionIdentity::build(&self.config.session)?;
                }
                Err(err) => return Err(err),
            }
        }

        Err(FetchError::ConnectionFailed {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }

    /// One GET attempt through the current session identity
    async fn attempt(
        &self,
        url: &str,
        extraction: Option<&ExtractionSpec>,
    ) -> FetchResult<Option<Payload>> {
        let response = self.session.client().get(url).send().await?;
        self.throttle().await;
        let response = response.error_for_status()?;

        let payload = match extraction {
            Some(spec) => {
                let body = response.text().await?;
                match self.extractor.extract(&body, spec) {
                    Some(value) => Payload::from(serde_json::to_vec(&value)?),
                    None => return Ok(None),
                }
            }
            None => {
                let mut bytes = Vec::new();
                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    bytes.extend_from_slice(&chunk?);
                }
                Payload::from(bytes)
            }
        };

        debug!("Fetched {} bytes from {url}", payload.len());
        Ok(Some(payload))
    }

    /// Courtesy delay after each request: base delay plus uniform jitter
    async fn throttle(&self) {
        let jitter = self
            .config
            .rate_limit_max_jitter
            .mul_f64(rand::thread_rng().gen::<f64>());
        let delay = self.config.rate_limit_base_delay + jitter;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn build_rate_limiter(
    rate_limit_rps: u32,
) -> FetchResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
    let quota = Quota::per_second(NonZeroU32::new(rate_limit_rps).ok_or_else(|| {
        FetchError::InvalidConfig {
            reason: "Rate limit must be non-zero".to_string(),
        }
    })?);
    Ok(RateLimiter::direct(quota))
}
