//! Session identity construction and rotation
//!
//! A session identity bundles the HTTP backend handle with the proxy and
//! header configuration used to build it. Identities are rebuilt wholesale
//! when a download attempt fails, which re-invokes the configured resolvers:
//! a list- or provider-based configuration therefore yields a different
//! identity on every retry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use tracing::debug;

use crate::constants::{http, proxies};
use crate::errors::{SessionError, SessionResult};

/// Zero-argument resolver invoked on every session build
pub type Resolver<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Proxy endpoints for the http and https schemes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyDescriptor {
    pub http: Option<String>,
    pub https: Option<String>,
}

impl ProxyDescriptor {
    /// Route both schemes through the same proxy URL
    pub fn all(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            http: Some(url.clone()),
            https: Some(url),
        }
    }

    /// The local Tor SOCKS proxy
    pub fn tor() -> Self {
        Self::all(proxies::TOR_SOCKS_URL)
    }
}

/// Proxy resolution strategy, re-evaluated on every session build
#[derive(Clone, Default)]
pub enum ProxySetting {
    /// Direct connection, no proxy
    #[default]
    None,
    /// Well-known alias for the local Tor SOCKS proxy
    Tor,
    /// A single fixed descriptor
    Fixed(ProxyDescriptor),
    /// One descriptor chosen uniformly at random per session build
    OneOf(Vec<ProxyDescriptor>),
    /// Caller-supplied provider invoked per session build
    Provider(Resolver<ProxyDescriptor>),
}

impl ProxySetting {
    fn resolve(&self) -> Option<ProxyDescriptor> {
        match self {
            ProxySetting::None => None,
            ProxySetting::Tor => Some(ProxyDescriptor::tor()),
            ProxySetting::Fixed(descriptor) => Some(descriptor.clone()),
            ProxySetting::OneOf(candidates) => {
                candidates.choose(&mut rand::thread_rng()).cloned()
            }
            ProxySetting::Provider(provider) => Some(provider()),
        }
    }
}

impl fmt::Debug for ProxySetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxySetting::None => write!(f, "None"),
            ProxySetting::Tor => write!(f, "Tor"),
            ProxySetting::Fixed(descriptor) => f.debug_tuple("Fixed").field(descriptor).finish(),
            ProxySetting::OneOf(candidates) => f.debug_tuple("OneOf").field(candidates).finish(),
            ProxySetting::Provider(_) => write!(f, "Provider(..)"),
        }
    }
}

/// Header resolution strategy, re-evaluated on every session build
#[derive(Clone, Default)]
pub enum HeaderSetting {
    /// No extra headers beyond the built-in defaults
    #[default]
    None,
    /// A fixed name/value map
    Fixed(Vec<(String, String)>),
    /// Caller-supplied provider invoked per session build
    Provider(Resolver<Vec<(String, String)>>),
}

impl HeaderSetting {
    fn resolve(&self) -> Vec<(String, String)> {
        match self {
            HeaderSetting::None => Vec::new(),
            HeaderSetting::Fixed(headers) => headers.clone(),
            HeaderSetting::Provider(provider) => provider(),
        }
    }
}

impl fmt::Debug for HeaderSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderSetting::None => write!(f, "None"),
            HeaderSetting::Fixed(headers) => f.debug_tuple("Fixed").field(headers).finish(),
            HeaderSetting::Provider(_) => write!(f, "Provider(..)"),
        }
    }
}

/// Configuration for building session identities
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Proxy resolution strategy
    pub proxy: ProxySetting,
    /// Header resolution strategy
    pub headers: HeaderSetting,
    /// User agent sent with every request
    pub user_agent: String,
    /// Request timeout
    pub request_timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            proxy: ProxySetting::None,
            headers: HeaderSetting::None,
            user_agent: http::USER_AGENT.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
        }
    }
}

/// A single session identity: backend handle plus the proxy and headers it
/// was built with. Owned by exactly one `FetchClient` and replaced, never
/// mutated, on retry.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    client: Client,
}

impl SessionIdentity {
    /// Build a fresh identity, re-invoking the proxy and header resolvers
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if a resolved proxy descriptor or header is
    /// malformed, or if HTTP client construction fails.
    pub fn build(config: &SessionConfig) -> SessionResult<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone());

        if let Some(descriptor) = config.proxy.resolve() {
            debug!("Session proxy: {:?}", descriptor);
            if let Some(url) = &descriptor.http {
                builder = builder.proxy(parse_proxy(Proxy::http(url), url)?);
            }
            if let Some(url) = &descriptor.https {
                builder = builder.proxy(parse_proxy(Proxy::https(url), url)?);
            }
        }

        let headers = header_map(config.headers.resolve())?;
        if !headers.is_empty() {
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// The backend HTTP handle for this identity
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn parse_proxy(proxy: reqwest::Result<Proxy>, url: &str) -> SessionResult<Proxy> {
    proxy.map_err(|e| SessionError::InvalidProxy {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Convert resolved name/value pairs into a wire-ready header map
fn header_map(pairs: Vec<(String, String)>) -> SessionResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(pairs.len() + http::DEFAULT_HEADERS.len());
    let defaults = http::DEFAULT_HEADERS
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()));
    for (name, value) in defaults.chain(pairs) {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| SessionError::InvalidHeader {
                name: name.clone(),
            })?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| SessionError::InvalidHeader { name })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn tor_alias_resolves_to_local_socks_proxy() {
        let descriptor = ProxySetting::Tor.resolve().unwrap();
        assert_eq!(descriptor.http.as_deref(), Some(proxies::TOR_SOCKS_URL));
        assert_eq!(descriptor.https.as_deref(), Some(proxies::TOR_SOCKS_URL));
    }

    #[test]
    fn one_of_resolves_to_a_listed_candidate() {
        let candidates = vec![
            ProxyDescriptor::all("socks5://10.0.0.1:1080"),
            ProxyDescriptor::all("socks5://10.0.0.2:1080"),
        ];
        let setting = ProxySetting::OneOf(candidates.clone());
        for _ in 0..20 {
            let resolved = setting.resolve().unwrap();
            assert!(candidates.contains(&resolved));
        }
    }

    #[test]
    fn provider_is_invoked_on_every_build() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let config = SessionConfig {
            headers: HeaderSetting::Provider(Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                vec![("X-Request-Id".to_string(), "abc".to_string())]
            })),
            ..SessionConfig::default()
        };

        SessionIdentity::build(&config).unwrap();
        SessionIdentity::build(&config).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalid_header_name_is_rejected() {
        let config = SessionConfig {
            headers: HeaderSetting::Fixed(vec![("bad header".to_string(), "x".to_string())]),
            ..SessionConfig::default()
        };
        let err = SessionIdentity::build(&config).unwrap_err();
        assert!(matches!(err, SessionError::InvalidHeader { .. }));
    }

    #[test]
    fn default_headers_are_included() {
        let headers = header_map(vec![("Referer".to_string(), "https://a.example".to_string())])
            .unwrap();
        assert_eq!(headers.get("Accept-Language").unwrap(), "en-US,en;q=0.5");
        assert_eq!(headers.get("Referer").unwrap(), "https://a.example");
    }
}
