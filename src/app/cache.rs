//! Freshness-aware disk cache
//!
//! Cache entries are plain files identified by caller-supplied paths; no
//! metadata is stored alongside them. Freshness is computed on demand from
//! filesystem modification times against a single UTC clock, so the
//! filesystem clock and the process clock cannot drift apart across
//! timezones. Writes go through a temporary file and an atomic rename so a
//! reader never observes a partial payload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::fs;
use tracing::debug;

use crate::constants::files;
use crate::errors::FetchResult;

/// Maximum age for a cached file
///
/// A plain integer is interpreted as whole days; finer-grained limits use
/// `Span`. Non-negativity holds by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAge {
    /// Whole days
    Days(u64),
    /// An arbitrary non-negative duration
    Span(Duration),
}

impl MaxAge {
    fn as_duration(self) -> Duration {
        match self {
            MaxAge::Days(days) => Duration::from_secs(days.saturating_mul(86_400)),
            MaxAge::Span(span) => span,
        }
    }
}

impl From<u64> for MaxAge {
    fn from(days: u64) -> Self {
        MaxAge::Days(days)
    }
}

impl From<Duration> for MaxAge {
    fn from(span: Duration) -> Self {
        MaxAge::Span(span)
    }
}

/// Disk cache rooted at a data directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    root: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at `root`. The directory is not created until
    /// `ensure_root` is called, so a store-disabled reader never touches disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the cache root directory if it does not exist
    pub fn ensure_root(&self) -> FetchResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Whether a previously saved file at `path` is still usable
    ///
    /// Absence is a normal "not cached" outcome, never an error. With no
    /// `max_age` an existing file is always usable; only an explicit force
    /// refresh bypasses it.
    pub fn is_fresh(&self, path: Option<&Path>, max_age: Option<MaxAge>) -> bool {
        let Some(path) = path else {
            return false;
        };
        let Ok(metadata) = std::fs::metadata(path) else {
            return false;
        };
        let Some(max_age) = max_age else {
            return true;
        };
        let Ok(modified) = metadata.modified() else {
            return false;
        };
        freshness(modified.into(), Utc::now(), max_age)
    }

    /// Read a cached payload back
    pub async fn read(&self, path: &Path) -> FetchResult<Vec<u8>> {
        Ok(fs::read(path).await?)
    }

    /// Write `bytes` to `path`, creating parent directories as needed
    ///
    /// Uses the temp file + rename pattern so interrupted writes never leave
    /// a partial file at the final path.
    pub async fn write(&self, path: &Path, bytes: &[u8]) -> FetchResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(format!(
            "{}{}",
            path.extension().and_then(|s| s.to_str()).unwrap_or(""),
            files::TEMP_FILE_SUFFIX
        ));

        fs::write(&temp_path, bytes).await?;
        fs::rename(&temp_path, path).await?;
        debug!("Cached {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// Pure freshness rule: a file is fresh iff its age does not exceed the limit
///
/// A modification time in the future counts as fresh; a limit too large for
/// the calendar arithmetic never expires.
fn freshness(modified: DateTime<Utc>, now: DateTime<Utc>, max_age: MaxAge) -> bool {
    let age = now.signed_duration_since(modified);
    if age < chrono::Duration::zero() {
        return true;
    }
    match chrono::Duration::from_std(max_age.as_duration()) {
        Ok(limit) => age <= limit,
        Err(_) => true,
    }
}
