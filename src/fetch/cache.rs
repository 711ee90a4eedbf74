//! Weekly on-disk cache for fetch results.
//!
//! Completed sub-queries land under `full/`, interrupted ones under
//! `partial/` together with an explicit resume cursor. Keys embed the
//! ISO year-week, so entries expire naturally when the week rolls over
//! and no eviction pass is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;
use crate::util::time::week_stamp;

/// Sanitized-URL characters kept in a cache key before hashing kicks in.
const KEY_TAIL_LEN: usize = 64;
/// Hex digits of the URL digest kept in a cache key.
const KEY_DIGEST_LEN: usize = 16;

/// An interrupted fetch: everything accumulated so far plus the page
/// index to request next. The cursor lives beside the items, never
/// inside them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFetch {
    pub items: Vec<Value>,
    pub resume_page: u32,
}

/// Filesystem cache rooted at the configured cache directory.
#[derive(Debug, Clone)]
pub struct FetchCache {
    full_dir: PathBuf,
    partial_dir: PathBuf,
}

impl FetchCache {
    #[must_use]
    pub fn new(cache_dir: &Path) -> Self {
        Self {
            full_dir: cache_dir.join("full"),
            partial_dir: cache_dir.join("partial"),
        }
    }

    /// Cache key for a request URL in the week containing `now`.
    ///
    /// The tail of the sanitized URL keeps keys recognizable when
    /// listing the cache directory; the digest disambiguates URLs that
    /// sanitize identically; the ISO year-week expires the entry.
    #[must_use]
    pub fn key(url: &str, now: DateTime<Utc>) -> String {
        let sanitized: String = url
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let tail_start = sanitized.len().saturating_sub(KEY_TAIL_LEN);
        let digest = hex_digest(url);
        format!(
            "{}-{}_{}",
            &sanitized[tail_start..],
            &digest[..KEY_DIGEST_LEN],
            week_stamp(now)
        )
    }

    /// Completed items for a URL, if cached this week.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry cannot be read or parsed.
    pub fn read_full(&self, url: &str) -> Result<Option<Vec<Value>>> {
        read_json(&self.full_path(url))
    }

    /// Persist a completed fetch and drop any stale partial entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn write_full(&self, url: &str, items: &[Value]) -> Result<()> {
        let path = self.full_path(url);
        debug!(path = %path.display(), items = items.len(), "writing full cache entry");
        write_atomic(&path, &serde_json::to_string(items)?)?;
        self.clear_partial(url)
    }

    /// Resume state for a URL, if an interrupted fetch left one this
    /// week.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing entry cannot be read or parsed.
    pub fn read_partial(&self, url: &str) -> Result<Option<PartialFetch>> {
        read_json(&self.partial_path(url))
    }

    /// Persist resume state for an interrupted fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    pub fn write_partial(&self, url: &str, partial: &PartialFetch) -> Result<()> {
        let path = self.partial_path(url);
        debug!(
            path = %path.display(),
            items = partial.items.len(),
            resume_page = partial.resume_page,
            "writing partial cache entry"
        );
        write_atomic(&path, &serde_json::to_string(partial)?)
    }

    /// Remove the partial entry for a URL, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails for a reason other than the
    /// entry not existing.
    pub fn clear_partial(&self, url: &str) -> Result<()> {
        match fs::remove_file(self.partial_path(url)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn full_path(&self, url: &str) -> PathBuf {
        self.full_dir.join(format!("{}.json", Self::key(url, Utc::now())))
    }

    fn partial_path(&self, url: &str) -> PathBuf {
        self.partial_dir
            .join(format!("{}.json", Self::key(url, Utc::now())))
    }
}

fn hex_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest.iter().fold(String::new(), |mut out, byte| {
        use std::fmt::Write as _;
        let _ = write!(out, "{byte:02x}");
        out
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Write via a temp file and rename, so a crash mid-write cannot leave
/// a truncated entry behind.
fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
