use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::BookRecord;

/// Prefix of per-owner cache files
const CACHE_FILE_PREFIX: &str = "books_";

/// A snapshot of one owner's collection plus the time it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub owner_key: String,
    pub books: Vec<BookRecord>,
    pub saved_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.saved_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        format_age(self.saved_at)
    }
}

/// How long ago `saved_at` was, as "just now", "5m ago", "3h ago" or "2d ago".
pub fn format_age(saved_at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - saved_at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// File-backed key-value store: one serialized entry per owner key.
///
/// Single caller, single owner at a time; there is no locking and no size
/// bound.
pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, owner_key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}{}.json", CACHE_FILE_PREFIX, sanitize_key(owner_key)))
    }

    /// Load the entry for `owner_key`.
    ///
    /// Returns `Ok(None)` when nothing is stored or the stored list is empty,
    /// so callers never see an empty cached collection as valid.
    pub fn load(&self, owner_key: &str) -> Result<Option<CacheEntry>> {
        let path = self.cache_path(owner_key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file for {}", owner_key))?;

        let entry: CacheEntry = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file for {}", owner_key))?;

        // Distinct keys can sanitize to the same file name
        if entry.owner_key != owner_key {
            debug!(owner = owner_key, stored = %entry.owner_key, "Cache file belongs to another owner");
            return Ok(None);
        }

        if entry.books.is_empty() {
            debug!(owner = owner_key, "Cached collection is empty, treating as absent");
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Replace the entry for `owner_key` wholesale.
    pub fn save(&self, owner_key: &str, books: &[BookRecord], saved_at: DateTime<Utc>) -> Result<()> {
        let entry = CacheEntry {
            owner_key: owner_key.to_string(),
            books: books.to_vec(),
            saved_at,
        };
        let path = self.cache_path(owner_key);
        let contents = serde_json::to_string_pretty(&entry)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file for {}", owner_key))?;
        debug!(owner = owner_key, books = books.len(), "Saved collection to cache");
        Ok(())
    }

    /// Remove the entry for `owner_key`, if any
    pub fn clear(&self, owner_key: &str) -> Result<()> {
        let path = self.cache_path(owner_key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file for {}", owner_key))?;
        }
        Ok(())
    }
}

// Owner keys are user names; keep them safe as file names
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
