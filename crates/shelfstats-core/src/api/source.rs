//! The `BookSource` seam: where the raw collection comes from.
//!
//! Two implementations exist: `LiveLibClient` for the reading site and
//! `StaticJsonSource` for an exported JSON file. Both hand back records with
//! the page-count and annotation overlays already applied.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::models::BookRecord;
use crate::overrides;

#[async_trait]
pub trait BookSource: Send + Sync {
    /// Short name for logs and status lines
    fn name(&self) -> &str;

    /// Fetch every shelf for `owner` as normalized records.
    ///
    /// `custom_pages` fills missing page counts during normalization;
    /// `annotations` are attached where the bundle has text, everything else
    /// is left for `fetch_annotation`.
    async fn fetch(
        &self,
        owner: &str,
        annotations: &HashMap<String, String>,
        custom_pages: &HashMap<String, u32>,
    ) -> Result<Vec<BookRecord>>;

    /// Synopsis for a single book, fetched on demand
    async fn fetch_annotation(&self, _book: &BookRecord) -> Result<Option<String>> {
        Ok(None)
    }

    /// Portrait URL for an author
    async fn author_photo(&self, _author: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Apply the page and annotation overlays to freshly fetched records.
pub fn apply_overlays(
    books: &mut [BookRecord],
    annotations: &HashMap<String, String>,
    custom_pages: &HashMap<String, u32>,
) {
    let mut pages_filled = 0;
    let mut annotated = 0;
    for book in books.iter_mut() {
        if overrides::apply_pages(custom_pages, book) {
            pages_filled += 1;
        }
        if overrides::apply_annotation(annotations, book) {
            annotated += 1;
        }
    }
    debug!(pages_filled, annotated, "Applied overlays to fetched records");
}

/// Reads an exported collection (a JSON array of records) from disk.
pub struct StaticJsonSource {
    path: PathBuf,
}

impl StaticJsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BookSource for StaticJsonSource {
    fn name(&self) -> &str {
        "static export"
    }

    async fn fetch(
        &self,
        owner: &str,
        annotations: &HashMap<String, String>,
        custom_pages: &HashMap<String, u32>,
    ) -> Result<Vec<BookRecord>> {
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read book export: {}", self.path.display()))?;
        let mut books: Vec<BookRecord> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse book export: {}", self.path.display()))?;

        apply_overlays(&mut books, annotations, custom_pages);
        debug!(owner, count = books.len(), path = %self.path.display(), "Loaded static export");
        Ok(books)
    }
}
