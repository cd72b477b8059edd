//! Hand-maintained corrections bundled with the dashboard.
//!
//! Three title-keyed JSON maps live in the data directory:
//! `custom_pages.json`, `book_annotations.json` and `custom_dates.json`.
//! They are an overlay: a value is used only where the fetched record has a
//! gap, never to replace data the source already provided.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::models::BookRecord;

pub const CUSTOM_PAGES_FILE: &str = "custom_pages.json";
pub const ANNOTATIONS_FILE: &str = "book_annotations.json";
pub const CUSTOM_DATES_FILE: &str = "custom_dates.json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverridesBundle {
    pub pages: HashMap<String, u32>,
    pub annotations: HashMap<String, String>,
    pub dates: HashMap<String, String>,
}

impl OverridesBundle {
    /// Load all three maps from `data_dir`. A missing file is an empty map;
    /// a file that exists but does not parse is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw_pages: HashMap<String, Value> = load_map(&data_dir.join(CUSTOM_PAGES_FILE))?;
        let annotations = load_map(&data_dir.join(ANNOTATIONS_FILE))?;
        let dates = load_map(&data_dir.join(CUSTOM_DATES_FILE))?;

        let pages = raw_pages
            .into_iter()
            .filter_map(|(title, value)| match page_count(&value) {
                Some(n) => Some((title, n)),
                None => {
                    debug!(title = %title, value = %value, "Ignoring invalid custom page count");
                    None
                }
            })
            .collect();

        let bundle = Self {
            pages,
            annotations,
            dates,
        };
        debug!(
            pages = bundle.pages.len(),
            annotations = bundle.annotations.len(),
            dates = bundle.dates.len(),
            "Loaded overrides"
        );
        Ok(bundle)
    }

    /// Fill a missing page count. Returns true if the record changed.
    pub fn apply_pages(&self, book: &mut BookRecord) -> bool {
        apply_pages(&self.pages, book)
    }

    /// Attach a bundled annotation when the record has none.
    pub fn apply_annotation(&self, book: &mut BookRecord) -> bool {
        apply_annotation(&self.annotations, book)
    }

    /// Substitute a read date when the record's is absent or unparseable.
    pub fn apply_date(&self, book: &mut BookRecord) -> bool {
        apply_date(&self.dates, book)
    }
}

pub fn apply_pages(custom_pages: &HashMap<String, u32>, book: &mut BookRecord) -> bool {
    if book.pages.is_some() {
        return false;
    }
    match custom_pages.get(&book.title) {
        Some(&pages) if pages > 0 => {
            book.pages = Some(pages);
            true
        }
        _ => false,
    }
}

pub fn apply_annotation(annotations: &HashMap<String, String>, book: &mut BookRecord) -> bool {
    if book.annotation.as_deref().is_some_and(|a| !a.trim().is_empty()) {
        return false;
    }
    match annotations.get(&book.title) {
        Some(text) if !text.trim().is_empty() => {
            book.annotation = Some(text.clone());
            true
        }
        _ => false,
    }
}

pub fn apply_date(custom_dates: &HashMap<String, String>, book: &mut BookRecord) -> bool {
    if book.has_valid_read_date() {
        return false;
    }
    match custom_dates.get(&book.title) {
        Some(date) => {
            book.date_read = Some(date.clone());
            true
        }
        None => false,
    }
}

fn page_count(value: &Value) -> Option<u32> {
    let count: Option<u32> = match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    count.filter(|n| *n > 0)
}

fn load_map<T: DeserializeOwned>(path: &Path) -> Result<HashMap<String, T>> {
    if !path.exists() {
        debug!(path = %path.display(), "Overrides file not found, using empty map");
        return Ok(HashMap::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read overrides file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse overrides file: {}", path.display()))
}
