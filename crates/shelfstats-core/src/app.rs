//! Application controller for shelfstats.
//!
//! `App` owns the configuration, the cache, the book source, the progress
//! lookup and the loaded collection. Front-ends call `load` once at startup,
//! `refresh` on demand and `build_dashboard` to get something to render.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::{BookSource, HardcoverClient, LiveLibClient, ProgressApi, StaticJsonSource};
use crate::auth::HardcoverCredentials;
use crate::cache::CacheManager;
use crate::config::Config;
use crate::dashboard::{Dashboard, DashboardContext};
use crate::library::{categorize, BookCollection, Shelves};
use crate::models::{BookRecord, ProgressSnapshot, Shelf};
use crate::overrides::OverridesBundle;
use crate::progress::ProgressLookup;
use crate::stats;

/// Where the loaded collection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    Cache,
    Remote,
}

/// The collection currently held in memory
#[derive(Debug, Clone)]
pub struct LibraryState {
    pub all_books: Vec<BookRecord>,
    pub saved_at: DateTime<Utc>,
    pub origin: DataOrigin,
    pub shelves: Shelves,
}

pub struct App {
    config: Config,
    cache: CacheManager,
    source: Box<dyn BookSource>,
    progress: ProgressLookup,
    credentials: HardcoverCredentials,
    overrides: OverridesBundle,
    state: Option<LibraryState>,
    // Lazily fetched synopses, keyed by title; None means "asked, none exists"
    annotations: HashMap<String, Option<String>>,
}

impl App {
    /// Wire up the real clients from `config`
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        debug!(?cache_dir, "Cache directory configured");
        let cache = CacheManager::new(cache_dir)?;

        let source: Box<dyn BookSource> = match &config.static_books_path {
            Some(path) => Box::new(StaticJsonSource::new(path.clone())),
            None => match &config.livelib_base_url {
                Some(url) => Box::new(LiveLibClient::with_base_url(url)?),
                None => Box::new(LiveLibClient::new()?),
            },
        };

        let credentials = HardcoverCredentials::resolve(&config);
        let progress = progress_lookup(&config, &credentials)?;

        let data_dir = config.data_dir();
        let overrides = OverridesBundle::load(&data_dir)
            .with_context(|| format!("Failed to load overrides from {}", data_dir.display()))?;

        Ok(Self::with_parts(config, cache, source, progress, credentials, overrides))
    }

    /// Build from explicit parts
    pub fn with_parts(
        config: Config,
        cache: CacheManager,
        source: Box<dyn BookSource>,
        progress: ProgressLookup,
        credentials: HardcoverCredentials,
        overrides: OverridesBundle,
    ) -> Self {
        debug!(source = source.name(), progress_configured = credentials.is_configured(), "App created");
        Self {
            config,
            cache,
            source,
            progress,
            credentials,
            overrides,
            state: None,
            annotations: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn credentials(&self) -> &HardcoverCredentials {
        &self.credentials
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn state(&self) -> Option<&LibraryState> {
        self.state.as_ref()
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Startup load: a non-empty cache entry wins, otherwise fetch and cache.
    pub async fn load(&mut self) -> Result<&LibraryState> {
        let owner = self.config.owner()?.to_string();

        let cached = match self.cache.load(&owner) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Ignoring unreadable cache entry");
                None
            }
        };

        let (books, saved_at, origin) = match cached {
            Some(entry) => {
                info!(owner = %owner, count = entry.books.len(), "Loaded books from cache");
                (entry.books, entry.saved_at, DataOrigin::Cache)
            }
            None => {
                let books = self.fetch_remote(&owner).await?;
                let saved_at = Utc::now();
                self.save_to_cache(&owner, &books, saved_at);
                (books, saved_at, DataOrigin::Remote)
            }
        };

        Ok(self.install(books, saved_at, origin))
    }

    /// Fetch fresh data, bypassing the cache. On failure the collection
    /// already in memory is left as it was.
    pub async fn refresh(&mut self) -> Result<&LibraryState> {
        let owner = self.config.owner()?.to_string();
        let books = self
            .fetch_remote(&owner)
            .await
            .context("Failed to refresh books")?;

        let saved_at = Utc::now();
        self.save_to_cache(&owner, &books, saved_at);
        self.annotations.clear();
        Ok(self.install(books, saved_at, DataOrigin::Remote))
    }

    /// Drop the cached entry for the configured owner
    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear(self.config.owner()?)
    }

    async fn fetch_remote(&self, owner: &str) -> Result<Vec<BookRecord>> {
        info!(owner, source = self.source.name(), "Fetching books");
        let books = self
            .source
            .fetch(owner, &self.overrides.annotations, &self.overrides.pages)
            .await?;
        info!(owner, count = books.len(), "Fetched books");
        Ok(books)
    }

    fn save_to_cache(&self, owner: &str, books: &[BookRecord], saved_at: DateTime<Utc>) {
        if let Err(e) = self.cache.save(owner, books, saved_at) {
            warn!(error = %format!("{:#}", e), "Failed to write cache");
        }
    }

    fn install(&mut self, books: Vec<BookRecord>, saved_at: DateTime<Utc>, origin: DataOrigin) -> &LibraryState {
        let shelves = categorize(&books, &self.overrides.dates);
        self.state.insert(LibraryState {
            all_books: books,
            saved_at,
            origin,
            shelves,
        })
    }

    fn loaded(&self) -> Result<&LibraryState> {
        self.state
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Books have not been loaded"))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// One shelf as a browsable collection, in collection order
    pub fn collection(&self, shelf: &Shelf) -> Result<BookCollection> {
        let shelves = &self.loaded()?.shelves;
        let books = match shelf {
            Shelf::Read => shelves.read.clone(),
            Shelf::CurrentlyReading => shelves.reading.clone(),
            Shelf::ToRead => shelves.to_read.clone(),
            Shelf::Other(name) => anyhow::bail!("Unknown shelf '{}'", name),
        };
        Ok(BookCollection::new(books))
    }

    /// A categorized book by title (exact, then case-insensitive substring)
    pub fn find_book(&self, title: &str) -> Result<Option<BookRecord>> {
        let shelves = &self.loaded()?.shelves;
        let all: Vec<BookRecord> = shelves
            .read
            .iter()
            .chain(&shelves.reading)
            .chain(&shelves.to_read)
            .cloned()
            .collect();
        Ok(BookCollection::new(all).find(title).cloned())
    }

    /// Synopsis for a book: the record's own text, else fetched once from
    /// the source and remembered for the session.
    pub async fn annotation(&mut self, book: &BookRecord) -> Result<Option<String>> {
        if let Some(text) = book.annotation.as_ref().filter(|a| !a.trim().is_empty()) {
            return Ok(Some(text.clone()));
        }
        if let Some(known) = self.annotations.get(&book.title) {
            return Ok(known.clone());
        }

        debug!(title = %book.title, "Fetching annotation");
        let fetched = self.source.fetch_annotation(book).await?;
        self.annotations.insert(book.title.clone(), fetched.clone());
        Ok(fetched)
    }

    /// Progress for the first currently-reading book, if the service is
    /// configured and knows about it
    pub async fn current_progress(&self) -> Option<ProgressSnapshot> {
        let book = self.state.as_ref()?.shelves.reading.first()?;
        self.progress
            .lookup(&book.title, &book.display_author(), self.credentials.api_key.as_deref())
            .await
    }

    pub async fn build_dashboard(&self, year: i32) -> Result<Dashboard> {
        let state = self.loaded()?;
        let progress = self.current_progress().await;
        let top_authors =
            stats::top_authors_with_photos(self.source.as_ref(), &state.shelves.read, stats::TOP_AUTHORS)
                .await;

        let context = DashboardContext {
            owner: self.config.owner()?.to_string(),
            saved_at: state.saved_at,
            year,
            challenge_goal: self.config.challenge_goal(),
            progress,
            top_authors,
        };
        Ok(Dashboard::assemble(&state.shelves, context))
    }
}

/// Progress client for the configured endpoint and match policy
fn progress_lookup(config: &Config, credentials: &HardcoverCredentials) -> Result<ProgressLookup> {
    let api: Box<dyn ProgressApi> = match &config.hardcover_endpoint {
        Some(endpoint) => Box::new(HardcoverClient::with_endpoint(endpoint)?),
        None => Box::new(HardcoverClient::new()?),
    };
    Ok(ProgressLookup::new(api, credentials.user_id.clone()).with_policy(config.progress_match_policy))
}
