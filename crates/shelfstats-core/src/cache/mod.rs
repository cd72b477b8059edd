//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager` for storing and retrieving the
//! fetched book collection locally. There is one JSON file per owner, and an
//! entry has no expiry: it is used until an explicit refresh replaces it.

pub mod manager;

pub use manager::{format_age, CacheEntry, CacheManager};
