//! Core library for shelfstats, a personal reading-library dashboard.
//!
//! Books come from the reading site (or a static export), are cached per
//! owner, corrected with bundled overrides, split into shelves and turned
//! into the statistics and cards of a `Dashboard`.

pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod library;
pub mod models;
pub mod overrides;
pub mod progress;
pub mod stats;
pub mod utils;

pub use app::{App, DataOrigin, LibraryState};
pub use config::Config;
pub use dashboard::Dashboard;
