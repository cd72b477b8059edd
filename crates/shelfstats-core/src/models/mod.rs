//! Data models for the reading library.
//!
//! - `BookRecord`, `Shelf`, `Cycle`: one book and its shelf/grouping fields
//! - `ProgressSnapshot`: reading progress from the progress service

pub mod book;
pub mod progress;

pub use book::{BookRecord, Cycle, CycleDisplay, Shelf, PLACEHOLDER_COVER_URL};
pub use progress::ProgressSnapshot;
