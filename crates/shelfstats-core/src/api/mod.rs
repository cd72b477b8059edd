//! Remote sources: the reading site (book collection) and the progress
//! service (currently-reading page counts).

pub mod error;
pub mod hardcover;
pub mod livelib;
pub mod source;

pub use error::ApiError;
pub use hardcover::{HardcoverClient, ProgressApi, ReadingBook};
pub use livelib::LiveLibClient;
pub use source::{BookSource, StaticJsonSource};
