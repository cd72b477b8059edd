//! Utility functions for string formatting and manipulation.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    book_declension, cmp_ignore_case, contains_ignore_case, format_thousands,
    parse_russian_month_date, truncate_string,
};
