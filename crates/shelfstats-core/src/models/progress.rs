use serde::{Deserialize, Serialize};

/// Reading progress of the one book currently being read.
///
/// Derived fresh on every lookup and never written to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProgressSnapshot {
    /// Whole percent, 0-100
    pub percentage: u32,
    pub current_page: u32,
    pub total_pages: u32,
    /// Title as the progress service knows it
    pub title: String,
    pub author: String,
}

impl ProgressSnapshot {
    /// Computes a snapshot from raw page counts. Zero total pages yields 0%.
    pub fn from_pages(
        current_page: u32,
        total_pages: u32,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let percentage = if total_pages > 0 {
            ((current_page as f64 / total_pages as f64) * 100.0).round() as u32
        } else {
            0
        };
        Self {
            percentage: percentage.min(100),
            current_page,
            total_pages,
            title: title.into(),
            author: author.into(),
        }
    }

    /// Whether there is anything worth showing (the page hides 0%)
    pub fn has_progress(&self) -> bool {
        self.percentage > 0
    }

    /// "123 / 456 pages", only when both counts are known
    pub fn pages_display(&self) -> Option<String> {
        if self.current_page > 0 && self.total_pages > 0 {
            Some(format!("{} / {} pages", self.current_page, self.total_pages))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pages_rounds() {
        let snap = ProgressSnapshot::from_pages(100, 300, "Book", "Author");
        assert_eq!(snap.percentage, 33);
        let snap = ProgressSnapshot::from_pages(2, 3, "Book", "Author");
        assert_eq!(snap.percentage, 67);
    }

    #[test]
    fn test_zero_total_pages() {
        let snap = ProgressSnapshot::from_pages(50, 0, "Book", "Author");
        assert_eq!(snap.percentage, 0);
        assert!(!snap.has_progress());
        assert_eq!(snap.pages_display(), None);
    }

    #[test]
    fn test_progress_past_end_is_capped() {
        let snap = ProgressSnapshot::from_pages(320, 300, "Book", "Author");
        assert_eq!(snap.percentage, 100);
        assert_eq!(snap.pages_display().as_deref(), Some("320 / 300 pages"));
    }
}
