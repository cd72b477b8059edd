use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cover shown when a record has no cover URL.
pub const PLACEHOLDER_COVER_URL: &str = "https://placehold.co/140x211?text=No+cover";

/// Reading-status category of a book.
///
/// The three recognized shelves are a closed set; anything else coming from a
/// remote source or a hand-edited export is kept verbatim in `Other` so that
/// categorization can decide what to do with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Shelf {
    Read,
    CurrentlyReading,
    ToRead,
    Other(String),
}

impl Shelf {
    pub fn as_str(&self) -> &str {
        match self {
            Shelf::Read => "read",
            Shelf::CurrentlyReading => "currently-reading",
            Shelf::ToRead => "to-read",
            Shelf::Other(s) => s.as_str(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Shelf::Other(_))
    }
}

impl From<String> for Shelf {
    fn from(value: String) -> Self {
        match value.as_str() {
            "read" => Shelf::Read,
            "currently-reading" => Shelf::CurrentlyReading,
            "to-read" => Shelf::ToRead,
            _ => Shelf::Other(value),
        }
    }
}

impl From<&str> for Shelf {
    fn from(value: &str) -> Self {
        Shelf::from(value.to_string())
    }
}

impl From<Shelf> for String {
    fn from(shelf: Shelf) -> Self {
        match shelf {
            Shelf::Other(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Shelf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numbered sequence of books the site groups together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_positive_u32")]
    pub number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDisplay {
    pub base_name: String,
    pub full_display: String,
}

impl Cycle {
    /// Base name for grouping plus a "Name #N" label. `None` for a blank name.
    pub fn display(&self) -> Option<CycleDisplay> {
        let base_name = self.name.trim();
        if base_name.is_empty() {
            return None;
        }
        let full_display = match self.number {
            Some(n) => format!("{} #{}", base_name, n),
            None => base_name.to_string(),
        };
        Some(CycleDisplay {
            base_name: base_name.to_string(),
            full_display,
        })
    }
}

/// One book as fetched from a source and stored in the cache.
///
/// Field names follow the export format of the reading-tracker site so that
/// cache files and static exports share one shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Authors", default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(
        rename = "Number of Pages",
        default,
        deserialize_with = "deserialize_positive_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub pages: Option<u32>,
    #[serde(rename = "Exclusive Shelf")]
    pub shelf: Shelf,
    #[serde(rename = "Date Read", default, skip_serializing_if = "Option::is_none")]
    pub date_read: Option<String>,
    #[serde(
        rename = "My Rating",
        default,
        deserialize_with = "deserialize_rating",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<f32>,
    #[serde(rename = "Genres", default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
    #[serde(rename = "Series", default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    #[serde(rename = "Cycle", default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Cycle>,
    #[serde(rename = "Book Id", default, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<String>,
    #[serde(rename = "Cover Url", default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(rename = "Book Link", default, skip_serializing_if = "Option::is_none")]
    pub book_link: Option<String>,
    #[serde(rename = "Annotation", default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl BookRecord {
    pub fn new(title: impl Into<String>, shelf: Shelf) -> Self {
        Self {
            title: title.into(),
            authors: None,
            pages: None,
            shelf,
            date_read: None,
            rating: None,
            genres: Vec::new(),
            series: None,
            cycle: None,
            book_id: None,
            cover_url: None,
            book_link: None,
            annotation: None,
        }
    }

    /// Individual author names from the comma-separated `Authors` field
    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .as_deref()
            .map(|a| a.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// The first listed author, or "Unknown author"
    pub fn display_author(&self) -> String {
        self.author_list()
            .first()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "Unknown author".to_string())
    }

    /// Parsed `Date Read`, if present and a valid `YYYY-MM-DD` date
    pub fn read_date(&self) -> Option<NaiveDate> {
        self.date_read
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    }

    pub fn has_valid_read_date(&self) -> bool {
        self.read_date().is_some()
    }

    /// `YYYY-MM` of the read date, used for monthly grouping
    pub fn read_month(&self) -> Option<String> {
        self.read_date().map(|d| d.format("%Y-%m").to_string())
    }

    pub fn formatted_read_date(&self) -> Option<String> {
        self.read_date().map(|d| d.format("%b %d, %Y").to_string())
    }

    /// Rating as a number, 0.0 when unrated
    pub fn rating_value(&self) -> f32 {
        self.rating.unwrap_or(0.0)
    }

    pub fn page_count(&self) -> u32 {
        self.pages.unwrap_or(0)
    }

    /// Trimmed, de-duplicated genre names in their original order
    pub fn display_genres(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for genre in self.genres.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
            if !seen.contains(&genre) {
                seen.push(genre);
            }
        }
        seen
    }

    pub fn series_display(&self) -> Option<&str> {
        self.series.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn cycle_display(&self) -> Option<CycleDisplay> {
        self.cycle.as_ref().and_then(Cycle::display)
    }

    pub fn cover_url_or_placeholder(&self) -> &str {
        self.cover_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(PLACEHOLDER_COVER_URL)
    }
}

// Accepts numbers or numeric strings; zero, blanks and junk become None
pub(crate) fn deserialize_positive_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct PositiveVisitor;

    impl<'de> de::Visitor<'de> for PositiveVisitor {
        type Value = Option<u32>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a positive integer, numeric string or null")
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok().filter(|n| *n > 0))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(u32::try_from(v).ok().filter(|n| *n > 0))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            if v.is_finite() && v >= 1.0 && v <= u32::MAX as f64 {
                Ok(Some(v.round() as u32))
            } else {
                Ok(None)
            }
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.trim().parse::<u32>().ok().filter(|n| *n > 0))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(PositiveVisitor)
}

// Same leniency for ratings, which may carry halves
pub(crate) fn deserialize_rating<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct RatingVisitor;

    impl<'de> de::Visitor<'de> for RatingVisitor {
        type Value = Option<f32>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a rating number, numeric string or null")
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v as f32).filter(|r| *r > 0.0))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v as f32).filter(|r| *r > 0.0))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v as f32).filter(|r| *r > 0.0))
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v
                .trim()
                .replace(',', ".")
                .parse::<f32>()
                .ok()
                .filter(|r| r.is_finite() && *r > 0.0))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(RatingVisitor)
}
