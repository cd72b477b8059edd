//! Client for the reading site's JSON shelf listings.
//!
//! The site itself serves HTML; the dashboard talks to a small proxy that
//! exposes each public shelf as JSON:
//!
//! - `GET {base}/reader/{owner}/{read|reading|wish}` -> `{ "books": [...] }`
//! - `GET {base}/book/{id}/annotation` -> `{ "annotation": "..." }`
//! - `GET {base}/author/photo?name=...` -> `{ "url": "..." }`

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::source::{apply_overlays, BookSource};
use super::ApiError;
use crate::models::book::{deserialize_positive_u32, deserialize_rating};
use crate::models::{BookRecord, Cycle, Shelf};
use crate::utils::parse_russian_month_date;

/// Local development proxy, used when the config names no base URL
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8081/api/livelib";

/// The three public shelves and their path segment on the site
const SHELF_PATHS: [(Shelf, &str); 3] = [
    (Shelf::Read, "read"),
    (Shelf::CurrentlyReading, "reading"),
    (Shelf::ToRead, "wish"),
];

#[derive(Debug, Deserialize)]
struct ShelfListing {
    #[serde(default)]
    books: Vec<RawBook>,
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default, deserialize_with = "deserialize_id")]
    id: Option<String>,
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_positive_u32")]
    pages: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_rating")]
    rating: Option<f32>,
    #[serde(rename = "readDate", default)]
    read_date: Option<String>,
    #[serde(default)]
    genres: Vec<String>,
    #[serde(default)]
    series: Option<String>,
    #[serde(default)]
    cycle: Option<Cycle>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default)]
    link: Option<String>,
}

impl RawBook {
    fn into_record(self, shelf: Shelf) -> BookRecord {
        let authors = if self.authors.is_empty() {
            None
        } else {
            Some(self.authors.join(", "))
        };

        BookRecord {
            title: self.title.trim().to_string(),
            authors,
            pages: self.pages,
            shelf,
            date_read: self.read_date.as_deref().and_then(normalize_read_date),
            rating: self.rating,
            genres: self.genres,
            series: self.series,
            cycle: self.cycle,
            book_id: self.id,
            cover_url: self.cover,
            book_link: self.link,
            annotation: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnnotationResponse {
    annotation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoResponse {
    url: Option<String>,
}

/// Turn the site's date text into `YYYY-MM-DD`.
///
/// ISO dates pass through, "Май 2023 г." becomes "2023-05-01", anything else
/// is kept verbatim so a custom-date override can still replace it.
fn normalize_read_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Some(parse_russian_month_date(raw).unwrap_or_else(|| raw.to_string()))
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct LiveLibClient {
    client: Client,
    base_url: String,
}

impl LiveLibClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let response = self.client.get(url).query(query).send().await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::parse(url, e))
    }

    /// Fetch one shelf as normalized records
    pub async fn fetch_shelf(&self, owner: &str, shelf: Shelf, path: &str) -> Result<Vec<BookRecord>> {
        let url = format!("{}/reader/{}/{}", self.base_url, owner, path);
        let listing: ShelfListing = self
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to fetch '{}' shelf for {}", path, owner))?;

        debug!(owner, shelf = %shelf, count = listing.books.len(), "Fetched shelf");
        Ok(listing
            .books
            .into_iter()
            .map(|raw| raw.into_record(shelf.clone()))
            .collect())
    }
}

#[async_trait]
impl BookSource for LiveLibClient {
    fn name(&self) -> &str {
        "livelib"
    }

    async fn fetch(
        &self,
        owner: &str,
        annotations: &HashMap<String, String>,
        custom_pages: &HashMap<String, u32>,
    ) -> Result<Vec<BookRecord>> {
        let mut books = Vec::new();
        for (shelf, path) in SHELF_PATHS {
            books.extend(self.fetch_shelf(owner, shelf, path).await?);
        }

        apply_overlays(&mut books, annotations, custom_pages);
        info!(owner, count = books.len(), "Fetched collection from reading site");
        Ok(books)
    }

    async fn fetch_annotation(&self, book: &BookRecord) -> Result<Option<String>> {
        let Some(ref id) = book.book_id else {
            return Ok(None);
        };
        let url = format!("{}/book/{}/annotation", self.base_url, id);
        let response: AnnotationResponse = self
            .get_json(&url, &[])
            .await
            .with_context(|| format!("Failed to fetch annotation for '{}'", book.title))?;
        Ok(response.annotation.filter(|a| !a.trim().is_empty()))
    }

    async fn author_photo(&self, author: &str) -> Result<Option<String>> {
        let url = format!("{}/author/photo", self.base_url);
        let response: PhotoResponse = self
            .get_json(&url, &[("name", author)])
            .await
            .with_context(|| format!("Failed to fetch photo for {}", author))?;
        Ok(response.url.filter(|u| !u.is_empty()))
    }
}

// Book ids arrive as numbers or strings
fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct IdVisitor;

    impl<'de> de::Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E> {
            if v.is_empty() {
                Ok(None)
            } else {
                Ok(Some(v.to_string()))
            }
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_book_normalization() {
        let json = r#"{
            "id": 1001,
            "title": " Солярис ",
            "authors": ["Станислав Лем"],
            "pages": "256",
            "rating": "4,5",
            "readDate": "Май 2023 г.",
            "genres": ["Фантастика"],
            "cover": "https://example.org/c.jpg",
            "link": "https://www.livelib.ru/book/1001"
        }"#;
        let raw: RawBook = serde_json::from_str(json).unwrap();
        let book = raw.into_record(Shelf::Read);

        assert_eq!(book.title, "Солярис");
        assert_eq!(book.book_id.as_deref(), Some("1001"));
        assert_eq!(book.authors.as_deref(), Some("Станислав Лем"));
        assert_eq!(book.pages, Some(256));
        assert_eq!(book.rating, Some(4.5));
        assert_eq!(book.date_read.as_deref(), Some("2023-05-01"));
        assert_eq!(book.shelf, Shelf::Read);
    }

    #[test]
    fn test_normalize_read_date() {
        assert_eq!(normalize_read_date("2022-01-01").as_deref(), Some("2022-01-01"));
        assert_eq!(normalize_read_date("Январь 2021 г.").as_deref(), Some("2021-01-01"));
        assert_eq!(normalize_read_date("  "), None);
        assert_eq!(normalize_read_date("давно").as_deref(), Some("давно"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = LiveLibClient::with_base_url("http://localhost:9000/api/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
    }
}
