//! GraphQL client for the reading-progress service.
//!
//! Only one query is used: the user's books with the "currently reading"
//! status, together with their read sessions so that page progress can be
//! derived.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ApiError;
use crate::models::ProgressSnapshot;

/// Public GraphQL endpoint of the progress service
pub const DEFAULT_ENDPOINT: &str = "https://api.hardcover.app/v1/graphql";

/// Status id the service uses for "Currently Reading"
pub const CURRENTLY_READING_STATUS_ID: i64 = 2;

const CURRENTLY_READING_QUERY: &str = r#"
query GetReadingBooks($userId: Int!, $statusId: Int!) {
    user_books(
        where: {user_id: {_eq: $userId}, status_id: {_eq: $statusId}}
    ) {
        id
        book_id
        status_id
        rating
        book {
            id
            title
            pages
            image { url }
            contributions { author { name } }
        }
        user_book_reads {
            id
            started_at
            finished_at
            progress_pages
            edition { pages }
        }
    }
}
"#;

/// One book from the currently-reading list, with derived progress
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingBook {
    pub id: Option<i64>,
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl ReadingBook {
    pub fn to_snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::from_pages(self.current_page, self.total_pages, &self.title, &self.author)
    }
}

/// Source of the currently-reading list
#[async_trait]
pub trait ProgressApi: Send + Sync {
    async fn currently_reading(&self, api_key: &str, user_id: &str) -> Result<Vec<ReadingBook>>;
}

// ===== Wire types =====

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: Variables,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Variables {
    user_id: i64,
    status_id: i64,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<ResponseData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ResponseData {
    #[serde(default)]
    user_books: Vec<UserBook>,
}

#[derive(Debug, Deserialize)]
struct UserBook {
    book: RemoteBook,
    #[serde(default)]
    user_book_reads: Vec<UserBookRead>,
}

#[derive(Debug, Deserialize)]
struct RemoteBook {
    id: Option<i64>,
    #[serde(default)]
    title: String,
    pages: Option<i64>,
    image: Option<Image>,
    #[serde(default)]
    contributions: Vec<Contribution>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contribution {
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserBookRead {
    finished_at: Option<String>,
    progress_pages: Option<f64>,
    edition: Option<Edition>,
}

#[derive(Debug, Deserialize)]
struct Edition {
    pages: Option<i64>,
}

fn positive(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok()).filter(|v| *v > 0)
}

impl UserBook {
    /// The unfinished read if there is one, otherwise the first read
    fn current_read(&self) -> Option<&UserBookRead> {
        self.user_book_reads
            .iter()
            .find(|r| r.finished_at.is_none())
            .or_else(|| self.user_book_reads.first())
    }

    fn into_reading_book(self) -> ReadingBook {
        let read = self.current_read();
        let current_page = read
            .and_then(|r| r.progress_pages)
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(|p| p.round() as u32)
            .unwrap_or(0);
        let total_pages = read
            .and_then(|r| r.edition.as_ref())
            .and_then(|e| positive(e.pages))
            .or_else(|| positive(self.book.pages))
            .unwrap_or(0);

        let author = self
            .book
            .contributions
            .first()
            .and_then(|c| c.author.as_ref())
            .and_then(|a| a.name.clone())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        ReadingBook {
            id: self.book.id,
            title: self.book.title,
            author,
            cover_url: self.book.image.and_then(|i| i.url),
            current_page,
            total_pages,
        }
    }
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HardcoverClient {
    client: Client,
    endpoint: String,
    /// Proxies expect the key in `X-API-Key` as well
    send_key_header: bool,
}

impl HardcoverClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            send_key_header: false,
        })
    }

    /// Talk to a proxy or alternate endpoint instead of the public one
    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: endpoint.to_string(),
            send_key_header: endpoint != DEFAULT_ENDPOINT,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn auth_headers(&self, api_key: &str) -> Result<header::HeaderMap> {
        // Keys copied from the service settings page already carry the scheme
        let bearer = if api_key.starts_with("Bearer ") {
            api_key.to_string()
        } else {
            format!("Bearer {}", api_key)
        };

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, header::HeaderValue::from_str(&bearer)?);
        if self.send_key_header {
            let raw_key = api_key.trim_start_matches("Bearer ");
            headers.insert("X-API-Key", header::HeaderValue::from_str(raw_key)?);
        }
        Ok(headers)
    }
}

#[async_trait]
impl ProgressApi for HardcoverClient {
    async fn currently_reading(&self, api_key: &str, user_id: &str) -> Result<Vec<ReadingBook>> {
        if api_key.trim().is_empty() {
            return Err(ApiError::ConfigurationMissing("progress API key".to_string()).into());
        }
        let user_id: i64 = user_id.trim().parse().map_err(|_| {
            ApiError::InvalidConfiguration(format!("user id must be numeric, got '{}'", user_id))
        })?;

        let request = GraphQlRequest {
            query: CURRENTLY_READING_QUERY,
            variables: Variables {
                user_id,
                status_id: CURRENTLY_READING_STATUS_ID,
            },
        };

        debug!(endpoint = %self.endpoint, user_id, "Querying currently-reading list");

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth_headers(api_key)?)
            .json(&request)
            .send()
            .await
            .map_err(ApiError::Network)?;

        let status = response.status();
        let text = response.text().await.map_err(ApiError::Network)?;
        if !status.is_success() {
            // Prefer the GraphQL error messages when the body carries them
            if let Ok(parsed) = serde_json::from_str::<GraphQlResponse>(&text) {
                if !parsed.errors.is_empty() && status.as_u16() != 401 {
                    return Err(ApiError::GraphQl(join_messages(&parsed.errors)).into());
                }
            }
            return Err(ApiError::from_status(status, &text).into());
        }

        let parsed: GraphQlResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::parse("progress response", e))?;
        if !parsed.errors.is_empty() {
            return Err(ApiError::GraphQl(join_messages(&parsed.errors)).into());
        }

        let books: Vec<ReadingBook> = parsed
            .data
            .map(|d| d.user_books)
            .unwrap_or_default()
            .into_iter()
            .map(UserBook::into_reading_book)
            .collect();

        for book in &books {
            debug!(
                title = %book.title,
                current_page = book.current_page,
                total_pages = book.total_pages,
                "Currently reading"
            );
        }
        Ok(books)
    }
}

fn join_messages(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_books(json: &str) -> Vec<ReadingBook> {
        let parsed: GraphQlResponse = serde_json::from_str(json).unwrap();
        parsed
            .data
            .unwrap()
            .user_books
            .into_iter()
            .map(UserBook::into_reading_book)
            .collect()
    }

    #[test]
    fn test_unfinished_read_wins() {
        let books = parse_books(
            r#"{"data": {"user_books": [{
                "book": {"id": 7, "title": "Dune", "pages": 600,
                         "contributions": [{"author": {"name": "Frank Herbert"}}]},
                "user_book_reads": [
                    {"finished_at": "2020-01-01", "progress_pages": 600, "edition": {"pages": 600}},
                    {"finished_at": null, "progress_pages": 150, "edition": {"pages": 412}}
                ]
            }]}}"#,
        );
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].current_page, 150);
        assert_eq!(books[0].total_pages, 412);
        assert_eq!(books[0].author, "Frank Herbert");
        assert_eq!(books[0].to_snapshot().percentage, 36);
    }

    #[test]
    fn test_falls_back_to_book_pages() {
        let books = parse_books(
            r#"{"data": {"user_books": [{
                "book": {"id": 1, "title": "Untracked", "pages": 200, "contributions": []},
                "user_book_reads": [{"finished_at": null, "progress_pages": 50, "edition": {"pages": 0}}]
            }]}}"#,
        );
        assert_eq!(books[0].total_pages, 200);
        assert_eq!(books[0].author, "Unknown");
        assert_eq!(books[0].to_snapshot().percentage, 25);
    }

    #[test]
    fn test_no_reads_means_zero_progress() {
        let books = parse_books(
            r#"{"data": {"user_books": [{
                "book": {"id": 1, "title": "Fresh", "pages": null}
            }]}}"#,
        );
        assert_eq!(books[0].current_page, 0);
        assert_eq!(books[0].total_pages, 0);
        assert_eq!(books[0].to_snapshot().percentage, 0);
    }

    #[test]
    fn test_request_body_shape() {
        let request = GraphQlRequest {
            query: CURRENTLY_READING_QUERY,
            variables: Variables {
                user_id: 42,
                status_id: CURRENTLY_READING_STATUS_ID,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["variables"]["userId"], 42);
        assert_eq!(value["variables"]["statusId"], 2);
    }

    #[test]
    fn test_auth_headers() {
        let client = HardcoverClient::with_endpoint("http://127.0.0.1:8081/api/proxy/v1/graphql").unwrap();
        let headers = client.auth_headers("Bearer abc").unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");
        assert_eq!(headers["X-API-Key"], "abc");

        let direct = HardcoverClient::new().unwrap();
        let headers = direct.auth_headers("abc").unwrap();
        assert_eq!(headers[header::AUTHORIZATION], "Bearer abc");
        assert!(headers.get("X-API-Key").is_none());
    }

    #[tokio::test]
    async fn test_non_numeric_user_id_is_rejected() {
        let client = HardcoverClient::new().unwrap();
        let err = client.currently_reading("key", "abc").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidConfiguration(_))
        ));
    }
}
