//! Reading progress for the book on the currently-reading shelf.
//!
//! Progress is an enhancement: a missing credential, a network failure or a
//! bad response all end up as "no progress" and never as an error.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{ProgressApi, ReadingBook};
use crate::models::ProgressSnapshot;

/// How the currently-reading list is matched against the local book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// First item of the remote list, whatever its title
    #[default]
    FirstCurrentlyReading,
    /// First item whose title contains (or is contained in) the local title,
    /// else whose author shares the local author's surname
    TitleOrAuthor,
}

pub struct ProgressLookup {
    api: Box<dyn ProgressApi>,
    user_id: Option<String>,
    policy: MatchPolicy,
}

impl ProgressLookup {
    pub fn new(api: Box<dyn ProgressApi>, user_id: Option<String>) -> Self {
        Self {
            api,
            user_id: user_id.filter(|id| !id.trim().is_empty()),
            policy: MatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Progress for the book being read, or `None`.
    ///
    /// Without an API key or user id this returns immediately without
    /// touching the network.
    pub async fn lookup(
        &self,
        title: &str,
        author: &str,
        api_key: Option<&str>,
    ) -> Option<ProgressSnapshot> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        let (Some(api_key), Some(user_id)) = (api_key, self.user_id.as_deref()) else {
            debug!("Progress service not configured, skipping lookup");
            return None;
        };

        let books = match self.api.currently_reading(api_key, user_id).await {
            Ok(books) => books,
            Err(e) => {
                warn!(error = %format!("{:#}", e), "Could not fetch reading progress");
                return None;
            }
        };

        let matched = match self.policy {
            MatchPolicy::FirstCurrentlyReading => books.first(),
            MatchPolicy::TitleOrAuthor => match_by_title_or_author(&books, title, author),
        };
        let Some(book) = matched else {
            debug!(title, count = books.len(), "No matching currently-reading book");
            return None;
        };

        let snapshot = book.to_snapshot();
        debug!(
            title = %snapshot.title,
            percentage = snapshot.percentage,
            "Reading progress"
        );
        Some(snapshot)
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn surname(author: &str) -> Option<String> {
    author.split_whitespace().last().map(normalize).filter(|s| !s.is_empty())
}

fn match_by_title_or_author<'a>(
    books: &'a [ReadingBook],
    title: &str,
    author: &str,
) -> Option<&'a ReadingBook> {
    let wanted = normalize(title);
    if !wanted.is_empty() {
        let by_title = books.iter().find(|b| {
            let remote = normalize(&b.title);
            !remote.is_empty() && (remote.contains(&wanted) || wanted.contains(&remote))
        });
        if by_title.is_some() {
            return by_title;
        }
    }

    let wanted_surname = surname(author)?;
    books
        .iter()
        .find(|b| surname(&b.author).as_deref() == Some(wanted_surname.as_str()))
}
