//! Statistics and chart series computed from the read shelf.
//!
//! Everything here is a pure function of the books passed in, except the
//! top-authors section which also asks the source for author portraits.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use futures::future::join_all;
use serde::Serialize;
use tracing::debug;

use crate::api::BookSource;
use crate::models::BookRecord;
use crate::utils::{book_declension, cmp_ignore_case};

/// Groups with at least this many books get the wide layout
pub const LARGE_GROUP_THRESHOLD: usize = 8;

pub const TOP_GENRES: usize = 5;
pub const TOP_AUTHORS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct HeroStats {
    pub total_books: usize,
    pub total_pages: u64,
    pub books_this_year: usize,
    pub challenge_goal: u32,
    /// Share of the goal reached, capped at 100
    pub challenge_percent: u32,
}

pub fn hero_stats(read: &[BookRecord], year: i32, goal: u32) -> HeroStats {
    let books_this_year = read
        .iter()
        .filter(|b| b.read_date().is_some_and(|d| d.year() == year))
        .count();
    let goal = goal.max(1);
    let percent = (books_this_year as f64 / goal as f64 * 100.0).round().min(100.0);

    HeroStats {
        total_books: read.len(),
        total_pages: total_pages(read),
        books_this_year,
        challenge_goal: goal,
        challenge_percent: percent as u32,
    }
}

fn total_pages(books: &[BookRecord]) -> u64 {
    books.iter().map(|b| u64::from(b.page_count())).sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RecordBook {
    pub title: String,
    pub pages: Option<u32>,
}

impl RecordBook {
    fn from_book(book: &BookRecord) -> Self {
        Self {
            title: book.title.clone(),
            pages: book.pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookRecords {
    pub longest: RecordBook,
    pub shortest: RecordBook,
}

/// Longest and shortest read book. Unknown page counts never win "shortest";
/// if no book has a page count both fall back to the first book.
pub fn book_records(read: &[BookRecord]) -> Option<BookRecords> {
    let first = read.first()?;

    let mut longest = first;
    for book in read {
        if book.page_count() > longest.page_count() {
            longest = book;
        }
    }

    let mut shortest: Option<&BookRecord> = None;
    for book in read.iter().filter(|b| b.page_count() > 0) {
        if shortest.map_or(true, |s| book.page_count() < s.page_count()) {
            shortest = Some(book);
        }
    }

    Some(BookRecords {
        longest: RecordBook::from_book(longest),
        shortest: RecordBook::from_book(shortest.unwrap_or(first)),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReadingStats {
    pub total_books: usize,
    pub total_pages: u64,
    /// Over the months that have at least one dated read
    pub avg_books_per_month: f64,
    pub avg_pages_per_month: u64,
    pub series_read: usize,
}

pub fn reading_stats(read: &[BookRecord]) -> ReadingStats {
    let mut months: Vec<String> = read.iter().filter_map(BookRecord::read_month).collect();
    months.sort();
    months.dedup();

    let total_books = read.len();
    let total_pages = total_pages(read);
    let (avg_books_per_month, avg_pages_per_month) = if months.is_empty() {
        (0.0, 0)
    } else {
        let n = months.len() as f64;
        (
            (total_books as f64 / n * 10.0).round() / 10.0,
            (total_pages as f64 / n).round() as u64,
        )
    };

    let mut series: Vec<&str> = read.iter().filter_map(BookRecord::series_display).collect();
    series.sort_unstable();
    series.dedup();

    ReadingStats {
        total_books,
        total_pages,
        avg_books_per_month,
        avg_pages_per_month,
        series_read: series.len(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct TimelinePoint {
    /// `YYYY-MM`
    pub month: String,
    /// "Mar 2023"
    pub label: String,
    pub count: usize,
}

/// Books read per month, oldest month first. Undated reads are skipped.
pub fn timeline(read: &[BookRecord]) -> Vec<TimelinePoint> {
    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for date in read.iter().filter_map(BookRecord::read_date) {
        if let Some(month_start) = date.with_day(1) {
            *counts.entry(month_start).or_default() += 1;
        }
    }

    let mut months: Vec<(NaiveDate, usize)> = counts.into_iter().collect();
    months.sort_by_key(|(month, _)| *month);
    months
        .into_iter()
        .map(|(month, count)| TimelinePoint {
            month: month.format("%Y-%m").to_string(),
            label: month.format("%b %Y").to_string(),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RatingBucket {
    pub rating: f32,
    /// "★★★½☆"
    pub stars: String,
    pub count: usize,
}

/// Rated books per half-star bucket, lowest rating first. Empty buckets are
/// left out.
pub fn rating_histogram(read: &[BookRecord]) -> Vec<RatingBucket> {
    // Keyed by half-stars so the key stays an integer
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for rating in read.iter().filter_map(|b| b.rating).filter(|r| *r > 0.0) {
        let halves = (rating * 2.0).round().clamp(1.0, 10.0) as u32;
        *counts.entry(halves).or_default() += 1;
    }

    let mut buckets: Vec<(u32, usize)> = counts.into_iter().collect();
    buckets.sort_by_key(|(halves, _)| *halves);
    buckets
        .into_iter()
        .map(|(halves, count)| RatingBucket {
            rating: halves as f32 / 2.0,
            stars: star_label(halves),
            count,
        })
        .collect()
}

/// Star string for a 0-5 rating, rounded to the nearest half
pub fn stars_for(rating: f32) -> String {
    star_label((rating * 2.0).round().clamp(0.0, 10.0) as u32)
}

fn star_label(halves: u32) -> String {
    let full = (halves / 2) as usize;
    let half = halves % 2 == 1;
    let empty = 5usize.saturating_sub(full + usize::from(half));
    let mut label = "★".repeat(full);
    if half {
        label.push('½');
    }
    label.push_str(&"☆".repeat(empty));
    label
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GenreShare {
    pub genre: String,
    pub count: usize,
    /// Share of read books carrying this genre, whole percent
    pub percent: u32,
}

/// The `limit` most common genres. Ties keep first-seen order.
pub fn top_genres(read: &[BookRecord], limit: usize) -> Vec<GenreShare> {
    let counts = ranked_counts(read.iter().flat_map(|b| b.display_genres()));
    let total = read.len().max(1) as f64;
    counts
        .into_iter()
        .take(limit)
        .map(|(genre, count)| GenreShare {
            genre: genre.to_string(),
            count,
            percent: (count as f64 / total * 100.0).round() as u32,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct AuthorCount {
    pub rank: usize,
    pub author: String,
    pub count: usize,
    /// "3 книги"
    pub count_label: String,
    pub photo_url: Option<String>,
}

/// The `limit` most read authors, without portraits
pub fn top_authors(read: &[BookRecord], limit: usize) -> Vec<AuthorCount> {
    let names: Vec<String> = read.iter().map(BookRecord::display_author).collect();
    ranked_counts(names.iter().map(String::as_str))
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (author, count))| AuthorCount {
            rank: i + 1,
            author: author.to_string(),
            count,
            count_label: book_declension(count),
            photo_url: None,
        })
        .collect()
}

/// Top authors with portraits. The photo lookups run concurrently and all of
/// them finish before this returns; a failed lookup leaves that photo empty.
pub async fn top_authors_with_photos(
    source: &dyn BookSource,
    read: &[BookRecord],
    limit: usize,
) -> Vec<AuthorCount> {
    let mut authors = top_authors(read, limit);
    let photos = join_all(authors.iter().map(|a| source.author_photo(&a.author))).await;

    for (author, photo) in authors.iter_mut().zip(photos) {
        author.photo_url = match photo {
            Ok(url) => url,
            Err(e) => {
                debug!(author = %author.author, error = %e, "Author photo unavailable");
                None
            }
        };
    }
    authors
}

/// Count occurrences, most frequent first; ties keep first-seen order.
fn ranked_counts<'a>(items: impl Iterator<Item = &'a str>) -> Vec<(&'a str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(name, _)| *name == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Series,
    Cycle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct GroupBook {
    pub title: String,
    /// "Name #N" for cycles
    pub label: Option<String>,
    pub number: Option<u32>,
    pub cover_url: String,
    pub rating: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookGroup {
    pub name: String,
    /// Author of the first book seen in the group
    pub author: String,
    pub books: Vec<GroupBook>,
    pub large: bool,
}

/// Read books grouped by series name or cycle base name, groups in
/// first-seen order. Cycle members are ordered by number, series members by
/// title.
pub fn book_groups(read: &[BookRecord], kind: GroupKind) -> Vec<BookGroup> {
    let mut groups: Vec<(String, String, Vec<&BookRecord>)> = Vec::new();

    for book in read {
        let key = match kind {
            GroupKind::Series => book.series_display().map(str::to_string),
            GroupKind::Cycle => book.cycle_display().map(|c| c.base_name),
        };
        let Some(key) = key else { continue };

        match groups.iter_mut().find(|(name, _, _)| *name == key) {
            Some((_, _, books)) => books.push(book),
            None => groups.push((key, book.display_author(), vec![book])),
        }
    }

    groups
        .into_iter()
        .map(|(name, author, mut books)| {
            match kind {
                GroupKind::Cycle => books.sort_by_key(|b| b.cycle.as_ref().and_then(|c| c.number).unwrap_or(0)),
                GroupKind::Series => books.sort_by(|a, b| cmp_ignore_case(&a.title, &b.title)),
            }
            let large = books.len() >= LARGE_GROUP_THRESHOLD;
            BookGroup {
                name,
                author,
                books: books
                    .into_iter()
                    .map(|b| GroupBook {
                        title: b.title.clone(),
                        label: b.cycle_display().map(|c| c.full_display),
                        number: b.cycle.as_ref().and_then(|c| c.number),
                        cover_url: b.cover_url_or_placeholder().to_string(),
                        rating: b.rating,
                    })
                    .collect(),
                large,
            }
        })
        .collect()
}
