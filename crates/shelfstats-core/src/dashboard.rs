//! The dashboard document: every number, series and card the page shows.
//!
//! The web page and the terminal front-end are both templates over this
//! document. It is assembled by `App::build_dashboard`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::format_age;
use crate::library::{BookCollection, Shelves, SortOrder};
use crate::models::{BookRecord, ProgressSnapshot};
use crate::stats::{
    self, AuthorCount, BookGroup, BookRecords, GenreShare, GroupKind, HeroStats, RatingBucket,
    ReadingStats, TimelinePoint,
};

/// A book as the card grid renders it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct BookCard {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub link: Option<String>,
    pub pages: Option<u32>,
    pub rating: Option<f32>,
    /// "Mar 05, 2023"
    pub read_date: Option<String>,
    pub genres: Vec<String>,
    pub series: Option<String>,
    pub cycle: Option<String>,
    pub annotation: Option<String>,
}

impl BookCard {
    pub fn from_book(book: &BookRecord) -> Self {
        Self {
            title: book.title.clone(),
            author: book.display_author(),
            cover_url: book.cover_url_or_placeholder().to_string(),
            link: book.book_link.clone(),
            pages: book.pages,
            rating: book.rating.filter(|r| *r > 0.0),
            read_date: book.formatted_read_date(),
            genres: book.display_genres().into_iter().map(str::to_string).collect(),
            series: book.series_display().map(str::to_string),
            cycle: book.cycle_display().map(|c| c.full_display),
            annotation: book.annotation.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CurrentBook {
    pub card: BookCard,
    /// Only present when the progress service reported more than 0%
    pub progress: Option<ProgressSnapshot>,
}

/// Reading-site informer images and the pages they link to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ProfileBadges {
    pub challenge_link: String,
    pub challenge_image: String,
    pub profile_link: String,
    pub profile_image: String,
}

impl ProfileBadges {
    pub fn new(owner: &str, year: i32) -> Self {
        Self {
            challenge_link: format!("https://www.livelib.ru/challenge/{}/reader/{}", year, owner),
            challenge_image: format!("https://u.livelib.ru/reader/{}/challenge{}.png", owner, year),
            profile_link: format!("https://www.livelib.ru/reader/{}", owner),
            profile_image: format!("https://u.livelib.ru/reader/{}/informer-i3.png", owner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Dashboard {
    pub owner: String,
    /// RFC 3339
    pub last_updated: String,
    /// "3h ago", relative to assembly time
    pub updated_ago: String,
    pub badges: ProfileBadges,
    pub year: i32,
    pub hero: HeroStats,
    pub current_book: Option<CurrentBook>,
    pub last_read: Option<BookCard>,
    pub top_authors: Vec<AuthorCount>,
    pub records: Option<BookRecords>,
    pub reading_stats: ReadingStats,
    pub timeline: Vec<TimelinePoint>,
    pub ratings: Vec<RatingBucket>,
    pub genres: Vec<GenreShare>,
    pub series: Vec<BookGroup>,
    pub cycles: Vec<BookGroup>,
    /// Read shelf, newest first
    pub read_books: Vec<BookCard>,
    pub to_read_books: Vec<BookCard>,
    /// Genre filter options
    pub available_genres: Vec<String>,
}

/// Inputs that come from outside the shelves
pub struct DashboardContext {
    pub owner: String,
    pub saved_at: DateTime<Utc>,
    pub year: i32,
    pub challenge_goal: u32,
    pub progress: Option<ProgressSnapshot>,
    pub top_authors: Vec<AuthorCount>,
}

impl Dashboard {
    pub fn assemble(shelves: &Shelves, context: DashboardContext) -> Self {
        let read = &shelves.read;

        let mut read_collection = BookCollection::new(read.clone());
        read_collection.sort_by(SortOrder::default());

        let current_book = shelves.reading.first().map(|book| CurrentBook {
            card: BookCard::from_book(book),
            progress: context.progress.filter(ProgressSnapshot::has_progress),
        });

        Self {
            badges: ProfileBadges::new(&context.owner, context.year),
            owner: context.owner,
            last_updated: context.saved_at.to_rfc3339(),
            updated_ago: format_age(context.saved_at),
            year: context.year,
            hero: stats::hero_stats(read, context.year, context.challenge_goal),
            current_book,
            last_read: read_collection.last_read_book().map(BookCard::from_book),
            top_authors: context.top_authors,
            records: stats::book_records(read),
            reading_stats: stats::reading_stats(read),
            timeline: stats::timeline(read),
            ratings: stats::rating_histogram(read),
            genres: stats::top_genres(read, stats::TOP_GENRES),
            series: stats::book_groups(read, GroupKind::Series),
            cycles: stats::book_groups(read, GroupKind::Cycle),
            read_books: read_collection.books().iter().map(BookCard::from_book).collect(),
            to_read_books: shelves.to_read.iter().map(BookCard::from_book).collect(),
            available_genres: read_collection.genres(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::Shelf;

    fn context(progress: Option<ProgressSnapshot>) -> DashboardContext {
        DashboardContext {
            owner: "reader".to_string(),
            saved_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            year: 2024,
            challenge_goal: 10,
            progress,
            top_authors: Vec::new(),
        }
    }

    fn shelves() -> Shelves {
        let mut old = BookRecord::new("Old", Shelf::Read);
        old.date_read = Some("2023-11-02".to_string());
        old.pages = Some(200);
        let mut new = BookRecord::new("New", Shelf::Read);
        new.date_read = Some("2024-02-10".to_string());
        new.pages = Some(400);
        new.genres = vec!["Фантастика".to_string()];

        Shelves {
            read: vec![old, new],
            reading: vec![BookRecord::new("Now", Shelf::CurrentlyReading)],
            to_read: vec![BookRecord::new("Later", Shelf::ToRead)],
        }
    }

    #[test]
    fn test_assemble() {
        let progress = ProgressSnapshot::from_pages(50, 200, "Now", "Someone");
        let dashboard = Dashboard::assemble(&shelves(), context(Some(progress)));

        assert_eq!(dashboard.hero.total_books, 2);
        assert_eq!(dashboard.hero.books_this_year, 1);
        assert_eq!(dashboard.hero.challenge_percent, 10);
        assert_eq!(dashboard.read_books[0].title, "New");
        assert_eq!(dashboard.last_read.as_ref().unwrap().title, "New");
        assert_eq!(dashboard.to_read_books.len(), 1);
        assert_eq!(dashboard.available_genres, vec!["Фантастика"]);

        let current = dashboard.current_book.unwrap();
        assert_eq!(current.card.title, "Now");
        assert_eq!(current.progress.unwrap().percentage, 25);
    }

    #[test]
    fn test_zero_progress_is_hidden() {
        let progress = ProgressSnapshot::from_pages(0, 200, "Now", "Someone");
        let dashboard = Dashboard::assemble(&shelves(), context(Some(progress)));
        assert!(dashboard.current_book.unwrap().progress.is_none());
    }

    #[test]
    fn test_serializes_to_json() {
        let dashboard = Dashboard::assemble(&shelves(), context(None));
        let value = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(value["owner"], "reader");
        assert_eq!(value["hero"]["total_pages"], 600);
        assert!(value["current_book"]["progress"].is_null());
    }

    #[test]
    fn test_badges_and_age() {
        let dashboard = Dashboard::assemble(&shelves(), context(None));
        assert_eq!(
            dashboard.badges.challenge_link,
            "https://www.livelib.ru/challenge/2024/reader/reader"
        );
        assert_eq!(
            dashboard.badges.challenge_image,
            "https://u.livelib.ru/reader/reader/challenge2024.png"
        );
        assert_eq!(dashboard.badges.profile_link, "https://www.livelib.ru/reader/reader");
        assert_eq!(
            dashboard.badges.profile_image,
            "https://u.livelib.ru/reader/reader/informer-i3.png"
        );
        assert!(dashboard.updated_ago.ends_with("d ago"));
    }
}
