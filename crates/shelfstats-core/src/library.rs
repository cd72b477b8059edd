//! Shelf categorization and the browsable book collection.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use tracing::debug;

use crate::models::{BookRecord, Shelf};
use crate::overrides;
use crate::utils::{cmp_ignore_case, contains_ignore_case};

/// Books shown per page of the book list
pub const BOOKS_PER_PAGE: usize = 12;

/// The three recognized shelves, each in collection order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shelves {
    pub read: Vec<BookRecord>,
    pub reading: Vec<BookRecord>,
    pub to_read: Vec<BookRecord>,
}

impl Shelves {
    pub fn total(&self) -> usize {
        self.read.len() + self.reading.len() + self.to_read.len()
    }
}

/// Partition `all_books` by their exclusive shelf.
///
/// Records on an unrecognized shelf are dropped. `custom_dates` replaces a
/// read date that is missing or unparseable.
pub fn categorize(all_books: &[BookRecord], custom_dates: &HashMap<String, String>) -> Shelves {
    let mut shelves = Shelves::default();
    let mut dropped = 0;

    for book in all_books {
        let mut book = book.clone();
        overrides::apply_date(custom_dates, &mut book);

        let target = match book.shelf {
            Shelf::Read => &mut shelves.read,
            Shelf::CurrentlyReading => &mut shelves.reading,
            Shelf::ToRead => &mut shelves.to_read,
            Shelf::Other(ref shelf) => {
                debug!(title = %book.title, shelf = %shelf, "Dropping book on unrecognized shelf");
                dropped += 1;
                continue;
            }
        };
        target.push(book);
    }

    debug!(
        read = shelves.read.len(),
        reading = shelves.reading.len(),
        to_read = shelves.to_read.len(),
        dropped,
        "Categorized books"
    );
    shelves
}

// Sorting options for the book list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Date,
    Rating,
    Title,
    Pages,
}

impl SortColumn {
    fn as_str(&self) -> &'static str {
        match self {
            SortColumn::Date => "date",
            SortColumn::Rating => "rating",
            SortColumn::Title => "title",
            SortColumn::Pages => "pages",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub ascending: bool,
}

impl Default for SortOrder {
    /// Newest reads first
    fn default() -> Self {
        Self {
            column: SortColumn::Date,
            ascending: false,
        }
    }
}

impl SortOrder {
    pub fn new(column: SortColumn, ascending: bool) -> Self {
        Self { column, ascending }
    }

    /// Compare two books. Equal keys compare `Equal`, so a stable sort keeps
    /// collection order for ties in either direction.
    pub fn compare(&self, a: &BookRecord, b: &BookRecord) -> Ordering {
        let cmp = match self.column {
            SortColumn::Date => a.read_date().cmp(&b.read_date()),
            SortColumn::Rating => a.rating_value().total_cmp(&b.rating_value()),
            SortColumn::Title => cmp_ignore_case(&a.title, &b.title),
            SortColumn::Pages => a.page_count().cmp(&b.page_count()),
        };

        if self.ascending {
            cmp
        } else {
            cmp.reverse()
        }
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    /// Parses "date-desc", "title-asc" and so on
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, direction) = s.trim().split_once('-').unwrap_or((s.trim(), "asc"));
        let column = match column {
            "date" => SortColumn::Date,
            "rating" => SortColumn::Rating,
            "title" => SortColumn::Title,
            "pages" => SortColumn::Pages,
            other => bail!("Unknown sort column '{}'", other),
        };
        let ascending = match direction {
            "asc" => true,
            "desc" => false,
            other => bail!("Unknown sort direction '{}'", other),
        };
        Ok(Self { column, ascending })
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "asc" } else { "desc" };
        write!(f, "{}-{}", self.column.as_str(), direction)
    }
}

/// Plain-text list formats for copying a shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyFormat {
    Simple,
    WithRatings,
    WithDates,
}

impl CopyFormat {
    pub fn line(&self, book: &BookRecord) -> String {
        let authors = book
            .authors
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("Unknown author");
        match self {
            CopyFormat::Simple => format!("{} - {}", book.title, authors),
            CopyFormat::WithRatings => {
                let rating = book
                    .rating
                    .filter(|r| *r > 0.0)
                    .map(format_rating)
                    .unwrap_or_else(|| "no rating".to_string());
                format!("{} - {} ({})", book.title, authors, rating)
            }
            CopyFormat::WithDates => {
                let date = book.date_read.as_deref().unwrap_or("no date");
                format!("{} - {} ({})", book.title, authors, date)
            }
        }
    }
}

impl FromStr for CopyFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(CopyFormat::Simple),
            "ratings" => Ok(CopyFormat::WithRatings),
            "dates" => Ok(CopyFormat::WithDates),
            other => bail!("Unknown list format '{}'", other),
        }
    }
}

/// "4" for whole ratings, "4.5" otherwise
pub fn format_rating(rating: f32) -> String {
    if rating.fract() == 0.0 {
        format!("{}", rating as u32)
    } else {
        format!("{:.1}", rating)
    }
}

/// One shelf's books with list state: filter, order and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct BookCollection {
    books: Vec<BookRecord>,
    pub books_per_page: usize,
    /// Zero-based; pages 0..=current_page are visible
    pub current_page: usize,
}

impl BookCollection {
    pub fn new(books: Vec<BookRecord>) -> Self {
        Self {
            books,
            books_per_page: BOOKS_PER_PAGE,
            current_page: 0,
        }
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn find(&self, title: &str) -> Option<&BookRecord> {
        self.books
            .iter()
            .find(|b| b.title == title)
            .or_else(|| {
                let query = title.to_lowercase();
                self.books.iter().find(|b| contains_ignore_case(&b.title, &query))
            })
    }

    /// Stable sort in place; pagination restarts
    pub fn sort_by(&mut self, order: SortOrder) {
        self.books.sort_by(|a, b| order.compare(a, b));
        self.current_page = 0;
    }

    /// A new collection holding only books tagged with `genre`
    pub fn filter_genre(&self, genre: &str) -> Self {
        let books = self
            .books
            .iter()
            .filter(|b| b.genres.iter().any(|g| g.trim() == genre.trim()))
            .cloned()
            .collect();
        Self {
            books,
            books_per_page: self.books_per_page,
            current_page: 0,
        }
    }

    /// Every genre in the collection, alphabetically
    pub fn genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = Vec::new();
        for book in &self.books {
            for genre in book.display_genres() {
                if !genres.iter().any(|g| g == genre) {
                    genres.push(genre.to_string());
                }
            }
        }
        genres.sort_by(|a, b| cmp_ignore_case(a, b));
        genres
    }

    /// Books on pages up to and including the current one
    pub fn visible(&self) -> &[BookRecord] {
        let end = self
            .books_per_page
            .max(1)
            .saturating_mul(self.current_page + 1)
            .min(self.books.len());
        &self.books[..end]
    }

    /// The books of a single page
    pub fn page(&self, page: usize) -> &[BookRecord] {
        let per_page = self.books_per_page.max(1);
        let start = page.saturating_mul(per_page).min(self.books.len());
        let end = start.saturating_add(per_page).min(self.books.len());
        &self.books[start..end]
    }

    pub fn page_count(&self) -> usize {
        self.books.len().div_ceil(self.books_per_page.max(1))
    }

    pub fn has_more(&self) -> bool {
        self.visible().len() < self.books.len()
    }

    /// Reveal the next page. Returns false when everything is already shown.
    pub fn load_more(&mut self) -> bool {
        if !self.has_more() {
            return false;
        }
        self.current_page += 1;
        true
    }

    /// The book with the latest valid read date; earliest in order on ties
    pub fn last_read_book(&self) -> Option<&BookRecord> {
        self.books
            .iter()
            .filter_map(|b| b.read_date().map(|d| (d, b)))
            .fold(None, |best: Option<(chrono::NaiveDate, &BookRecord)>, (date, book)| match best {
                Some((best_date, _)) if best_date >= date => best,
                _ => Some((date, book)),
            })
            .map(|(_, book)| book)
    }

    pub fn copy_list(&self, format: CopyFormat) -> String {
        self.books
            .iter()
            .map(|b| format.line(b))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, shelf: &str) -> BookRecord {
        BookRecord::new(title, Shelf::from(shelf))
    }

    fn dated(title: &str, date: &str) -> BookRecord {
        let mut b = book(title, "read");
        b.date_read = Some(date.to_string());
        b
    }

    fn titles(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn test_categorize_five_records() {
        let books = vec![
            book("A", "read"),
            book("B", "read"),
            book("C", "to-read"),
            book("D", "currently-reading"),
            book("E", "unknown"),
        ];
        let shelves = categorize(&books, &HashMap::new());

        assert_eq!(titles(&shelves.read), vec!["A", "B"]);
        assert_eq!(titles(&shelves.to_read), vec!["C"]);
        assert_eq!(titles(&shelves.reading), vec!["D"]);
        assert_eq!(shelves.total(), 4);
    }

    #[test]
    fn test_categorize_partition_is_disjoint_and_complete() {
        let shelves_in = ["read", "to-read", "currently-reading", "abandoned", "read", ""];
        let books: Vec<BookRecord> = (0..30)
            .map(|i| book(&format!("Book {}", i), shelves_in[i % shelves_in.len()]))
            .collect();
        let shelves = categorize(&books, &HashMap::new());

        let mut seen: Vec<&str> = Vec::new();
        for group in [&shelves.read, &shelves.reading, &shelves.to_read] {
            for b in group.iter() {
                assert!(!seen.contains(&b.title.as_str()), "duplicate {}", b.title);
                seen.push(&b.title);
            }
        }
        let expected: Vec<&str> = books
            .iter()
            .filter(|b| b.shelf.is_recognized())
            .map(|b| b.title.as_str())
            .collect();
        assert_eq!(seen.len(), expected.len());
        assert!(expected.iter().all(|t| seen.contains(t)));
    }

    #[test]
    fn test_categorize_applies_custom_dates() {
        let dates = HashMap::from([("Foo".to_string(), "2023-05-01".to_string())]);
        let books = vec![book("Foo", "read"), dated("Bar", "2022-01-01")];
        let shelves = categorize(&books, &dates);
        assert_eq!(shelves.read[0].date_read.as_deref(), Some("2023-05-01"));
        assert_eq!(shelves.read[1].date_read.as_deref(), Some("2022-01-01"));
        // Input is not touched
        assert!(books[0].date_read.is_none());
    }

    #[test]
    fn test_sort_order_parse_and_display() {
        let order: SortOrder = "rating-desc".parse().unwrap();
        assert_eq!(order, SortOrder::new(SortColumn::Rating, false));
        assert_eq!(order.to_string(), "rating-desc");
        assert_eq!("title".parse::<SortOrder>().unwrap(), SortOrder::new(SortColumn::Title, true));
        assert!("color-asc".parse::<SortOrder>().is_err());
        assert!("date-sideways".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default().to_string(), "date-desc");
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut a = book("A", "read");
        a.rating = Some(4.0);
        let mut b = book("B", "read");
        b.rating = Some(5.0);
        let mut c = book("C", "read");
        c.rating = Some(4.0);
        let mut d = book("D", "read");
        d.rating = Some(5.0);

        let mut collection = BookCollection::new(vec![a, b, c, d]);
        collection.sort_by("rating-desc".parse().unwrap());
        assert_eq!(titles(collection.books()), vec!["B", "D", "A", "C"]);

        collection.sort_by("rating-asc".parse().unwrap());
        assert_eq!(titles(collection.books()), vec!["A", "C", "B", "D"]);
    }

    #[test]
    fn test_sort_by_date_and_title() {
        let mut collection = BookCollection::new(vec![
            dated("b", "2021-03-01"),
            dated("A", "2023-01-10"),
            book("c", "read"),
        ]);
        collection.sort_by(SortOrder::default());
        assert_eq!(titles(collection.books()), vec!["A", "b", "c"]);

        collection.sort_by("title-asc".parse().unwrap());
        assert_eq!(titles(collection.books()), vec!["A", "b", "c"]);
    }

    #[test]
    fn test_pagination() {
        let books: Vec<BookRecord> = (0..30).map(|i| book(&format!("{}", i), "read")).collect();
        let mut collection = BookCollection::new(books);

        assert_eq!(collection.visible().len(), 12);
        assert_eq!(collection.page_count(), 3);
        assert_eq!(collection.page(2).len(), 6);
        assert!(collection.page(5).is_empty());

        assert!(collection.load_more());
        assert_eq!(collection.visible().len(), 24);
        assert!(collection.load_more());
        assert_eq!(collection.visible().len(), 30);
        assert!(!collection.has_more());
        assert!(!collection.load_more());
    }

    #[test]
    fn test_genre_filter() {
        let mut a = book("A", "read");
        a.genres = vec!["Фантастика".to_string(), "Классика".to_string()];
        let mut b = book("B", "read");
        b.genres = vec!["Детектив".to_string()];
        let collection = BookCollection::new(vec![a, b]);

        let filtered = collection.filter_genre("Фантастика");
        assert_eq!(titles(filtered.books()), vec!["A"]);
        assert_eq!(collection.genres(), vec!["Детектив", "Классика", "Фантастика"]);
    }

    #[test]
    fn test_last_read_book() {
        let collection = BookCollection::new(vec![
            dated("Old", "2020-01-01"),
            dated("New", "2023-06-01"),
            dated("Also new", "2023-06-01"),
            book("Undated", "read"),
        ]);
        assert_eq!(collection.last_read_book().unwrap().title, "New");
        assert!(BookCollection::new(vec![book("Undated", "read")]).last_read_book().is_none());
    }

    #[test]
    fn test_copy_list_formats() {
        let mut a = dated("Dune", "2023-01-01");
        a.authors = Some("Frank Herbert".to_string());
        a.rating = Some(4.5);
        let b = book("Anon", "read");
        let collection = BookCollection::new(vec![a, b]);

        assert_eq!(
            collection.copy_list(CopyFormat::Simple),
            "Dune - Frank Herbert\nAnon - Unknown author"
        );
        assert_eq!(
            collection.copy_list(CopyFormat::WithRatings),
            "Dune - Frank Herbert (4.5)\nAnon - Unknown author (no rating)"
        );
        assert_eq!(
            collection.copy_list(CopyFormat::WithDates),
            "Dune - Frank Herbert (2023-01-01)\nAnon - Unknown author (no date)"
        );
    }

    #[test]
    fn test_find_book() {
        let collection = BookCollection::new(vec![book("Солярис", "read"), book("Dune", "read")]);
        assert_eq!(collection.find("Dune").unwrap().title, "Dune");
        assert_eq!(collection.find("соляр").unwrap().title, "Солярис");
        assert!(collection.find("missing").is_none());
    }
}
