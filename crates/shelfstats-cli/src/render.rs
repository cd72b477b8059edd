//! Plain-text rendering of dashboard sections.

use std::fmt::Write;

use shelfstats_core::dashboard::{BookCard, CurrentBook, Dashboard};
use shelfstats_core::library::format_rating;
use shelfstats_core::models::ProgressSnapshot;
use shelfstats_core::stats::{self, BookGroup, GenreShare, RatingBucket, TimelinePoint};
use shelfstats_core::utils::{book_declension, format_thousands, truncate_string};

/// Widest bar drawn in the text charts
const BAR_WIDTH: usize = 30;
const TITLE_WIDTH: usize = 48;

pub fn dashboard(d: &Dashboard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}'s library  (updated {})", d.owner, d.updated_ago);
    let _ = writeln!(out, "{}", d.badges.profile_link);
    out.push('\n');
    out.push_str(&hero(d));
    out.push('\n');

    out.push_str("Currently reading\n");
    match &d.current_book {
        Some(current) => out.push_str(&current_book(current)),
        None => out.push_str("  Nothing on the shelf right now\n"),
    }
    out.push('\n');

    out.push_str("Last read\n");
    match &d.last_read {
        Some(card) => {
            let _ = writeln!(
                out,
                "  {} - {} ({})",
                card.title,
                card.author,
                card.read_date.as_deref().unwrap_or("no date")
            );
        }
        None => out.push_str("  No data\n"),
    }
    out.push('\n');

    out.push_str("Top authors\n");
    if d.top_authors.is_empty() {
        out.push_str("  No data\n");
    }
    for author in &d.top_authors {
        let _ = writeln!(out, "  {}. {} ({})", author.rank, author.author, author.count_label);
    }
    out.push('\n');

    out.push_str("Records\n");
    match &d.records {
        Some(records) => {
            let _ = writeln!(out, "  Longest:  {}", record_line(&records.longest.title, records.longest.pages));
            let _ = writeln!(out, "  Shortest: {}", record_line(&records.shortest.title, records.shortest.pages));
        }
        None => out.push_str("  No data\n"),
    }
    out.push('\n');

    let s = &d.reading_stats;
    out.push_str("Reading stats\n");
    let _ = writeln!(out, "  Books:            {}", format_thousands(s.total_books as u64));
    let _ = writeln!(out, "  Pages:            {}", format_thousands(s.total_pages));
    let _ = writeln!(out, "  Books per month:  {:.1}", s.avg_books_per_month);
    let _ = writeln!(out, "  Pages per month:  {}", format_thousands(s.avg_pages_per_month));
    let _ = writeln!(out, "  Series read:      {}", s.series_read);
    out.push('\n');

    out.push_str(&charts(&d.timeline, &d.ratings, &d.genres));
    out
}

pub fn hero(d: &Dashboard) -> String {
    let h = &d.hero;
    let mut out = String::new();
    let _ = writeln!(out, "  Books read:  {}", format_thousands(h.total_books as u64));
    let _ = writeln!(out, "  Pages read:  {}", format_thousands(h.total_pages));
    let _ = writeln!(
        out,
        "  {} challenge: {} of {} [{}] {}%",
        d.year,
        h.books_this_year,
        h.challenge_goal,
        bar(h.challenge_percent as usize, 100, 20),
        h.challenge_percent
    );
    let _ = writeln!(out, "  {}", d.badges.challenge_link);
    out
}

fn record_line(title: &str, pages: Option<u32>) -> String {
    match pages {
        Some(p) => format!("{} ({} pages)", title, p),
        None => format!("{} (pages unknown)", title),
    }
}

pub fn current_book(current: &CurrentBook) -> String {
    let card = &current.card;
    let mut out = String::new();
    let _ = writeln!(out, "  {} - {}", card.title, card.author);
    match card.pages {
        Some(p) => {
            let _ = writeln!(out, "  {} pages", p);
        }
        None => out.push_str("  Pages unknown\n"),
    }
    if let Some(cycle) = &card.cycle {
        let _ = writeln!(out, "  Cycle: {}", cycle);
    }
    if let Some(progress) = &current.progress {
        out.push_str(&progress_line(progress));
    }
    out
}

pub fn progress_line(progress: &ProgressSnapshot) -> String {
    let mut out = format!(
        "  Progress: [{}] {}%",
        bar(progress.percentage as usize, 100, 20),
        progress.percentage
    );
    if let Some(pages) = progress.pages_display() {
        let _ = write!(out, "  {}", pages);
    }
    out.push('\n');
    out
}

pub fn book_line(card: &BookCard) -> String {
    let rating = card
        .rating
        .map(|r| format!("{} {}", stats::stars_for(r), format_rating(r)))
        .unwrap_or_default();
    let date = card.read_date.as_deref().unwrap_or("");
    format!(
        "{:<width$}  {:<24}  {:<12}  {}",
        truncate_string(&card.title, TITLE_WIDTH),
        truncate_string(&card.author, 24),
        date,
        rating,
        width = TITLE_WIDTH
    )
    .trim_end()
    .to_string()
}

pub fn book_detail(card: &BookCard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", card.title);
    let _ = writeln!(out, "  Author:  {}", card.author);
    if let Some(pages) = card.pages {
        let _ = writeln!(out, "  Pages:   {}", pages);
    }
    if let Some(rating) = card.rating {
        let _ = writeln!(out, "  Rating:  {} ({})", stats::stars_for(rating), format_rating(rating));
    }
    if let Some(date) = &card.read_date {
        let _ = writeln!(out, "  Read:    {}", date);
    }
    if !card.genres.is_empty() {
        let _ = writeln!(out, "  Genres:  {}", card.genres.join(", "));
    }
    if let Some(series) = &card.series {
        let _ = writeln!(out, "  Series:  {}", series);
    }
    if let Some(cycle) = &card.cycle {
        let _ = writeln!(out, "  Cycle:   {}", cycle);
    }
    if let Some(link) = &card.link {
        let _ = writeln!(out, "  Link:    {}", link);
    }
    out.push('\n');
    match &card.annotation {
        Some(text) => {
            let _ = writeln!(out, "{}", text.trim());
        }
        None => out.push_str("No synopsis available\n"),
    }
    out
}

pub fn groups(groups: &[BookGroup]) -> String {
    if groups.is_empty() {
        return "No data to display\n".to_string();
    }
    let mut out = String::new();
    for group in groups {
        let marker = if group.large { " *" } else { "" };
        let _ = writeln!(
            out,
            "{}{} - {} ({})",
            group.name,
            marker,
            group.author,
            book_declension(group.books.len())
        );
        for book in &group.books {
            let _ = match &book.label {
                Some(label) => writeln!(out, "  {:<16} {}", label, book.title),
                None => writeln!(out, "  {}", book.title),
            };
        }
    }
    out
}

pub fn charts(timeline: &[TimelinePoint], ratings: &[RatingBucket], genres: &[GenreShare]) -> String {
    let mut out = String::new();
    out.push_str("Books per month\n");
    out.push_str(&timeline_chart(timeline));
    out.push('\n');
    out.push_str("Ratings\n");
    out.push_str(&rating_chart(ratings));
    out.push('\n');
    out.push_str("Top genres\n");
    out.push_str(&genre_chart(genres));
    out
}

fn timeline_chart(points: &[TimelinePoint]) -> String {
    let max = points.iter().map(|p| p.count).max().unwrap_or(0);
    let mut out = String::new();
    for point in points {
        let _ = writeln!(out, "  {:<9} {} {}", point.label, bar(point.count, max, BAR_WIDTH), point.count);
    }
    if points.is_empty() {
        out.push_str("  No data\n");
    }
    out
}

fn rating_chart(buckets: &[RatingBucket]) -> String {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    let mut out = String::new();
    for bucket in buckets {
        let _ = writeln!(out, "  {} {} {}", bucket.stars, bar(bucket.count, max, BAR_WIDTH), bucket.count);
    }
    if buckets.is_empty() {
        out.push_str("  No data\n");
    }
    out
}

fn genre_chart(genres: &[GenreShare]) -> String {
    let mut out = String::new();
    for genre in genres {
        let _ = writeln!(
            out,
            "  {:<24} {} {} ({}%)",
            truncate_string(&genre.genre, 24),
            bar(genre.percent as usize, 100, BAR_WIDTH),
            genre.count,
            genre.percent
        );
    }
    if genres.is_empty() {
        out.push_str("  No data\n");
    }
    out
}

/// A bar of `width` cells filled in proportion to `value / max`
fn bar(value: usize, max: usize, width: usize) -> String {
    let filled = if max == 0 {
        0
    } else {
        (value.min(max) * width + max / 2) / max
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
