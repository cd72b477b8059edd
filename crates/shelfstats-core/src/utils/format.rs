use std::cmp::Ordering;

/// Russian month names as the reading site prints them, in calendar order
const RUSSIAN_MONTHS: [&str; 12] = [
    "Январь", "Февраль", "Март", "Апрель", "Май", "Июнь",
    "Июль", "Август", "Сентябрь", "Октябрь", "Ноябрь", "Декабрь",
];

/// Convert a site date like "Май 2023 г." to "2023-05-01".
///
/// Only strings carrying the "г." year marker are recognized. An unknown month
/// name falls back to January, matching how the site's own exports behave.
pub fn parse_russian_month_date(date: &str) -> Option<String> {
    if !date.contains("г.") {
        return None;
    }
    let cleaned = date.replace("г.", "");
    let mut parts = cleaned.split_whitespace();
    let month = parts.next()?;
    let year = parts.next()?;
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let month_num = RUSSIAN_MONTHS
        .iter()
        .position(|m| m.to_lowercase() == month.to_lowercase())
        .map(|i| i + 1)
        .unwrap_or(1);

    Some(format!("{}-{:02}-01", year, month_num))
}

/// "1 книга", "3 книги", "7 книг"
pub fn book_declension(count: usize) -> String {
    let mod10 = count % 10;
    let mod100 = count % 100;
    if mod10 == 1 && mod100 != 11 {
        format!("{} книга", count)
    } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
        format!("{} книги", count)
    } else {
        format!("{} книг", count)
    }
}

/// Group digits by thousands with a space, e.g. 12345 -> "12 345"
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Case-insensitive ordering without allocating per comparison
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// `query` must already be lowercase
pub fn contains_ignore_case(haystack: &str, query: &str) -> bool {
    haystack.to_lowercase().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_russian_month_date() {
        assert_eq!(parse_russian_month_date("Май 2023 г.").as_deref(), Some("2023-05-01"));
        assert_eq!(parse_russian_month_date("Декабрь 2019 г.").as_deref(), Some("2019-12-01"));
        assert_eq!(parse_russian_month_date("Непонятно 2020 г.").as_deref(), Some("2020-01-01"));
        assert_eq!(parse_russian_month_date("2023-05-01"), None);
        assert_eq!(parse_russian_month_date(""), None);
    }

    #[test]
    fn test_book_declension() {
        assert_eq!(book_declension(1), "1 книга");
        assert_eq!(book_declension(21), "21 книга");
        assert_eq!(book_declension(11), "11 книг");
        assert_eq!(book_declension(3), "3 книги");
        assert_eq!(book_declension(13), "13 книг");
        assert_eq!(book_declension(5), "5 книг");
        assert_eq!(book_declension(0), "0 книг");
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1 000");
        assert_eq!(format_thousands(1234567), "1 234 567");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Война и мир", 8), "Война...");
    }

    #[test]
    fn test_cmp_ignore_case() {
        assert_eq!(cmp_ignore_case("abc", "ABC"), Ordering::Equal);
        assert_eq!(cmp_ignore_case("Apple", "banana"), Ordering::Less);
        assert_eq!(cmp_ignore_case("Яблоко", "арбуз"), Ordering::Greater);
    }
}
