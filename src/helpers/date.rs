//! Date helper functions

use chrono::NaiveDate;

/// Format a date using a chrono format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "%B %-d, %Y") // -> "February 1, 2021"
/// ```
pub fn format_date(date: &NaiveDate, format: &str) -> String {
    date.format(format).to_string()
}

/// Format a date in ISO 8601 form (`2021-02-01`)
pub fn date_iso(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a date as an RFC 3339 timestamp at midnight UTC, for feeds
pub fn date_xml(date: &NaiveDate) -> String {
    format!("{}T00:00:00Z", date_iso(date))
}

/// Estimated reading time in minutes, never less than one
pub fn reading_time(markdown: &str) -> usize {
    const WORDS_PER_MINUTE: usize = 200;
    let words = markdown.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
