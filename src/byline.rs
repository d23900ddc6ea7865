//! Display helpers for post bylines.

use chrono::{DateTime, Utc};

/// Join author names for display: `A`, `A and B`, `A, B and C`.
///
/// When `required` names an author missing from the list, that author is
/// appended first.
#[must_use]
pub fn format_authors(authors: &[String], required: Option<&str>) -> String {
    let mut names: Vec<&str> = authors.iter().map(String::as_str).collect();
    if let Some(required) = required {
        if !names.contains(&required) {
            names.push(required);
        }
    }
    match names.split_last() {
        None => String::new(),
        Some((last, [])) => (*last).to_string(),
        Some((last, rest)) => format!("{} and {last}", rest.join(", ")),
    }
}

/// Long-form date, e.g. `January 05, 2018`.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}
