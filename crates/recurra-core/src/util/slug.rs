//! Slug generation for series and occurrence identifiers.
//!
//! ## Summary
//! Slugs are lowercase, alphanumeric with hyphens, and stable once assigned.
//! Occurrence slugs are derived from the owning series slug and the local
//! calendar day of the occurrence, so one day maps to one slug.

use chrono::NaiveDate;

/// Generate a URL-safe slug from a name.
///
/// Converts to lowercase, replaces spaces and special characters with hyphens,
/// collapses multiple hyphens, and trims edge hyphens.
///
/// Examples:
/// - "Weekly Standup" -> "weekly-standup"
/// - "Board Games @ Joe's" -> "board-games-joe-s"
#[must_use]
pub fn generate_slug(name: &str) -> String {
    let slug = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    // A bare UUID would be indistinguishable from an event id
    if uuid::Uuid::parse_str(&slug).is_ok() {
        format!("ev-{slug}")
    } else {
        slug
    }
}

/// ## Summary
/// Builds the slug of the occurrence of `series_slug` on the local day `day`.
///
/// The result has the form `<series-slug>-YYYYMMDD`.
#[must_use]
pub fn occurrence_slug(series_slug: &str, day: NaiveDate) -> String {
    generate_slug(&format!("{series_slug}-{}", day.format("%Y%m%d")))
}
