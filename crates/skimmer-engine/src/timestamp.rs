//! Lenient parsing of the feed's rendered timestamps.
//!
//! The machine-readable `datetime` attribute is handled by the extractor;
//! this module covers the rendered text, whose shape is observationally
//! unstable. A date-looking fragment is located first, then tried against an
//! ordered list of formats. Month-day text without a year implies the
//! current year; bare times imply today. Text that defeats every format is
//! kept verbatim — a record is never failed over its date.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;
use skimmer_core::PublishedAt;

static DATE_PART_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s+\d{1,2}(?:,\s+\d{4})?|\d{4}/\d{2}/\d{2}|\d{2}/\d{2}/\d{4}|\d{1,2}:\d{2}\s*(?:AM|PM)?",
    )
    .expect("valid date-part regex")
});

/// Parses rendered timestamp text into a [`PublishedAt`].
#[must_use]
pub fn parse_feed_timestamp(raw: &str) -> PublishedAt {
    parse_feed_timestamp_at(raw, Utc::now().date_naive())
}

/// Same as [`parse_feed_timestamp`] with an injected "today", so that
/// year-less and time-only formats are testable.
#[must_use]
pub fn parse_feed_timestamp_at(raw: &str, today: NaiveDate) -> PublishedAt {
    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return PublishedAt::Raw(String::new());
    }

    let Some(found) = DATE_PART_RE.find(cleaned) else {
        return PublishedAt::Raw(cleaned.to_owned());
    };
    let date_part = found.as_str().trim();

    if let Some(dt) = attempt_formats(date_part, today) {
        return PublishedAt::Parsed(dt);
    }

    // A fragment looked date-like but matched no format; keep the fragment.
    PublishedAt::Raw(date_part.to_owned())
}

fn attempt_formats(date_part: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    // Month day, year — "May 20, 2023".
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%b %d, %Y") {
        return d.and_hms_opt(0, 0, 0);
    }

    // Month day ("May 20") implies the current year.
    let with_year = format!("{date_part} {}", today.year());
    if let Ok(d) = NaiveDate::parse_from_str(&with_year, "%b %d %Y") {
        return d.and_hms_opt(0, 0, 0);
    }

    // Slash-delimited dates.
    for fmt in ["%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // Bare times imply today.
    for fmt in ["%I:%M %p", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(date_part, fmt) {
            return Some(today.and_time(t));
        }
    }

    None
}

#[cfg(test)]
#[path = "timestamp_test.rs"]
mod tests;
