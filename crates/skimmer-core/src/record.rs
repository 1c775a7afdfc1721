//! The normalized record model shared by the engine and the sinks.
//!
//! Every engagement field is a display string (`"1.2M"`, `"500"`) rather than
//! a number: the feed renders compacted counts and the original values are
//! not recoverable, so records preserve what was shown. Absent fields carry
//! [`NOT_AVAILABLE`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Placeholder for engagement fields the feed did not render.
pub const NOT_AVAILABLE: &str = "N/A";

/// When a post was published, as well as the feed let us know.
///
/// The feed's machine-readable timestamp attribute is preferred; failing
/// that, the rendered text is parsed through a list of known formats. Text
/// that matches no format is kept verbatim rather than failing the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PublishedAt {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl PublishedAt {
    /// Calendar date for date-range policy, when one is known.
    ///
    /// Raw timestamps have no usable date and are never treated as
    /// out-of-range by the engine.
    #[must_use]
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            PublishedAt::Parsed(dt) => Some(dt.date()),
            PublishedAt::Raw(_) => None,
        }
    }
}

impl From<String> for PublishedAt {
    fn from(s: String) -> Self {
        // Re-reading our own output: parsed values were written as ISO-8601,
        // possibly with an offset if the file predates this writer.
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&s) {
            return PublishedAt::Parsed(dt.naive_utc());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f") {
            return PublishedAt::Parsed(dt);
        }
        PublishedAt::Raw(s)
    }
}

impl From<PublishedAt> for String {
    fn from(p: PublishedAt) -> Self {
        match p {
            PublishedAt::Parsed(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            PublishedAt::Raw(s) => s,
        }
    }
}

impl std::fmt::Display for PublishedAt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublishedAt::Parsed(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            PublishedAt::Raw(s) => f.write_str(s),
        }
    }
}

/// One normalized post extracted from the feed.
///
/// `id` is the feed-assigned stable identifier: two records with equal `id`
/// are the same logical post, and the engine never emits duplicates within a
/// run or across runs against the same sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub id: String,

    /// Best-known author label: the handle when one was extracted, falling
    /// back to the display name, then [`NOT_AVAILABLE`].
    pub author: String,

    /// Bare account handle, when the author self-link resolved.
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Post body text; a placeholder when the text node was missing.
    pub body: String,

    #[serde(rename = "date")]
    pub published_at: PublishedAt,

    #[serde(default)]
    pub url: Option<String>,

    pub views: String,
    pub replies: String,
    pub reposts: String,
    pub likes: String,

    pub profile_followers: String,

    /// Media CDN URLs in render order. Duplicates are allowed.
    #[serde(default)]
    pub images: Vec<String>,
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
