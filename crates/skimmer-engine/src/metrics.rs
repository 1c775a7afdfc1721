//! Engagement-count normalization.
//!
//! The feed renders counts in compacted display form (`"1,234"`, `"10.5K"`,
//! `"1.2M"`). Counts are kept as display strings: commas are stripped and
//! the magnitude suffix is uppercased, but `"10.5K"` stays `"10.5K"` because
//! the exact value is not recoverable.

use std::sync::LazyLock;

use regex::Regex;

static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)\s*([KMBkmb]?)").expect("valid count regex"));

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digit regex"));

static REPLIES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,.]+[KMBkmb]?)\s*(?:repl(?:y|ies)|replied)").expect("valid replies regex")
});

static REPOSTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,.]+[KMBkmb]?)\s*(?:reposts?|retweets?)").expect("valid reposts regex")
});

static LIKES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,.]+[KMBkmb]?)\s*(?:likes?|liked)").expect("valid likes regex")
});

static VIEWS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,.]+[KMBkmb]?)\s*views?").expect("valid views regex")
});

static FOLLOWERS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,.]+[KMBkmb]?)\s*followers?").expect("valid followers regex")
});

/// Normalizes a rendered count to `<number><K|M|B|''>`.
///
/// `"1,234"` → `"1234"`, `"10.5K"` → `"10.5K"`, `"1.2m"` → `"1.2M"`.
/// Text with no leading number falls back to the first bare digit run;
/// text with no digits at all yields `None`.
#[must_use]
pub fn normalize_count(text: &str) -> Option<String> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = COUNT_RE.captures(&cleaned) {
        let number = caps.get(1).map_or("", |m| m.as_str());
        // The number group can match a bare "." — require at least one digit.
        if number.bytes().any(|b| b.is_ascii_digit()) {
            let suffix = caps.get(2).map_or("", |m| m.as_str()).to_uppercase();
            return Some(format!("{number}{suffix}"));
        }
    }

    DIGITS_RE
        .find(&cleaned)
        .map(|m| m.as_str().to_owned())
}

fn labeled_count(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| normalize_count(m.as_str()))
}

/// Reply count from an accessible label like `"1,234 replies"`.
#[must_use]
pub fn replies_from_label(text: &str) -> Option<String> {
    labeled_count(&REPLIES_RE, text)
}

/// Repost count from a label; the host uses both "reposts" and "retweets".
#[must_use]
pub fn reposts_from_label(text: &str) -> Option<String> {
    labeled_count(&REPOSTS_RE, text)
}

#[must_use]
pub fn likes_from_label(text: &str) -> Option<String> {
    labeled_count(&LIKES_RE, text)
}

#[must_use]
pub fn views_from_label(text: &str) -> Option<String> {
    labeled_count(&VIEWS_RE, text)
}

/// Follower count from profile text like `"229.8M Followers"`.
#[must_use]
pub fn followers_from_label(text: &str) -> Option<String> {
    labeled_count(&FOLLOWERS_RE, text)
}

#[cfg(test)]
#[path = "metrics_test.rs"]
mod tests;
