//! Per-element record extraction.
//!
//! One feed element in, one [`Record`] out — or `None` when the element has
//! no resolvable post identifier (promoted slots, spacers, half-rendered
//! items), which is noise rather than an error. Every field beyond the id is
//! best-effort: a missing body becomes a placeholder, a missing metric
//! becomes `"N/A"`, an unparseable date is kept verbatim.

use skimmer_core::{PublishedAt, Query, QueryMode, Record, NOT_AVAILABLE};

use crate::driver::{DriverError, ElementHandle};
use crate::metrics;
use crate::timestamp::parse_feed_timestamp;

/// Selector for one post element in the feed.
pub const FEED_ITEM: &str = "article";

pub const STATUS_ANCHOR: &str = "a[href*='/status/']";
pub const TWEET_TEXT: &str = r#"[data-testid="tweetText"]"#;
pub const AUTHOR_LINK: &str = r#"a[role="link"][href^="/"]"#;
pub const NAME_BLOCK: &str = r#"[data-testid="User-Name"]"#;
pub const MEDIA_IMAGE: &str = r#"img[src^="https://pbs.twimg.com/"]"#;
pub const TIME_NODE: &str = "time";
pub const LABELED: &str = "[aria-label]";
pub const REPLY_CONTROL: &str = r#"[data-testid="reply"]"#;
pub const REPOST_CONTROL: &str = r#"[data-testid="retweet"]"#;
pub const LIKE_CONTROL: &str = r#"[data-testid="like"]"#;
pub const FREE_TEXT: &str = "span, div, a";

const SITE_ORIGIN: &str = "https://x.com";
const MISSING_BODY: &str = "Could not retrieve post text.";
const MISSING_DATE: &str = "Date not found";

/// Extracts a [`Record`] from one feed element.
///
/// Returns `Ok(None)` when the element lacks a status identifier, and in
/// account mode when the author is not the target handle (replies and quoted
/// content surfaced by thread rendering would otherwise corrupt an
/// "only this account" harvest).
///
/// `profile_followers` is left as `"N/A"`; the engine fills it from the
/// follower cache after the record is accepted.
///
/// # Errors
///
/// Propagates [`DriverError`] from element lookups; the engine treats that
/// as a skipped element, not a failed run.
pub async fn extract_record(
    element: &dyn ElementHandle,
    query: &Query,
) -> Result<Option<Record>, DriverError> {
    let Some((id, url)) = extract_identity(element).await? else {
        return Ok(None);
    };

    let username = extract_author_handle(element).await?;

    // Account-search guard: discard anything not authored by the target.
    if query.mode == QueryMode::Account {
        if let (Some(target), Some(author)) = (query.target_handle(), username.as_deref()) {
            if !author.eq_ignore_ascii_case(target) {
                tracing::debug!(id, author, target, "skipping foreign author in account search");
                return Ok(None);
            }
        }
    }

    let body = match element.query(TWEET_TEXT).await? {
        Some(node) => node.text().await?,
        None => MISSING_BODY.to_owned(),
    };

    let display_name = extract_display_name(element, username.as_deref()).await?;
    let images = extract_images(element).await?;
    let published_at = extract_timestamp(element).await?;
    let (views, replies, reposts, likes) = extract_metrics(element).await?;

    let author = username
        .clone()
        .or_else(|| display_name.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

    Ok(Some(Record {
        id,
        author,
        username,
        display_name,
        body,
        published_at,
        url: Some(url),
        views,
        replies,
        reposts,
        likes,
        profile_followers: NOT_AVAILABLE.to_owned(),
        images,
    }))
}

/// The id is the trailing path segment of the first status anchor.
async fn extract_identity(
    element: &dyn ElementHandle,
) -> Result<Option<(String, String)>, DriverError> {
    let Some(anchor) = element.query(STATUS_ANCHOR).await? else {
        return Ok(None);
    };
    let Some(href) = anchor.attribute("href").await? else {
        return Ok(None);
    };
    let id = href.rsplit('/').next().unwrap_or("").to_owned();
    if id.is_empty() {
        return Ok(None);
    }
    Ok(Some((id, format!("{SITE_ORIGIN}{href}"))))
}

/// First role-labeled self-link whose path is a bare handle.
async fn extract_author_handle(
    element: &dyn ElementHandle,
) -> Result<Option<String>, DriverError> {
    for link in element.query_all(AUTHOR_LINK).await? {
        if let Some(href) = link.attribute("href").await? {
            let path = href.trim_start_matches('/');
            if !path.is_empty() && !path.contains('/') {
                return Ok(Some(path.to_owned()));
            }
        }
    }
    Ok(None)
}

/// First line of the name block, with a structurally appended `@handle`
/// suffix stripped.
async fn extract_display_name(
    element: &dyn ElementHandle,
    username: Option<&str>,
) -> Result<Option<String>, DriverError> {
    let Some(block) = element.query(NAME_BLOCK).await? else {
        return Ok(None);
    };
    let text = block.text().await?;
    let Some(first_line) = text.trim().lines().next() else {
        return Ok(None);
    };
    let mut name = first_line.trim().to_owned();
    if let Some(handle) = username {
        if let Some(stripped) = name.strip_suffix(&format!(" @{handle}")) {
            name = stripped.trim_end().to_owned();
        } else if let Some(stripped) = name.strip_suffix(handle) {
            name = stripped.trim_end().to_owned();
        }
    }
    if name.is_empty() {
        return Ok(None);
    }
    Ok(Some(name))
}

/// All media CDN URLs, in render order, duplicates allowed.
async fn extract_images(element: &dyn ElementHandle) -> Result<Vec<String>, DriverError> {
    let mut urls = Vec::new();
    for img in element.query_all(MEDIA_IMAGE).await? {
        if let Some(src) = img.attribute("src").await? {
            urls.push(src);
        }
    }
    Ok(urls)
}

/// Machine-readable timestamp attribute when present, rendered text through
/// the lenient parser otherwise.
async fn extract_timestamp(element: &dyn ElementHandle) -> Result<PublishedAt, DriverError> {
    let Some(node) = element.query(TIME_NODE).await? else {
        return Ok(PublishedAt::Raw(MISSING_DATE.to_owned()));
    };

    if let Some(attr) = node.attribute("datetime").await? {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&attr) {
            return Ok(PublishedAt::Parsed(dt.naive_utc()));
        }
    }

    let text = node.text().await?;
    if text.trim().is_empty() {
        return Ok(PublishedAt::Raw(MISSING_DATE.to_owned()));
    }
    Ok(parse_feed_timestamp(&text))
}

/// Engagement metrics via three fallback strategies, each metric resolving
/// independently: accessible labels, then the metric's own control text,
/// then (views only) a free-text scan.
async fn extract_metrics(
    element: &dyn ElementHandle,
) -> Result<(String, String, String, String), DriverError> {
    let mut views: Option<String> = None;
    let mut replies: Option<String> = None;
    let mut reposts: Option<String> = None;
    let mut likes: Option<String> = None;

    // Strategy 1: accessible label text.
    for labeled in element.query_all(LABELED).await? {
        let Some(label) = labeled.attribute("aria-label").await? else {
            continue;
        };
        if replies.is_none() {
            replies = metrics::replies_from_label(&label);
        }
        if reposts.is_none() {
            reposts = metrics::reposts_from_label(&label);
        }
        if likes.is_none() {
            likes = metrics::likes_from_label(&label);
        }
        if views.is_none() {
            views = metrics::views_from_label(&label);
        }
    }

    // Strategy 2: the control's own visible text.
    if replies.is_none() {
        replies = control_count(element, REPLY_CONTROL).await?;
    }
    if reposts.is_none() {
        reposts = control_count(element, REPOST_CONTROL).await?;
    }
    if likes.is_none() {
        likes = control_count(element, LIKE_CONTROL).await?;
    }

    // Strategy 3 (views only): free-text scan for a "views" suffix.
    if views.is_none() {
        for node in element.query_all(FREE_TEXT).await? {
            let text = node.text().await?;
            if let Some(v) = metrics::views_from_label(&text) {
                views = Some(v);
                break;
            }
        }
    }

    let or_na = |v: Option<String>| v.unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    Ok((or_na(views), or_na(replies), or_na(reposts), or_na(likes)))
}

async fn control_count(
    element: &dyn ElementHandle,
    selector: &str,
) -> Result<Option<String>, DriverError> {
    match element.query(selector).await? {
        Some(control) => Ok(metrics::normalize_count(&control.text().await?)),
        None => Ok(None),
    }
}
