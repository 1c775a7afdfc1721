//! Per-run memoization of profile → follower count lookups.
//!
//! An account-mode run has exactly one author, so its count is fetched once
//! before the scroll loop. Keyword-mode runs fetch lazily, once per distinct
//! handle; a failed lookup is cached as `"N/A"` so a flaky profile page does
//! not turn into a retry storm inside one run.

use std::collections::HashMap;
use std::time::Duration;

use skimmer_core::NOT_AVAILABLE;

use crate::driver::{DriverError, PageDriver};
use crate::metrics;

const FOLLOWER_LINK: &str = r#"a[href*="/followers"]"#;
const SPAN: &str = "span";
const PROFILE_WAIT: Duration = Duration::from_secs(2);

/// In-page fallback when neither the followers link nor a span scan yields
/// a count.
const FOLLOWER_SCRIPT: &str = r#"
(() => {
    const links = Array.from(document.querySelectorAll('a[href*="/followers"]'));
    for (const link of links) {
        const text = link.innerText || link.textContent || '';
        const m = text.match(/([\d,.]+[KMBkmb]?)\s*followers?/i);
        if (m) return m[1];
    }
    const body = document.body.innerText || '';
    const m = body.match(/([\d,.]+[KMBkmb]?)\s*followers?/i);
    return m ? m[1] : null;
})()
"#;

#[derive(Debug, Default)]
pub struct FollowerCache {
    by_handle: HashMap<String, String>,
}

impl FollowerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches and caches the count for an account-mode run's single target
    /// handle. Failures cache [`NOT_AVAILABLE`] so the loop never retries.
    pub async fn prefetch(&mut self, driver: &dyn PageDriver, handle: &str) {
        let value = fetch_follower_count(driver, handle)
            .await
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        tracing::info!(handle, followers = %value, "prefetched follower count");
        self.by_handle.insert(handle.to_lowercase(), value);
    }

    /// The follower count for `handle`, fetched on first sight and memoized
    /// for the rest of the run.
    pub async fn get(&mut self, driver: &dyn PageDriver, handle: &str) -> String {
        let key = handle.to_lowercase();
        if let Some(cached) = self.by_handle.get(&key) {
            return cached.clone();
        }
        let value = fetch_follower_count(driver, handle)
            .await
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
        tracing::debug!(handle, followers = %value, "cached follower count");
        self.by_handle.insert(key, value.clone());
        value
    }

    /// Cached value without fetching, when one exists.
    #[must_use]
    pub fn peek(&self, handle: &str) -> Option<&str> {
        self.by_handle.get(&handle.to_lowercase()).map(String::as_str)
    }
}

/// Opens a profile page and tries the lookup strategies in order:
/// followers-link label, generic span scan, scripted DOM query.
async fn fetch_follower_count(driver: &dyn PageDriver, handle: &str) -> Option<String> {
    let page = match driver.open_page().await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(handle, error = %e, "could not open profile page");
            return None;
        }
    };

    let result = lookup_on_page(page.as_ref(), handle).await;
    page.close().await;

    match result {
        Ok(count) => count,
        Err(e) => {
            tracing::warn!(handle, error = %e, "follower lookup failed");
            None
        }
    }
}

async fn lookup_on_page(
    page: &dyn PageDriver,
    handle: &str,
) -> Result<Option<String>, DriverError> {
    page.navigate(&format!("https://x.com/{handle}")).await?;
    // Stats render late; a miss here just means the strategies scan earlier DOM.
    let _ = page.wait_for_selector(FOLLOWER_LINK, PROFILE_WAIT).await;

    // Strategy 1: the followers link's own label.
    for link in page.query_all(FOLLOWER_LINK).await? {
        if let Some(count) = metrics::followers_from_label(&link.text().await?) {
            return Ok(Some(count));
        }
    }

    // Strategy 2: any span mentioning followers (but not the following count).
    for span in page.query_all(SPAN).await? {
        let text = span.text().await?;
        let lower = text.to_lowercase();
        if lower.contains("followers") && !lower.contains("following") {
            if let Some(count) = metrics::followers_from_label(&text) {
                return Ok(Some(count));
            }
        }
    }

    // Strategy 3: scripted scan of the whole document.
    let value = page.evaluate_script(FOLLOWER_SCRIPT).await?;
    if let Some(raw) = value.as_str() {
        return Ok(metrics::normalize_count(raw));
    }

    Ok(None)
}
