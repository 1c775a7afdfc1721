//! The scroll/extract/dedup/stop state machine.
//!
//! One engine drives one run: a single logical thread of control whose
//! suspend points are driver calls and settle delays. Extraction order
//! defines dedup and stop-condition semantics, so elements are processed
//! strictly sequentially. The run always terminates with a definite count
//! and a stop reason; per-run failures (expired session, content timeout,
//! lost browser) truncate the run and return what was collected.

use std::collections::HashSet;
use std::time::Duration;

use skimmer_core::{Query, QueryMode, Record, NOT_AVAILABLE};
use skimmer_sink::RecordSink;

use crate::driver::{DriverError, PageDriver};
use crate::extract::{extract_record, FEED_ITEM};
use crate::followers::FollowerCache;
use crate::pacing;
use crate::query::build_feed_url;

const BODY_TEXT_JS: &str = "document.body.innerText || ''";

/// URL fragments that mean the host bounced us to authentication.
const LOGIN_URL_MARKERS: [&str; 5] =
    ["login", "i/flow", "account/access", "authenticate", "signin"];

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Consecutive scrolls yielding zero newly-accepted records before the
    /// feed is considered exhausted.
    pub max_empty_scrolls: u32,
    /// Consecutive out-of-range records tolerated outside latest mode,
    /// absorbing pinned/promoted/out-of-order content.
    pub max_out_of_range: u32,
    /// How long to wait for the first feed element after navigation.
    pub content_wait: Duration,
    /// How long to wait for feed elements after a re-navigation.
    pub reload_wait: Duration,
    pub settle_min_ms: u64,
    pub settle_max_ms: u64,
    /// Additional navigation attempts before giving the run up.
    pub nav_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_empty_scrolls: 3,
            max_out_of_range: 10,
            content_wait: Duration::from_secs(80),
            reload_wait: Duration::from_secs(10),
            settle_min_ms: 1000,
            settle_max_ms: 2000,
            nav_retries: 2,
        }
    }
}

/// Why a run reached its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    LimitReached,
    /// Empty-scroll threshold hit: the feed is exhausted or stuck.
    FeedExhausted,
    /// Date policy ended the run (crossed `since`, or strikes exhausted).
    OutOfRange,
    /// The host demanded authentication mid-run.
    SessionExpired,
    /// The feed never rendered content within the wait budget.
    ContentTimeout,
    /// The browser session died underneath us.
    DriverLost(String),
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::LimitReached => f.write_str("limit reached"),
            StopReason::FeedExhausted => f.write_str("feed exhausted"),
            StopReason::OutOfRange => f.write_str("out of date range"),
            StopReason::SessionExpired => f.write_str("session expired"),
            StopReason::ContentTimeout => f.write_str("content timeout"),
            StopReason::DriverLost(reason) => write!(f, "driver lost: {reason}"),
        }
    }
}

/// Terminal result of a run. `records` is the full collection, including
/// records loaded from pre-existing output; `newly_collected` counts only
/// this run's appends.
#[derive(Debug)]
pub struct HarvestOutcome {
    pub records: Vec<Record>,
    pub newly_collected: usize,
    pub stop: StopReason,
}

/// Ephemeral per-run state, owned by one engine invocation and destroyed at
/// run end. Only its effect — appended records — outlives the run.
#[derive(Default)]
struct HarvestState {
    seen_ids: HashSet<String>,
    collected: Vec<Record>,
    consecutive_empty_scrolls: u32,
    consecutive_out_of_range: u32,
    last_page_height: u64,
    newly_collected: usize,
    followers: FollowerCache,
}

enum DateVerdict {
    Accept,
    Skip,
    Stop(StopReason),
}

pub struct HarvestEngine<'a> {
    driver: &'a dyn PageDriver,
    sink: &'a mut dyn RecordSink,
    query: Query,
    config: EngineConfig,
    feed_url: String,
}

impl<'a> HarvestEngine<'a> {
    pub fn new(
        driver: &'a dyn PageDriver,
        sink: &'a mut dyn RecordSink,
        query: Query,
        config: EngineConfig,
    ) -> Self {
        let feed_url = build_feed_url(&query);
        HarvestEngine {
            driver,
            sink,
            query,
            config,
            feed_url,
        }
    }

    /// Runs the harvest to completion.
    ///
    /// Never fails past the caller: configuration was validated when the
    /// [`Query`] was built, and every later failure mode truncates the run
    /// into an outcome carrying whatever was collected.
    pub async fn run(mut self) -> HarvestOutcome {
        let mut state = HarvestState::default();

        match self.sink.load() {
            Ok((existing, ids)) => {
                if !existing.is_empty() {
                    tracing::info!(
                        count = existing.len(),
                        path = %self.sink.path().display(),
                        "resuming from existing output"
                    );
                }
                state.collected = existing;
                state.seen_ids = ids;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not initialize sink; collecting in memory only");
            }
        }

        tracing::info!(url = %self.feed_url, "opening feed");
        if let Err(stop) = self.open_feed().await {
            return self.finish(state, stop);
        }
        if let Err(stop) = self.session_guard().await {
            return self.finish(state, stop);
        }
        if let Err(stop) = self.wait_for_feed().await {
            return self.finish(state, stop);
        }

        // One author for the whole run: fetch its follower count up front.
        if self.query.mode == QueryMode::Account {
            if let Some(target) = self.query.target_handle().map(str::to_owned) {
                state.followers.prefetch(self.driver, &target).await;
            }
        }

        match self.driver.page_height().await {
            Ok(h) => state.last_page_height = h,
            Err(e) => return self.finish(state, StopReason::DriverLost(e.to_string())),
        }

        let stop = self.scroll_loop(&mut state).await;
        self.finish(state, stop)
    }

    async fn scroll_loop(&mut self, state: &mut HarvestState) -> StopReason {
        loop {
            // Unexpected navigation is steady-state behavior (a stray click,
            // a redirect), not a fault: return to the feed and retry. Each
            // retry counts as an empty scroll so a redirect that sticks (the
            // host bouncing every navigation off the feed) still ends the
            // run at the empty-scroll threshold.
            match self.driver.current_url().await {
                Ok(url) if !url.contains("/search") => {
                    state.consecutive_empty_scrolls += 1;
                    tracing::warn!(
                        %url,
                        empty_scrolls = state.consecutive_empty_scrolls,
                        "navigated away from feed; returning"
                    );
                    if state.consecutive_empty_scrolls >= self.config.max_empty_scrolls {
                        return StopReason::FeedExhausted;
                    }
                    if let Err(e) = self.driver.navigate(&self.feed_url).await {
                        return StopReason::DriverLost(e.to_string());
                    }
                    let _ = self
                        .driver
                        .wait_for_selector(FEED_ITEM, self.config.reload_wait)
                        .await;
                    continue;
                }
                Ok(_) => {}
                Err(e) => return StopReason::DriverLost(e.to_string()),
            }

            let elements = match self.driver.query_all(FEED_ITEM).await {
                Ok(elements) => elements,
                Err(e) => return StopReason::DriverLost(e.to_string()),
            };

            let mut accepted_in_scroll = 0usize;
            for element in &elements {
                if self.limit_reached(state) {
                    return StopReason::LimitReached;
                }

                let record = match extract_record(element.as_ref(), &self.query).await {
                    Ok(Some(record)) => record,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::debug!(error = %e, "element extraction failed; skipping");
                        continue;
                    }
                };

                if state.seen_ids.contains(&record.id) {
                    continue;
                }
                state.seen_ids.insert(record.id.clone());

                match self.apply_date_policy(state, &record) {
                    DateVerdict::Accept => {}
                    DateVerdict::Skip => continue,
                    DateVerdict::Stop(stop) => return stop,
                }

                state.consecutive_out_of_range = 0;
                self.accept(state, record).await;
                accepted_in_scroll += 1;
            }

            if self.limit_reached(state) {
                return StopReason::LimitReached;
            }

            if accepted_in_scroll == 0 {
                state.consecutive_empty_scrolls += 1;
                tracing::debug!(
                    empty_scrolls = state.consecutive_empty_scrolls,
                    "no new records in this scroll"
                );
                if state.consecutive_empty_scrolls >= self.config.max_empty_scrolls {
                    return StopReason::FeedExhausted;
                }
            } else {
                state.consecutive_empty_scrolls = 0;
                tracing::info!(
                    accepted = accepted_in_scroll,
                    total = state.newly_collected,
                    "collected new records"
                );
            }

            if let Err(e) = self.driver.scroll_by_viewport().await {
                return StopReason::DriverLost(e.to_string());
            }
            pacing::settle_delay(self.config.settle_min_ms, self.config.settle_max_ms).await;

            match self.driver.page_height().await {
                Ok(height) if height == state.last_page_height => {
                    // No growth after a scroll: end of available content.
                    // Intentionally the same counter as the zero-accept check
                    // above; a fully stalled iteration counts twice.
                    state.consecutive_empty_scrolls += 1;
                    tracing::debug!(
                        height,
                        empty_scrolls = state.consecutive_empty_scrolls,
                        "page height did not grow"
                    );
                    if state.consecutive_empty_scrolls >= self.config.max_empty_scrolls {
                        return StopReason::FeedExhausted;
                    }
                }
                Ok(height) => state.last_page_height = height,
                Err(e) => return StopReason::DriverLost(e.to_string()),
            }
        }
    }

    fn limit_reached(&self, state: &HarvestState) -> bool {
        self.query
            .limit
            .is_some_and(|limit| state.newly_collected >= limit)
    }

    /// Evaluates the date rules for a fresh record: accept it, skip it and
    /// keep scrolling, or end the run on it.
    fn apply_date_policy(&self, state: &mut HarvestState, record: &Record) -> DateVerdict {
        if !self.is_out_of_range(record) {
            return DateVerdict::Accept;
        }
        state.consecutive_out_of_range += 1;

        let record_date = record.published_at.date();
        let crossed_since = record_date
            .zip(self.query.since)
            .is_some_and(|(date, since)| date < since);
        if crossed_since {
            // The feed is chronologically ordered; past the boundary nothing
            // further is relevant.
            tracing::info!(id = %record.id, date = ?record_date, "crossed since boundary; stopping");
            return DateVerdict::Stop(StopReason::OutOfRange);
        }
        if self.query.latest {
            tracing::info!(id = %record.id, date = ?record_date, "out-of-range record in latest mode; stopping");
            return DateVerdict::Stop(StopReason::OutOfRange);
        }
        if state.consecutive_out_of_range >= self.config.max_out_of_range {
            tracing::info!(
                strikes = state.consecutive_out_of_range,
                "too many consecutive out-of-range records; stopping"
            );
            return DateVerdict::Stop(StopReason::OutOfRange);
        }
        DateVerdict::Skip
    }

    /// A record is out of range only when a date filter is active and its
    /// timestamp parsed to a date outside `[since, until]`. Unparseable
    /// timestamps never count against the range.
    fn is_out_of_range(&self, record: &Record) -> bool {
        if !self.query.date_filter_active() {
            return false;
        }
        let Some(date) = record.published_at.date() else {
            return false;
        };
        self.query.since.is_some_and(|since| date < since)
            || self.query.until.is_some_and(|until| date > until)
    }

    async fn accept(&mut self, state: &mut HarvestState, mut record: Record) {
        record.profile_followers = match (self.query.mode, record.username.as_deref()) {
            (QueryMode::Account, _) => {
                let target = self.query.target_handle().unwrap_or_default();
                state
                    .followers
                    .peek(target)
                    .unwrap_or(NOT_AVAILABLE)
                    .to_owned()
            }
            (QueryMode::Keyword, Some(handle)) => {
                let handle = handle.to_owned();
                state.followers.get(self.driver, &handle).await
            }
            (QueryMode::Keyword, None) => NOT_AVAILABLE.to_owned(),
        };

        // Durable before the next candidate: at most the current record can
        // be lost on abrupt termination.
        if let Err(e) = self.sink.append(&record) {
            tracing::warn!(id = %record.id, error = %e, "append failed; record kept in memory");
        }

        tracing::debug!(
            id = %record.id,
            author = %record.author,
            date = %record.published_at,
            "collected record"
        );
        state.collected.push(record);
        state.newly_collected += 1;
    }

    async fn open_feed(&self) -> Result<(), StopReason> {
        let mut attempt = 0;
        loop {
            match self.driver.navigate(&self.feed_url).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.nav_retries => {
                    attempt += 1;
                    tracing::warn!(error = %e, attempt, "feed navigation failed; retrying");
                }
                Err(e) => return Err(StopReason::DriverLost(e.to_string())),
            }
        }
    }

    /// Detects an authentication bounce, by URL and by page text.
    async fn session_guard(&self) -> Result<(), StopReason> {
        let url = self
            .driver
            .current_url()
            .await
            .map_err(|e| StopReason::DriverLost(e.to_string()))?;
        let url_lower = url.to_lowercase();
        if LOGIN_URL_MARKERS.iter().any(|m| url_lower.contains(m)) {
            tracing::warn!(%url, "redirected to authentication; session expired");
            return Err(StopReason::SessionExpired);
        }

        if let Ok(value) = self.driver.evaluate_script(BODY_TEXT_JS).await {
            if let Some(text) = value.as_str() {
                let lower = text.to_lowercase();
                let head: String = lower.chars().take(500).collect();
                let login_prompt = lower.contains("sign in")
                    || lower.contains("log in")
                    || lower.contains("enter your phone");
                if login_prompt && !head.contains("search") {
                    tracing::warn!("login prompt detected in page content; session expired");
                    return Err(StopReason::SessionExpired);
                }
            }
        }
        Ok(())
    }

    async fn wait_for_feed(&self) -> Result<(), StopReason> {
        match self
            .driver
            .wait_for_selector(FEED_ITEM, self.config.content_wait)
            .await
        {
            Ok(()) => Ok(()),
            Err(DriverError::Timeout { .. }) => {
                self.diagnose_timeout().await;
                Err(StopReason::ContentTimeout)
            }
            Err(e) => Err(StopReason::DriverLost(e.to_string())),
        }
    }

    /// Narrows a content timeout to a likelier cause for the logs.
    async fn diagnose_timeout(&self) {
        let Ok(value) = self.driver.evaluate_script(BODY_TEXT_JS).await else {
            tracing::warn!("feed never rendered and page text is unreadable");
            return;
        };
        let text = value.as_str().unwrap_or_default().to_lowercase();
        if text.contains("log in") || text.contains("sign in") {
            tracing::warn!("feed never rendered; page shows a login prompt");
        } else if text.contains("rate limit") || text.contains("too many requests") {
            tracing::warn!("feed never rendered; host is rate limiting");
        } else {
            let preview: String = text.chars().take(200).collect();
            tracing::warn!(%preview, "feed never rendered within the wait budget");
        }
    }

    fn finish(&mut self, state: HarvestState, stop: StopReason) -> HarvestOutcome {
        if let Err(e) = self.sink.flush_all(&state.collected) {
            tracing::warn!(error = %e, "final flush failed");
        }
        tracing::info!(
            newly_collected = state.newly_collected,
            total = state.collected.len(),
            stop = %stop,
            path = %self.sink.path().display(),
            "run finished"
        );
        HarvestOutcome {
            records: state.collected,
            newly_collected: state.newly_collected,
            stop,
        }
    }
}
