//! Search intent, immutable once built.

use chrono::{Duration, NaiveDate, Utc};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    Keyword,
    Account,
}

/// A validated search intent. Built once through [`Query::build`] and never
/// mutated afterwards; the engine owns one per run.
#[derive(Debug, Clone)]
pub struct Query {
    pub mode: QueryMode,
    /// Keyword text; required in keyword mode, optional alongside an account.
    pub keyword: Option<String>,
    /// Bare target handle (leading `@` stripped) in account mode.
    pub account: Option<String>,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    /// Recency-biased ranking, with an implicit 24-hour lower bound.
    pub latest: bool,
    pub limit: Option<usize>,
}

impl Query {
    /// Validates and freezes a search intent.
    ///
    /// In latest mode, `since` defaults to yesterday (now − 24h at date
    /// granularity) unless explicitly provided, so the engine stops as soon
    /// as the feed scrolls past the last day.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSearchText`] when neither a keyword nor
    /// an account is supplied.
    pub fn build(
        keyword: Option<String>,
        account: Option<String>,
        since: Option<NaiveDate>,
        until: Option<NaiveDate>,
        latest: bool,
        limit: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let keyword = keyword.filter(|k| !k.trim().is_empty());
        let account = account
            .map(|a| a.trim().trim_start_matches('@').to_owned())
            .filter(|a| !a.is_empty());

        let mode = match (&keyword, &account) {
            (_, Some(_)) => QueryMode::Account,
            (Some(_), None) => QueryMode::Keyword,
            (None, None) => return Err(ConfigError::MissingSearchText),
        };

        let since = if latest && since.is_none() {
            Some(Utc::now().date_naive() - Duration::hours(24))
        } else {
            since
        };

        Ok(Query {
            mode,
            keyword,
            account,
            since,
            until,
            latest,
            limit,
        })
    }

    /// The bare handle an account-mode run is pinned to.
    #[must_use]
    pub fn target_handle(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Whether any date bound is active, which enables the out-of-range
    /// rejection and early-stop rules.
    #[must_use]
    pub fn date_filter_active(&self) -> bool {
        self.since.is_some() || self.until.is_some()
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
