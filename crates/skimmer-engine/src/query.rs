//! Canonical search-query and feed-URL construction.
//!
//! The host grammar is positional: exclusion tokens follow the keyword text,
//! `until:` precedes `since:`, and the live-ranking flag rides on the URL
//! rather than the query string.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use skimmer_core::{Query, QueryMode};

const FEED_BASE: &str = "https://x.com/search";

/// Percent-encode everything except unreserved characters and `/`, matching
/// what the host's own search box produces.
const QUERY_ENCODE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Candidate account handles to exclude, derived from the keyword text.
///
/// A keyword that happens to equal an account handle would otherwise pull in
/// that account's own promotional posts, so the keyword itself (or each
/// parenthesized alternative of an OR-combination) is treated as a handle to
/// exclude. Candidates are deduplicated case-insensitively, order preserved;
/// each surviving candidate contributes its lowercase form and, when
/// different, its as-typed form.
#[must_use]
pub fn derive_account_exclusions(keyword: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    let is_or_query = keyword.to_uppercase().contains(" OR ");
    if is_or_query {
        // (alt1) OR (alt2) OR (alt3) — each alternative is a candidate.
        let mut rest = keyword;
        while let Some(open) = rest.find('(') {
            let Some(close) = rest[open..].find(')') else {
                break;
            };
            let alt = rest[open + 1..open + close].trim();
            push_candidate(&mut candidates, alt);
            rest = &rest[open + close + 1..];
        }
    } else {
        push_candidate(&mut candidates, keyword.trim());
    }

    expand_case_variants(&candidates)
}

fn push_candidate(candidates: &mut Vec<String>, raw: &str) {
    let handle = raw.trim_start_matches('@').trim();
    if handle.is_empty() {
        return;
    }
    let already = candidates.iter().any(|c| c.eq_ignore_ascii_case(handle));
    if !already {
        candidates.push(handle.to_owned());
    }
}

fn expand_case_variants(candidates: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(candidates.len() * 2);
    for c in candidates {
        let lower = c.to_lowercase();
        out.push(lower.clone());
        if *c != lower {
            out.push(c.clone());
        }
    }
    out
}

/// Assembles the canonical query string for a validated [`Query`].
#[must_use]
pub fn build_search_query(query: &Query) -> String {
    let mut q = match (query.mode, &query.keyword, &query.account) {
        // Pure account search: structural filter, no exclusions needed.
        (QueryMode::Account, None, Some(handle)) => format!("from:{handle}"),
        // Keyword search, possibly pinned to an account: exclusion tokens
        // keep the keyword's namesake accounts (and the target account's own
        // replies in account mode) out of the results.
        (_, Some(keyword), account) => {
            let mut exclusions = derive_account_exclusions(keyword);
            if let Some(handle) = account {
                let lower = handle.to_lowercase();
                if !exclusions.contains(&lower) {
                    exclusions.push(lower.clone());
                }
                if *handle != lower && !exclusions.contains(handle) {
                    exclusions.push(handle.clone());
                }
            }
            let mut s = keyword.clone();
            for handle in &exclusions {
                s.push_str(" -@");
                s.push_str(handle);
            }
            s
        }
        // Query::build guarantees at least one of keyword/account, and
        // account-only intents always carry the Account mode.
        (_, None, _) => String::new(),
    };

    // Host grammar: until before since.
    if let Some(until) = query.until {
        q.push_str(&format!(" until:{}", until.format("%Y-%m-%d")));
    }
    if let Some(since) = query.since {
        q.push_str(&format!(" since:{}", since.format("%Y-%m-%d")));
    }
    q
}

/// Percent-encodes the canonical query string into a feed URL. Latest mode
/// appends the live-ranking parameter.
#[must_use]
pub fn build_feed_url(query: &Query) -> String {
    let canonical = build_search_query(query);
    let encoded = utf8_percent_encode(&canonical, QUERY_ENCODE);
    let mut url = format!("{FEED_BASE}?q={encoded}&src=typed_query");
    if query.latest {
        url.push_str("&f=live");
    }
    url
}

#[cfg(test)]
#[path = "query_test.rs"]
mod tests;
