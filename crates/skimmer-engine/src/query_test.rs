use chrono::NaiveDate;
use skimmer_core::Query;

use super::*;

fn keyword_query(text: &str) -> Query {
    Query::build(Some(text.to_owned()), None, None, None, false, None).unwrap()
}

#[test]
fn mixed_case_keyword_yields_both_case_variants_once() {
    let q = build_search_query(&keyword_query("PokerStars"));
    assert_eq!(q.matches("-@pokerstars").count(), 1);
    assert_eq!(q.matches("-@PokerStars").count(), 1);
    assert!(q.starts_with("PokerStars "));
}

#[test]
fn lowercase_keyword_yields_single_exclusion() {
    let q = build_search_query(&keyword_query("pokerstars"));
    assert_eq!(q, "pokerstars -@pokerstars");
}

#[test]
fn or_query_excludes_each_alternative() {
    let q = build_search_query(&keyword_query("(PokerStars) OR (GGPoker)"));
    assert!(q.contains("-@pokerstars"));
    assert!(q.contains("-@PokerStars"));
    assert!(q.contains("-@ggpoker"));
    assert!(q.contains("-@GGPoker"));
}

#[test]
fn or_query_collapses_case_duplicate_alternatives() {
    let exclusions = derive_account_exclusions("(PokerStars) OR (pokerstars)");
    assert_eq!(exclusions, vec!["pokerstars", "PokerStars"]);
}

#[test]
fn alternatives_may_carry_at_prefix() {
    let exclusions = derive_account_exclusions("(@Bet365) OR (stake)");
    assert_eq!(exclusions, vec!["bet365", "Bet365", "stake"]);
}

#[test]
fn account_only_uses_structural_filter() {
    let q = Query::build(None, Some("elonmusk".to_owned()), None, None, false, None).unwrap();
    assert_eq!(build_search_query(&q), "from:elonmusk");
}

#[test]
fn account_with_keyword_excludes_target_account_too() {
    let q = Query::build(
        Some("starship".to_owned()),
        Some("SpaceX".to_owned()),
        None,
        None,
        false,
        None,
    )
    .unwrap();
    let s = build_search_query(&q);
    assert!(s.starts_with("starship "));
    assert!(s.contains("-@spacex"));
    assert!(s.contains("-@SpaceX"));
}

#[test]
fn date_tokens_appear_until_before_since() {
    let q = Query::build(
        Some("rust".to_owned()),
        None,
        NaiveDate::from_ymd_opt(2025, 1, 1),
        NaiveDate::from_ymd_opt(2025, 2, 1),
        false,
        None,
    )
    .unwrap();
    let s = build_search_query(&q);
    let until_pos = s.find("until:2025-02-01").unwrap();
    let since_pos = s.find("since:2025-01-01").unwrap();
    assert!(until_pos < since_pos);
}

#[test]
fn feed_url_is_percent_encoded_and_flags_latest() {
    let q = Query::build(
        Some("rust lang".to_owned()),
        None,
        None,
        None,
        true,
        None,
    )
    .unwrap();
    let url = build_feed_url(&q);
    assert!(url.starts_with("https://x.com/search?q=rust%20lang%20-%40rust"));
    assert!(url.contains("src=typed_query"));
    assert!(url.ends_with("&f=live"));
}

#[test]
fn non_latest_url_omits_live_flag() {
    let url = build_feed_url(&keyword_query("rust"));
    assert!(!url.contains("f=live"));
}
