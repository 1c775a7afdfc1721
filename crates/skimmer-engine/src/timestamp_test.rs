use chrono::NaiveDate;
use skimmer_core::PublishedAt;

use super::*;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

fn expect_parsed(raw: &str) -> chrono::NaiveDateTime {
    match parse_feed_timestamp_at(raw, today()) {
        PublishedAt::Parsed(dt) => dt,
        PublishedAt::Raw(s) => panic!("expected {raw:?} to parse, got raw {s:?}"),
    }
}

#[test]
fn month_day_with_year() {
    let dt = expect_parsed("May 20, 2023");
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 5, 20).unwrap());
}

#[test]
fn month_day_implies_current_year() {
    let dt = expect_parsed("May 20");
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 5, 20).unwrap());
}

#[test]
fn slash_date_year_first() {
    let dt = expect_parsed("2023/12/31");
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
}

#[test]
fn slash_date_month_first() {
    let dt = expect_parsed("12/31/2023");
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
}

#[test]
fn bare_time_implies_today() {
    let dt = expect_parsed("10:30 AM");
    assert_eq!(dt.date(), today());
    assert_eq!(dt.time(), chrono::NaiveTime::from_hms_opt(10, 30, 0).unwrap());
}

#[test]
fn twenty_four_hour_time_implies_today() {
    let dt = expect_parsed("22:05");
    assert_eq!(dt.date(), today());
    assert_eq!(dt.time(), chrono::NaiveTime::from_hms_opt(22, 5, 0).unwrap());
}

#[test]
fn date_embedded_in_surrounding_text_is_found() {
    let dt = expect_parsed("· May 20, 2023 · some trailing text");
    assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2023, 5, 20).unwrap());
}

#[test]
fn unrecognized_text_is_kept_verbatim() {
    let got = parse_feed_timestamp_at("just now", today());
    assert_eq!(got, PublishedAt::Raw("just now".to_owned()));
}

#[test]
fn empty_text_is_raw_empty() {
    let got = parse_feed_timestamp_at("   ", today());
    assert_eq!(got, PublishedAt::Raw(String::new()));
}
