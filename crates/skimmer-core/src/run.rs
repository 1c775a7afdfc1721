//! Raw run configuration as supplied by the CLI or a batch config file.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::ConfigError;
use crate::query::Query;

/// One harvest run's worth of user input, before validation.
///
/// Dates are carried as `YYYY-MM-DD` strings so the error message can quote
/// exactly what the user typed. The output extension selects the sink format.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub keyword: Option<String>,
    pub from_account: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub latest: bool,
    pub limit: Option<usize>,
    pub output: PathBuf,
}

impl RunConfig {
    /// Parses and validates this configuration into an immutable [`Query`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDate`] for malformed date strings and
    /// [`ConfigError::MissingSearchText`] when no search text was given.
    pub fn to_query(&self) -> Result<Query, ConfigError> {
        let since = parse_date("since", self.since.as_deref())?;
        let until = parse_date("until", self.until.as_deref())?;
        Query::build(
            self.keyword.clone(),
            self.from_account.clone(),
            since,
            until,
            self.latest,
            self.limit,
        )
    }
}

fn parse_date(field: &'static str, raw: Option<&str>) -> Result<Option<NaiveDate>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ConfigError::InvalidDate {
                field,
                value: s.to_owned(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RunConfig {
        RunConfig {
            keyword: Some("rust".to_owned()),
            from_account: None,
            since: None,
            until: None,
            latest: false,
            limit: None,
            output: PathBuf::from("out.json"),
        }
    }

    #[test]
    fn parses_valid_dates() {
        let cfg = RunConfig {
            since: Some("2025-01-01".to_owned()),
            until: Some("2025-02-01".to_owned()),
            ..base()
        };
        let q = cfg.to_query().unwrap();
        assert_eq!(q.since, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(q.until, NaiveDate::from_ymd_opt(2025, 2, 1));
    }

    #[test]
    fn rejects_malformed_date_with_field_name() {
        let cfg = RunConfig {
            since: Some("01/01/2025".to_owned()),
            ..base()
        };
        match cfg.to_query().unwrap_err() {
            ConfigError::InvalidDate { field, value } => {
                assert_eq!(field, "since");
                assert_eq!(value, "01/01/2025");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
