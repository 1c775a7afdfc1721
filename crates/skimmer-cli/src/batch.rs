//! Batch configuration files: several keywords combined into one query.
//!
//! The keywords either become parenthesized OR-alternatives or are joined
//! with spaces into a single all-terms search.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use skimmer_core::{ConfigError, RunConfig};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct BatchConfig {
    pub keywords: Vec<String>,
    /// Combine keywords into one `(a) OR (b)` query instead of running them
    /// one after another.
    #[serde(default)]
    pub use_or_logic: bool,
    #[serde(default)]
    pub since_date: Option<String>,
    #[serde(default)]
    pub until_date: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub latest: bool,
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

/// Reads a batch file and expands it into run configurations.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidBatchConfig`] for an unreadable file,
/// malformed JSON, or an empty keyword list.
pub(crate) fn runs_from_file(
    path: &Path,
    default_output: &Path,
) -> Result<Vec<RunConfig>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| invalid(path, &e.to_string()))?;
    let config: BatchConfig =
        serde_json::from_str(&contents).map_err(|e| invalid(path, &e.to_string()))?;
    expand(&config, path, default_output)
}

fn expand(
    config: &BatchConfig,
    path: &Path,
    default_output: &Path,
) -> Result<Vec<RunConfig>, ConfigError> {
    let keywords: Vec<&str> = config
        .keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .collect();
    if keywords.is_empty() {
        return Err(invalid(path, "keywords must contain at least one entry"));
    }

    let output = config
        .output_file
        .clone()
        .unwrap_or_else(|| default_output.to_path_buf());
    let base = RunConfig {
        keyword: None,
        from_account: None,
        since: config.since_date.clone(),
        until: config.until_date.clone(),
        latest: config.latest,
        limit: config.limit,
        output,
    };

    let combined = if config.use_or_logic && keywords.len() > 1 {
        keywords
            .iter()
            .map(|k| format!("({k})"))
            .collect::<Vec<_>>()
            .join(" OR ")
    } else {
        keywords.join(" ")
    };

    Ok(vec![RunConfig {
        keyword: Some(combined),
        ..base
    }])
}

fn invalid(path: &Path, reason: &str) -> ConfigError {
    ConfigError::InvalidBatchConfig {
        path: path.display().to_string(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;
