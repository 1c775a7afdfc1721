use thiserror::Error;

/// Configuration errors surfaced before any harvest run starts.
///
/// These are the only fatal-before-side-effects errors in the system: a run
/// that has begun always terminates with a definite record count instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("either a keyword or an account must be provided")]
    MissingSearchText,

    #[error("invalid date for {field}: \"{value}\" (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("invalid batch config {path}: {reason}")]
    InvalidBatchConfig { path: String, reason: String },
}
