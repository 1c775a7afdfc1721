//! Append-only record persistence with load-on-start dedup seeding.
//!
//! Two formats: a JSON array of record objects and a tabular CSV file with a
//! fixed column set. Both rewrite the whole file per append and flush before
//! returning, which bounds loss on abrupt termination to at most the record
//! being appended. A sink that exists but cannot be parsed recovers to an
//! empty collection — corrupt prior output must never block a new run.

mod json;
mod tabular;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use skimmer_core::Record;
use thiserror::Error;

pub use json::JsonSink;
pub use tabular::CsvSink;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode record for {path}: {reason}")]
    Encode { path: PathBuf, reason: String },
}

/// Append-only persistence for harvested records.
///
/// `load` is called once at run start; the ids it returns seed the engine's
/// dedup set so that re-running against the same resource is idempotent.
pub trait RecordSink: Send {
    /// Reads existing records, creating the resource empty if absent.
    ///
    /// An unreadable or corrupt resource is recovered by starting from an
    /// empty collection (warn-logged), never by failing the run.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Io`] only when the resource cannot be created.
    fn load(&mut self) -> Result<(Vec<Record>, HashSet<String>), SinkError>;

    /// Appends one record durably. The engine does not proceed to the next
    /// candidate element until this returns.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the rewrite fails; the engine logs and
    /// continues, keeping the record in memory.
    fn append(&mut self, record: &Record) -> Result<(), SinkError>;

    /// Rewrites the resource from the full in-memory collection.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the rewrite fails.
    fn flush_all(&mut self, records: &[Record]) -> Result<(), SinkError>;

    fn path(&self) -> &Path;
}

/// Selects a sink implementation from the output path's extension:
/// `.csv` gets the tabular sink, everything else the JSON-array sink.
#[must_use]
pub fn open_sink(path: &Path) -> Box<dyn RecordSink> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Box::new(CsvSink::new(path)),
        _ => Box::new(JsonSink::new(path)),
    }
}

fn ids_of(records: &[Record]) -> HashSet<String> {
    records
        .iter()
        .filter(|r| !r.id.is_empty())
        .map(|r| r.id.clone())
        .collect()
}
