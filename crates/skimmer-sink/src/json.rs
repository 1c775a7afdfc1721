//! JSON-array sink: the whole resource is one pretty-printed array of
//! record objects, rewritten on every append.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use skimmer_core::Record;

use crate::{ids_of, RecordSink, SinkError};

pub struct JsonSink {
    path: PathBuf,
    records: Vec<Record>,
}

impl JsonSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSink {
            path: path.into(),
            records: Vec::new(),
        }
    }

    fn write_all(&self) -> Result<(), SinkError> {
        let file = File::create(&self.path).map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.records).map_err(|e| {
            SinkError::Encode {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        writer.flush().map_err(|source| SinkError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl RecordSink for JsonSink {
    fn load(&mut self) -> Result<(Vec<Record>, HashSet<String>), SinkError> {
        if self.path.exists() {
            match std::fs::read_to_string(&self.path) {
                Ok(contents) => match serde_json::from_str::<Vec<Record>>(&contents) {
                    Ok(records) => {
                        self.records = records;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %self.path.display(),
                            error = %e,
                            "existing output is not a valid record array; starting empty"
                        );
                        self.records = Vec::new();
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "could not read existing output; starting empty"
                    );
                    self.records = Vec::new();
                }
            }
        } else {
            // Create the resource empty so the run is visibly initialized.
            self.records = Vec::new();
            self.write_all()?;
        }

        let ids = ids_of(&self.records);
        Ok((self.records.clone(), ids))
    }

    fn append(&mut self, record: &Record) -> Result<(), SinkError> {
        self.records.push(record.clone());
        self.write_all()
    }

    fn flush_all(&mut self, records: &[Record]) -> Result<(), SinkError> {
        self.records = records.to_vec();
        self.write_all()
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod tests;
