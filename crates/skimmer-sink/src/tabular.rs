//! Tabular CSV sink: one row per record with a fixed column set, images
//! comma-joined into a single cell.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use skimmer_core::{PublishedAt, Record, NOT_AVAILABLE};

use crate::{ids_of, RecordSink, SinkError};

const COLUMNS: [&str; 13] = [
    "ID",
    "Author",
    "Username",
    "Display Name",
    "Body",
    "Date",
    "Views",
    "Replies",
    "Reposts",
    "Likes",
    "Profile Followers",
    "URL",
    "Images",
];

pub struct CsvSink {
    path: PathBuf,
    records: Vec<Record>,
}

impl CsvSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvSink {
            path: path.into(),
            records: Vec::new(),
        }
    }

    fn write_all(&self) -> Result<(), SinkError> {
        let io_err = |source| SinkError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::create(&self.path).map_err(io_err)?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));

        writer.write_record(COLUMNS).map_err(|e| SinkError::Encode {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        for record in &self.records {
            writer
                .write_record(row_of(record))
                .map_err(|e| SinkError::Encode {
                    path: self.path.clone(),
                    reason: e.to_string(),
                })?;
        }

        let mut inner = writer.into_inner().map_err(|e| SinkError::Encode {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        inner.flush().map_err(io_err)
    }

}

fn parse_rows(contents: &str) -> Result<Vec<Record>, csv::Error> {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(record) = record_of(&row) {
            records.push(record);
        }
    }
    Ok(records)
}

fn row_of(record: &Record) -> [String; 13] {
    [
        record.id.clone(),
        record.author.clone(),
        record.username.clone().unwrap_or_default(),
        record.display_name.clone().unwrap_or_default(),
        record.body.clone(),
        record.published_at.to_string(),
        record.views.clone(),
        record.replies.clone(),
        record.reposts.clone(),
        record.likes.clone(),
        record.profile_followers.clone(),
        record.url.clone().unwrap_or_default(),
        record.images.join(", "),
    ]
}

/// Rebuilds a record from a CSV row. Rows without an id are noise and are
/// dropped; at minimum the id column must survive a round trip so re-runs
/// can seed dedup from prior output.
fn record_of(row: &csv::StringRecord) -> Option<Record> {
    let cell = |i: usize| row.get(i).unwrap_or("").to_owned();
    let opt_cell = |i: usize| {
        let v = cell(i);
        (!v.is_empty()).then_some(v)
    };

    let id = cell(0);
    if id.is_empty() {
        return None;
    }

    let or_na = |i: usize| {
        let v = cell(i);
        if v.is_empty() {
            NOT_AVAILABLE.to_owned()
        } else {
            v
        }
    };

    let images = match opt_cell(12) {
        Some(joined) => joined.split(", ").map(str::to_owned).collect(),
        None => Vec::new(),
    };

    Some(Record {
        id,
        author: cell(1),
        username: opt_cell(2),
        display_name: opt_cell(3),
        body: cell(4),
        published_at: PublishedAt::from(cell(5)),
        url: opt_cell(11),
        views: or_na(6),
        replies: or_na(7),
        reposts: or_na(8),
        likes: or_na(9),
        profile_followers: or_na(10),
        images,
    })
}

impl RecordSink for CsvSink {
    fn load(&mut self) -> Result<(Vec<Record>, HashSet<String>), SinkError> {
        if self.path.exists() {
            match std::fs::read_to_string(&self.path) {
                Ok(contents) => match parse_rows(&contents) {
                    Ok(records) => self.records = records,
                    Err(e) => {
                        tracing::warn!(
                            path = %self.path.display(),
                            error = %e,
                            "existing output is not a readable table; starting empty"
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
#[path = "tabular_test.rs"]
mod tests;
