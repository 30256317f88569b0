//! Session history and CSV export.

use crate::models::{RankFilter, SessionResult};
use crate::storage::{read_json, write_json, KeyValueStore, SharedStore, StorageResult, HISTORY_KEY};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name used for exports.
pub const EXPORT_FILE_NAME: &str = "toefl_quiz_history.csv";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("No history to export")]
    NothingToExport,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid CSV row: {0}")]
    InvalidRow(String),
}

/// Finished sessions, most recent first.
pub struct HistoryStore {
    store: SharedStore,
    results: Vec<SessionResult>,
}

impl HistoryStore {
    pub fn load(store: SharedStore) -> Self {
        let results = read_json(store.as_ref(), HISTORY_KEY).unwrap_or_default();
        Self { store, results }
    }

    /// Put a result at the front and persist.
    pub fn append(&mut self, result: SessionResult) -> StorageResult<()> {
        self.results.insert(0, result);
        self.persist()
    }

    pub fn clear(&mut self) -> StorageResult<()> {
        self.results.clear();
        self.store.remove(HISTORY_KEY)
    }

    pub fn all(&self) -> &[SessionResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn to_csv(&self) -> Result<String, ExportError> {
        to_csv(&self.results)
    }

    /// Write the history to `dir/toefl_quiz_history.csv`.
    pub fn export_csv(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        if self.results.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        let path = dir.join(EXPORT_FILE_NAME);
        std::fs::write(&path, self.to_csv()?)?;
        tracing::info!(path = %path.display(), rows = self.results.len(), "history exported");
        Ok(path)
    }

    fn persist(&self) -> StorageResult<()> {
        write_json(self.store.as_ref(), HISTORY_KEY, &self.results)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Rank")]
    rank: String,
    #[serde(rename = "Score")]
    score: u32,
    #[serde(rename = "Total")]
    total: u32,
}

/// Render results as `Date,Rank,Score,Total` rows.
pub fn to_csv(results: &[SessionResult]) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    writer.write_record(["Date", "Rank", "Score", "Total"])?;
    for result in results {
        writer.serialize(CsvRow {
            date: result.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            rank: result.rank.to_string(),
            score: result.score,
            total: result.total,
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Parse text produced by [`to_csv`].
pub fn parse_csv(text: &str) -> Result<Vec<SessionResult>, ExportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let mut results = Vec::new();
    for row in reader.deserialize() {
        let row: CsvRow = row?;
        let date = DateTime::parse_from_rfc3339(&row.date)
            .map_err(|err| ExportError::InvalidRow(format!("{}: {}", row.date, err)))?
            .with_timezone(&Utc);
        let rank: RankFilter = row.rank.parse().map_err(ExportError::InvalidRow)?;
        results.push(SessionResult {
            date,
            rank,
            score: row.score,
            total: row.total,
        });
    }
    Ok(results)
}
