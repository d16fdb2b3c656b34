use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::catalog::QuestionSetId;
use crate::error::StoreError;
use crate::session::SessionResults;

/// One line of `results.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub date: String,
    pub set: String,
    pub asked: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub score_percent: u32,
    pub thinking_secs: f64,
}

impl ResultRow {
    pub fn new(set: QuestionSetId, results: &SessionResults) -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            set: set.to_string(),
            asked: results.asked,
            correct: results.correct,
            incorrect: results.incorrect,
            score_percent: results.score_percent,
            thinking_secs: (results.total_thinking_time_ms as f64 / 100.0).round() / 10.0,
        }
    }
}

/// Append a finished session to the CSV log, writing the header the first time.
pub fn append_result(path: &Path, row: &ResultRow) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    // If the log file doesn't exist, we need to emit a header
    let needs_header = !path.exists();

    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(row)?;
    writer.flush()?;
    Ok(())
}

pub fn read_results(path: &Path) -> Result<Vec<ResultRow>, StoreError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<ResultRow>, _>>()?;
    Ok(rows)
}
