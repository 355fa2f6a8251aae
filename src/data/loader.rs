// ============================================================
// Layer 4 — Training Data Loader
// ============================================================
// Reads and writes the training CSV using the csv crate.
//
// Expected layout (extra columns are ignored):
//
//   error_message,recommended_action
//   "Order : 12312 Error given by UPI",Retry payment
//   Error 500: Internal Server Error,Restart service
//
// The columns are located by header name, not position, so a
// file exported with an index column still loads.
//
// Every record must carry both fields. An empty field is a
// data-shape error reported with its 1-based data row number.
//
// Reference: csv crate documentation (Reader, Writer)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::domain::errors::DatasetError;
use crate::domain::training_record::{
    TrainingDataset, TrainingRecord, ACTION_COLUMN, MESSAGE_COLUMN,
};
use crate::domain::traits::RecordSource;

/// File name a training job looks for inside its train channel
pub const TRAIN_FILE_NAME: &str = "train.csv";

/// Loads a training CSV from a single file.
/// Implements the RecordSource trait from Layer 3.
pub struct CsvLoader {
    path: PathBuf,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loader for `<dir>/train.csv`
    pub fn in_channel(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(TRAIN_FILE_NAME))
    }
}

impl RecordSource for CsvLoader {
    fn load_records(&self) -> Result<TrainingDataset> {
        let source_name = self.path.display().to_string();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("Cannot open training data '{}'", source_name))?;

        // ── Locate the two required columns by header name ───────────────────
        let headers = reader
            .headers()
            .with_context(|| format!("Cannot read header row of '{}'", source_name))?
            .clone();

        let find_column = |column: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
                .ok_or_else(|| {
                    DatasetError::MissingColumn {
                        column:      column.to_string(),
                        source_name: source_name.clone(),
                    }
                    .into()
                })
        };
        let message_idx = find_column(MESSAGE_COLUMN)?;
        let action_idx  = find_column(ACTION_COLUMN)?;

        // ── Read every data row ───────────────────────────────────────────────
        let mut records = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row_number = i + 1;
            let row = row.with_context(|| {
                format!("Malformed CSV at data row {} of '{}'", row_number, source_name)
            })?;

            let message = row.get(message_idx).unwrap_or("");
            let action  = row.get(action_idx).unwrap_or("");

            if message.trim().is_empty() {
                return Err(DatasetError::EmptyField {
                    row:    row_number,
                    column: MESSAGE_COLUMN.to_string(),
                }
                .into());
            }
            if action.trim().is_empty() {
                return Err(DatasetError::EmptyField {
                    row:    row_number,
                    column: ACTION_COLUMN.to_string(),
                }
                .into());
            }

            records.push(TrainingRecord::new(message, action));
        }

        if records.is_empty() {
            return Err(DatasetError::NoRecords.into());
        }

        tracing::info!("Loaded {} training records from '{}'", records.len(), source_name);
        Ok(TrainingDataset::new(records))
    }
}

/// Write `dataset` as CSV with a header row and no index column.
pub fn write_csv(dataset: &TrainingDataset, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;

    // Header written by hand so an empty dataset still yields a valid file
    writer.write_record([MESSAGE_COLUMN, ACTION_COLUMN])?;
    for record in dataset.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    tracing::debug!("Wrote {} records to '{}'", dataset.len(), path.display());
    Ok(())
}
