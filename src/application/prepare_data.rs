// ============================================================
// Layer 2 — Data Preparation
// ============================================================
// Pulls the labelled error log CSV out of object storage and
// splits it into two parallel columns:
//
//   store://logs-poc/data/error_logs.csv
//        ↓ download_file
//   <work_dir>/error_logs.csv
//        ↓ CsvLoader
//   (messages, actions)   ← same length, same order
//
// A missing object or a missing column aborts the run.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::data::loader::CsvLoader;
use crate::domain::training_record::TrainingDataset;
use crate::domain::traits::{ObjectLocation, ObjectStore, RecordSource};

/// Download `location` to `local_path` and load it as a training dataset.
pub fn download_dataset(
    store:      &dyn ObjectStore,
    location:   &ObjectLocation,
    local_path: &Path,
) -> Result<TrainingDataset> {
    tracing::info!("Downloading {} to '{}'", location, local_path.display());
    store
        .download_file(location, local_path)
        .with_context(|| format!("Cannot fetch training data from {}", location))?;

    let dataset = CsvLoader::new(local_path).load_records()?;
    tracing::info!("Loaded {} labelled error messages", dataset.len());
    Ok(dataset)
}

/// Download and parse the data file, returning (messages, actions).
pub fn prepare_data(
    store:    &dyn ObjectStore,
    bucket:   &str,
    key:      &str,
    work_dir: &Path,
) -> Result<(Vec<String>, Vec<String>)> {
    let location   = ObjectLocation::new(bucket, key);
    let local_path = local_copy_path(work_dir, key);
    Ok(download_dataset(store, &location, &local_path)?.into_columns())
}

/// `<work_dir>/<last key segment>`
fn local_copy_path(work_dir: &Path, key: &str) -> PathBuf {
    let file_name = key.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("data.csv");
    work_dir.join(file_name)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::object_store::LocalObjectStore;
    use std::fs;

    fn seeded_store(root: &Path, csv: &str) -> LocalObjectStore {
        let src = root.join("seed.csv");
        fs::write(&src, csv).unwrap();
        let store = LocalObjectStore::new(root.join("store"));
        store
            .upload_file(&src, &ObjectLocation::new("logs-poc", "data/error_logs.csv"))
            .unwrap();
        store
    }

    #[test]
    fn test_prepare_returns_parallel_columns() {
        let dir   = tempfile::tempdir().unwrap();
        let store = seeded_store(
            dir.path(),
            "error_message,recommended_action\n\
             \"Order : 12312 Error given by UPI\",Retry payment\n\
             Disk full,Free disk space\n",
        );

        let work = dir.path().join("work");
        let (messages, actions) =
            prepare_data(&store, "logs-poc", "data/error_logs.csv", &work).unwrap();

        assert_eq!(messages, vec!["Order : 12312 Error given by UPI", "Disk full"]);
        assert_eq!(actions, vec!["Retry payment", "Free disk space"]);
        assert!(work.join("error_logs.csv").is_file());
    }

    #[test]
    fn test_missing_object_is_fatal() {
        let dir   = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().join("store"));
        let err = prepare_data(&store, "logs-poc", "data/error_logs.csv", dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Cannot fetch training data"));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir   = tempfile::tempdir().unwrap();
        let store = seeded_store(dir.path(), "error_message,action\nDisk full,Free disk space\n");
        let err = prepare_data(&store, "logs-poc", "data/error_logs.csv", &dir.path().join("w"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("recommended_action"));
    }
}
