// ============================================================
// Layer 6 — Local Object Store
// ============================================================
// Bucket/key storage backed by the filesystem:
//
//   <root>/
//     logs-poc/                      ← bucket
//       data/error_logs.csv          ← key "data/error_logs.csv"
//       training/train.csv
//       logs-error-model-2025-.../output/model/model.mpk.gz
//
// Keys are relative, '/'-separated paths. A key that is empty,
// absolute, or contains a ".." segment is rejected so no object
// can live outside its bucket.

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};
use walkdir::WalkDir;

use crate::domain::traits::{ObjectLocation, ObjectStore};

pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn bucket_dir(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() || bucket.contains(['/', '\\']) || bucket == "." || bucket == ".." {
            bail!("Invalid bucket name '{}'", bucket);
        }
        Ok(self.root.join(bucket))
    }

    /// Filesystem path of an object, after validating the key.
    fn object_path(&self, location: &ObjectLocation) -> Result<PathBuf> {
        let key = Path::new(&location.key);
        let safe = !location.key.is_empty()
            && key.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            bail!("Invalid object key '{}' in bucket '{}'", location.key, location.bucket);
        }
        Ok(self.bucket_dir(&location.bucket)?.join(key))
    }
}

impl ObjectStore for LocalObjectStore {
    fn download_file(&self, location: &ObjectLocation, dest: &Path) -> Result<()> {
        let src = self.object_path(location)?;
        if !src.is_file() {
            bail!("Object not found: {}", location);
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        fs::copy(&src, dest)
            .with_context(|| format!("Cannot download {} to '{}'", location, dest.display()))?;

        tracing::debug!("Downloaded {} → '{}'", location, dest.display());
        Ok(())
    }

    fn upload_file(&self, src: &Path, location: &ObjectLocation) -> Result<()> {
        let dest = self.object_path(location)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }
        fs::copy(src, &dest)
            .with_context(|| format!("Cannot upload '{}' to {}", src.display(), location))?;

        tracing::info!("Uploaded '{}' → {}", src.display(), location);
        Ok(())
    }

    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        if !bucket_dir.is_dir() {
            bail!("Bucket not found: {}", bucket);
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&bucket_dir) {
            let entry = entry.with_context(|| format!("Cannot list bucket '{}'", bucket))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&bucket_dir)
                .with_context(|| format!("'{}' escaped bucket '{}'", entry.path().display(), bucket))?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_then_download() {
        let root  = tempfile::tempdir().unwrap();
        let work  = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(root.path());

        let src = work.path().join("error_logs.csv");
        fs::write(&src, "error_message,recommended_action\n").unwrap();

        let loc = ObjectLocation::new("logs-poc", "data/error_logs.csv");
        store.upload_file(&src, &loc).unwrap();

        let dest = work.path().join("copy").join("error_logs.csv");
        store.download_file(&loc, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "error_message,recommended_action\n");
    }

    #[test]
    fn test_upload_data_uses_prefix_and_file_name() {
        let root  = tempfile::tempdir().unwrap();
        let work  = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(root.path());

        let src = work.path().join("train.csv");
        fs::write(&src, "x").unwrap();

        let loc = store.upload_data(&src, "logs-poc", "training").unwrap();
        assert_eq!(loc, ObjectLocation::new("logs-poc", "training/train.csv"));
        assert!(root.path().join("logs-poc/training/train.csv").is_file());
    }

    #[test]
    fn test_missing_object_is_an_error() {
        let root  = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(root.path());
        let err   = store
            .download_file(&ObjectLocation::new("logs-poc", "nope.csv"), &root.path().join("x"))
            .unwrap_err();
        assert!(err.to_string().contains("Object not found"));
    }

    #[test]
    fn test_traversal_keys_are_rejected() {
        let root  = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(root.path());
        for key in ["../escape.csv", "/etc/passwd", "", "a/../../b"] {
            let loc = ObjectLocation::new("logs-poc", key);
            assert!(store.object_path(&loc).is_err(), "key {key:?} accepted");
        }
        assert!(store.bucket_dir("..").is_err());
    }

    #[test]
    fn test_list_filters_by_prefix() {
        let root  = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(root.path());
        let bucket = root.path().join("logs-poc");
        fs::create_dir_all(bucket.join("job-1/output/model")).unwrap();
        fs::write(bucket.join("job-1/output/model/pipeline.json"), "{}").unwrap();
        fs::write(bucket.join("job-1/output/model/model.mpk.gz"), "w").unwrap();
        fs::write(bucket.join("other.csv"), "x").unwrap();

        let keys = store.list("logs-poc", "job-1/output/model/").unwrap();
        assert_eq!(
            keys,
            vec!["job-1/output/model/model.mpk.gz", "job-1/output/model/pipeline.json"]
        );
    }
}
