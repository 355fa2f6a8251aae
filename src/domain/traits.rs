// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// By programming against traits instead of concrete types,
// we can swap implementations without changing the code
// that uses them. For example:
//   - LocalObjectStore implements ObjectStore
//   - A remote bucket client could also implement ObjectStore
//   - The application layer only sees ObjectStore
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::training_record::TrainingDataset;

// ─── ObjectLocation ───────────────────────────────────────────────────────────
/// A (bucket, key) pair naming one stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key:    String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self { bucket: bucket.into(), key: key.into() }
    }

    /// Location of `file_name` under this location treated as a prefix
    pub fn child(&self, file_name: &str) -> Self {
        let key = if self.key.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{}", self.key.trim_end_matches('/'), file_name)
        };
        Self { bucket: self.bucket.clone(), key }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store://{}/{}", self.bucket, self.key)
    }
}

// ─── ObjectStore ──────────────────────────────────────────────────────────────
/// Bucket/key object storage.
///
/// Implementations:
///   - LocalObjectStore → buckets are directories under a root
pub trait ObjectStore {
    /// Copy the object to `dest`, creating parent directories.
    /// Fails if the object does not exist.
    fn download_file(&self, location: &ObjectLocation, dest: &Path) -> Result<()>;

    /// Store the local file at `location`, replacing any existing object.
    fn upload_file(&self, src: &Path, location: &ObjectLocation) -> Result<()>;

    /// Keys in `bucket` starting with `prefix`, sorted.
    fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>>;

    /// Upload `path` as `<key_prefix>/<file name>` and return where it went.
    fn upload_data(&self, path: &Path, bucket: &str, key_prefix: &str) -> Result<ObjectLocation> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("'{}' has no file name", path.display()))?;
        let location = ObjectLocation::new(bucket, key_prefix).child(file_name);
        self.upload_file(path, &location)?;
        Ok(location)
    }
}

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce a training dataset.
///
/// Implementations:
///   - CsvLoader → reads a CSV file with the two training columns
pub trait RecordSource {
    fn load_records(&self) -> Result<TrainingDataset>;
}

// ─── ActionPredictor ──────────────────────────────────────────────────────────
/// Any component that maps error messages to remediation actions.
///
/// Implementations:
///   - Inferencer → bag-of-words logistic regression
pub trait ActionPredictor {
    /// One label per message, in input order.
    fn predict(&self, messages: &[String]) -> Result<Vec<String>>;

    /// The fixed label set the predictor can emit.
    fn labels(&self) -> &[String];
}
