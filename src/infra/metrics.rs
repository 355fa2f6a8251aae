// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file while the optimiser runs.
//
// Metrics recorded per logged iteration:
//   - iteration:      the optimiser step (1, 2, 3, ...)
//   - loss:           regularised cross-entropy on the training set
//   - train_accuracy: fraction of training messages classified right
//
// Output file: <output-data-dir>/metrics.csv
//
// Example CSV output:
//   iteration,loss,train_accuracy
//   50,0.412300,1.000000
//   100,0.298100,1.000000
//
// How to read the metrics:
//   - Loss should fall quickly, then flatten out
//   - A flat loss well above zero with low accuracy means the
//     labels are not separable by vocabulary alone

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

/// One row of metrics for a single logged iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationMetrics {
    pub iteration: usize,

    /// Regularised training loss at this step
    pub loss: f64,

    /// Range: [0.0, 1.0]
    pub train_accuracy: f64,
}

impl IterationMetrics {
    pub fn new(iteration: usize, loss: f64, train_accuracy: f64) -> Self {
        Self { iteration, loss, train_accuracy }
    }
}

/// Appends iteration metrics to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger in `dir`.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");

        // Header only for a new file, so reruns append
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "iteration,loss,train_accuracy")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one row.
    pub fn log(&self, m: &IterationMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(f, "{},{:.6},{:.6}", m.iteration, m.loss, m.train_accuracy)?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
