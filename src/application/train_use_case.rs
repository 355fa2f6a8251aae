// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// The training entry point. Given a channel directory holding
// train.csv, it writes a model artifact into the model
// directory:
//
//   Step 1: Load train.csv                 (Layer 4 - data)
//   Step 2: Optional seeded holdout split  (Layer 4 - data)
//   Step 3: Fit vectorizer + label set     (Layer 4 - data)
//   Step 4: Vectorise both splits          (Layer 4 - data)
//   Step 5: Fit the classifier             (Layer 5 - ml)
//   Step 6: Save weights + pipeline        (Layer 6 - infra)
//
// The `train` subcommand defaults these directories to the
// usual training-container layout (/opt/ml/...), so the same
// binary runs unchanged inside a job sandbox.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::data::{
    dataset::ActionDataset,
    loader::CsvLoader,
    splitter::split_train_val,
    vectorizer::{CountVectorizer, LabelEncoder},
};
use crate::domain::training_record::TrainingDataset;
use crate::domain::traits::RecordSource;
use crate::infra::{
    artifact::{ArtifactManager, PipelineRecord},
    metrics::MetricsLogger,
};
use crate::ml::trainer::{fit, TrainingReport};

// ─── Hyperparameters ─────────────────────────────────────────────────────────
// Serialisable so a job can hand them to the training entry
// point as hyperparameters.json, and so the artifact records
// how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperParameters {
    /// Upper bound on optimiser iterations
    pub max_iter:               usize,
    pub learning_rate:          f64,
    /// C: smaller values mean stronger L2 regularisation
    pub inverse_regularization: f64,
    /// Stop once the loss changes by less than this between iterations
    pub tolerance:              f64,
    /// Share of records held out for validation (0.0 = none)
    pub validation_fraction:    f64,
    pub seed:                   u64,
    /// Write a metrics row every N iterations (0 = never)
    pub log_every:              usize,
}

impl Default for HyperParameters {
    fn default() -> Self {
        Self {
            max_iter:               1000,
            learning_rate:          0.1,
            inverse_regularization: 1.0,
            tolerance:              1e-6,
            validation_fraction:    0.0,
            seed:                   42,
            log_every:              50,
        }
    }
}

impl HyperParameters {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read hyperparameters '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid hyperparameters in '{}'", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Cannot write hyperparameters '{}'", path.display()))
    }
}

// ─── Training Configuration ──────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Directory containing train.csv
    pub train_dir:       PathBuf,
    /// Where the model artifact is written
    pub model_dir:       PathBuf,
    /// Where metrics and other run outputs are written
    pub output_data_dir: PathBuf,
    pub hyperparameters: HyperParameters,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;
        let hp  = &cfg.hyperparameters;

        // ── Step 1: Load the training CSV ─────────────────────────────────────
        tracing::info!("Loading training data from '{}'", cfg.train_dir.display());
        let dataset = CsvLoader::in_channel(&cfg.train_dir).load_records()?;

        // ── Step 2: Holdout split ─────────────────────────────────────────────
        let (train_records, val_records) = split_train_val(
            dataset.into_records(),
            1.0 - hp.validation_fraction,
            hp.seed,
        );
        let train_set = TrainingDataset::new(train_records);
        let val_set   = TrainingDataset::new(val_records);
        tracing::info!("Split: {} train, {} validation", train_set.len(), val_set.len());

        // ── Step 3: Fit vectorizer and label set on the training split ────────
        let (messages, actions) = train_set.clone().into_columns();
        let vectorizer = CountVectorizer::fit(&messages)?;
        let labels     = LabelEncoder::fit(&actions)?;
        tracing::info!(
            "Vocabulary: {} tokens, {} actions",
            vectorizer.n_features(),
            labels.n_classes()
        );

        // ── Step 4: Vectorise ─────────────────────────────────────────────────
        let train_data = ActionDataset::encode(&train_set, &vectorizer, &labels);
        let val_data   = ActionDataset::encode(&val_set, &vectorizer, &labels);

        // ── Step 5: Fit ───────────────────────────────────────────────────────
        let metrics = MetricsLogger::new(&cfg.output_data_dir)?;
        let (model, report) = fit(train_data, val_data, labels.n_classes(), hp, Some(&metrics))?;
        tracing::info!("Metrics written to '{}'", metrics.csv_path().display());

        // ── Step 6: Save the artifact ─────────────────────────────────────────
        let artifacts = ArtifactManager::new(&cfg.model_dir);
        artifacts.save_model(&model)?;
        artifacts.save_pipeline(&PipelineRecord {
            vectorizer,
            labels,
            hyperparameters: hp.clone(),
            report:          report.clone(),
            created_at:      Utc::now(),
        })?;
        tracing::info!("Model artifact written to '{}'", cfg.model_dir.display());

        Ok(report)
    }
}
