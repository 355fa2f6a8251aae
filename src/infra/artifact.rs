// ============================================================
// Layer 6 — Model Artifact Manager
// ============================================================
// Saves and restores the fitted pipeline.
//
// What gets saved in the model directory:
//   1. model.mpk.gz   classifier weights, full precision
//                      (Burn NamedMpkGzFileRecorder)
//   2. pipeline.json  vocabulary, label set, hyperparameters
//                      and the training report
//
// The weights alone are not enough to serve: the loader needs
// the vocabulary size and label count to rebuild the Linear
// layer before loading the weights into it, and it needs the
// vocabulary itself to vectorise incoming messages.
//
// File layout:
//   <model_dir>/
//     model.mpk.gz
//     pipeline.json
//
// An artifact is written once per training run and never
// modified afterwards.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::HyperParameters;
use crate::data::vectorizer::{CountVectorizer, LabelEncoder};
use crate::ml::model::ActionClassifier;
use crate::ml::trainer::TrainingReport;

/// Weights file name without extension; the recorder appends `.mpk.gz`
const MODEL_STEM: &str = "model";

/// Gzipped MessagePack with f32 weights, so a reload predicts exactly
/// what the trained model did
type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Weights file as it appears on disk
pub const MODEL_FILE: &str = "model.mpk.gz";

/// Vectorizer, labels and run metadata
pub const PIPELINE_FILE: &str = "pipeline.json";

/// Everything in the artifact except the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRecord {
    pub vectorizer:      CountVectorizer,
    pub labels:          LabelEncoder,
    pub hyperparameters: HyperParameters,
    pub report:          TrainingReport,
    pub created_at:      DateTime<Utc>,
}

/// Manages the files of one model directory.
pub struct ArtifactManager {
    dir: PathBuf,
}

impl ArtifactManager {
    /// Manager for `dir`. Nothing touches the filesystem until a save or load.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create model directory '{}'", self.dir.display()))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save classifier weights to `<dir>/model.mpk.gz`.
    pub fn save_model<B: Backend>(&self, model: &ActionClassifier<B>) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(MODEL_STEM);

        WeightsRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save model weights to '{}'", path.display()))?;

        tracing::debug!("Saved model weights to '{}'", self.dir.join(MODEL_FILE).display());
        Ok(())
    }

    /// Load weights into `model`, which must have the saved shape.
    pub fn load_model<B: Backend>(
        &self,
        model:  ActionClassifier<B>,
        device: &B::Device,
    ) -> Result<ActionClassifier<B>> {
        let path = self.dir.join(MODEL_STEM);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!(
                    "Cannot load model weights from '{}'. Has a training job written this directory?",
                    self.dir.display()
                )
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_pipeline(&self, pipeline: &PipelineRecord) -> Result<()> {
        self.ensure_dir()?;
        let path = self.dir.join(PIPELINE_FILE);
        let json = serde_json::to_string_pretty(pipeline)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write pipeline to '{}'", path.display()))?;

        tracing::debug!("Saved pipeline to '{}'", path.display());
        Ok(())
    }

    pub fn load_pipeline(&self) -> Result<PipelineRecord> {
        let path = self.dir.join(PIPELINE_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read pipeline from '{}'. Make sure the model was trained first.",
                path.display()
            )
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Corrupt pipeline file '{}'", path.display()))
    }

    /// Paths of every artifact file. Fails if one is missing.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        let files: Vec<PathBuf> = [MODEL_FILE, PIPELINE_FILE]
            .iter()
            .map(|name| self.dir.join(name))
            .collect();

        if let Some(missing) = files.iter().find(|p| !p.is_file()) {
            bail!("Incomplete model artifact: '{}' is missing", missing.display());
        }
        Ok(files)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::ActionClassifierConfig;
    use crate::ml::InferBackend;

    fn report() -> TrainingReport {
        TrainingReport {
            iterations_run:      10,
            converged:           false,
            final_loss:          0.5,
            train_samples:       2,
            validation_samples:  0,
            train_accuracy:      1.0,
            validation_accuracy: None,
        }
    }

    #[test]
    fn test_pipeline_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ArtifactManager::new(dir.path());
        let pipeline = PipelineRecord {
            vectorizer:      CountVectorizer::fit(&["disk full".to_string()]).unwrap(),
            labels:          LabelEncoder::fit(&["a".to_string(), "b".to_string()]).unwrap(),
            hyperparameters: HyperParameters::default(),
            report:          report(),
            created_at:      Utc::now(),
        };
        mgr.save_pipeline(&pipeline).unwrap();

        let loaded = mgr.load_pipeline().unwrap();
        assert_eq!(loaded.vectorizer, pipeline.vectorizer);
        assert_eq!(loaded.labels,     pipeline.labels);
        assert_eq!(loaded.report,     pipeline.report);
    }

    #[test]
    fn test_files_requires_both_parts() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = ArtifactManager::new(dir.path());
        assert!(mgr.files().is_err());

        let device = Default::default();
        let model: ActionClassifier<InferBackend> = ActionClassifierConfig::new(3, 2).init(&device);
        mgr.save_model(&model).unwrap();
        assert!(dir.path().join(MODEL_FILE).is_file());
        assert!(mgr.files().is_err());

        fs::write(dir.path().join(PIPELINE_FILE), "{}").unwrap();
        assert_eq!(mgr.files().unwrap().len(), 2);
    }

    #[test]
    fn test_weights_round_trip_at_full_precision() {
        use crate::data::batcher::FeatureBatcher;
        use crate::data::dataset::{ActionDataset, EncodedSample};
        use crate::ml::trainer::fit;

        let samples = (0..3)
            .map(|class| {
                let mut features = vec![0.0; 3];
                features[class] = 1.0;
                EncodedSample { features, label: class }
            })
            .collect();
        let hp = HyperParameters { max_iter: 20, ..HyperParameters::default() };
        let (trained, _) = fit(
            ActionDataset::from_samples(samples, 3),
            ActionDataset::from_samples(Vec::new(), 3),
            3,
            &hp,
            None,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let mgr = ArtifactManager::new(dir.path().join("model"));
        mgr.save_model(&trained).unwrap();
        assert!(dir.path().join("model").join(MODEL_FILE).is_file());

        let device = Default::default();
        let blank: ActionClassifier<InferBackend> = ActionClassifierConfig::new(3, 3).init(&device);
        let loaded = mgr.load_model(blank, &device).unwrap();

        let batcher = FeatureBatcher::<InferBackend>::new(device, 3);
        let x = || batcher.features(vec![1.0, 0.0, 0.0, 0.0, 2.0, 1.0], 2);
        let before = trained.forward(x()).into_data().to_vec::<f32>().unwrap();
        let after  = loaded.forward(x()).into_data().to_vec::<f32>().unwrap();
        assert_eq!(before, after);
        assert_eq!(trained.predict_indices(x()), loaded.predict_indices(x()));
    }

    #[test]
    fn test_new_leaves_filesystem_untouched() {
        let dir     = tempfile::tempdir().unwrap();
        let missing = dir.path().join("typo");
        let mgr     = ArtifactManager::new(&missing);
        assert!(mgr.load_pipeline().is_err());
        assert!(mgr.files().is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_load_pipeline_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ArtifactManager::new(dir.path()).load_pipeline().unwrap_err();
        assert!(err.to_string().contains("pipeline.json"));
    }
}
