// ============================================================
// Layer 5 — Inferencer
// ============================================================
// The fitted pipeline: vectorizer → classifier → label decode.
// Built either straight from a training run or from an artifact
// directory, and used by the endpoint for every prediction.

use anyhow::{anyhow, Result};

use crate::data::batcher::FeatureBatcher;
use crate::data::vectorizer::{CountVectorizer, LabelEncoder};
use crate::domain::traits::ActionPredictor;
use crate::infra::artifact::ArtifactManager;
use crate::ml::model::{ActionClassifier, ActionClassifierConfig};
use crate::ml::InferBackend;

pub struct Inferencer {
    vectorizer: CountVectorizer,
    labels:     LabelEncoder,
    model:      ActionClassifier<InferBackend>,
    batcher:    FeatureBatcher<InferBackend>,
}

impl Inferencer {
    pub fn new(
        vectorizer: CountVectorizer,
        labels:     LabelEncoder,
        model:      ActionClassifier<InferBackend>,
    ) -> Self {
        let device  = burn::backend::ndarray::NdArrayDevice::default();
        let batcher = FeatureBatcher::new(device, vectorizer.n_features());
        Self { vectorizer, labels, model, batcher }
    }

    /// Load a model from an artifact directory.
    pub fn from_artifact(artifacts: &ArtifactManager) -> Result<Self> {
        artifacts.files()?;
        let device   = burn::backend::ndarray::NdArrayDevice::default();
        let pipeline = artifacts.load_pipeline()?;

        let model_cfg = ActionClassifierConfig::new(
            pipeline.vectorizer.n_features(),
            pipeline.labels.n_classes(),
        );
        let model: ActionClassifier<InferBackend> = model_cfg.init(&device);
        let model = artifacts.load_model(model, &device)?;

        tracing::info!(
            "Model loaded from '{}': {} features, {} actions",
            artifacts.dir().display(),
            pipeline.vectorizer.n_features(),
            pipeline.labels.n_classes(),
        );
        Ok(Self::new(pipeline.vectorizer, pipeline.labels, model))
    }
}

impl ActionPredictor for Inferencer {
    fn predict(&self, messages: &[String]) -> Result<Vec<String>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let features = self.batcher.features(self.vectorizer.transform(messages), messages.len());
        let indices  = self.model.predict_indices(features);

        let predictions = indices
            .into_iter()
            .map(|idx| {
                self.labels
                    .decode(idx)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("Model produced class index {idx} outside the label set"))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Predicted {} labels", predictions.len());
        Ok(predictions)
    }

    fn labels(&self) -> &[String] {
        self.labels.classes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_artifact_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pipeline.json"), "{}").unwrap();

        let err = Inferencer::from_artifact(&ArtifactManager::new(dir.path()))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Incomplete model artifact"));
    }
}
