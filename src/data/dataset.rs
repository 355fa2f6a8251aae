use serde::{Deserialize, Serialize};

use crate::data::vectorizer::{CountVectorizer, LabelEncoder};
use crate::domain::training_record::TrainingDataset;

/// One vectorised training sample: bag-of-words counts plus class index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedSample {
    pub features: Vec<f32>,
    pub label:    usize,
}

pub struct ActionDataset {
    samples:    Vec<EncodedSample>,
    n_features: usize,
}

impl ActionDataset {
    /// Vectorise every record. Labels missing from `labels` are skipped
    /// with a warning, which only happens when the encoder was fitted on
    /// a different dataset.
    pub fn encode(
        dataset:    &TrainingDataset,
        vectorizer: &CountVectorizer,
        labels:     &LabelEncoder,
    ) -> Self {
        let samples = dataset
            .records()
            .iter()
            .filter_map(|r| match labels.encode(&r.recommended_action) {
                Some(label) => Some(EncodedSample {
                    features: vectorizer.transform_one(&r.error_message),
                    label,
                }),
                None => {
                    tracing::warn!("Skipping record with unknown label '{}'", r.recommended_action);
                    None
                }
            })
            .collect();
        Self { samples, n_features: vectorizer.n_features() }
    }

    #[cfg(test)]
    pub fn from_samples(samples: Vec<EncodedSample>, n_features: usize) -> Self {
        Self { samples, n_features }
    }

    pub fn samples(&self) -> &[EncodedSample] { &self.samples }

    pub fn into_samples(self) -> Vec<EncodedSample> { self.samples }

    pub fn n_features(&self) -> usize { self.n_features }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::training_record::TrainingRecord;

    #[test]
    fn test_encode_aligns_features_and_labels() {
        let ds = TrainingDataset::new(vec![
            TrainingRecord::new("disk full", "free space"),
            TrainingRecord::new("upi timeout", "retry payment"),
        ]);
        let (messages, actions) = ds.clone().into_columns();
        let vec  = CountVectorizer::fit(&messages).unwrap();
        let enc  = LabelEncoder::fit(&actions).unwrap();
        let data = ActionDataset::encode(&ds, &vec, &enc);

        assert_eq!(data.len(), 2);
        assert_eq!(data.n_features(), 4);
        let first = &data.samples()[0];
        assert_eq!(first.label, 0);
        assert_eq!(first.features.iter().sum::<f32>(), 2.0);
    }
}
