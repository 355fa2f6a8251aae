// ============================================================
// Layer 4 — Feature Batcher
// ============================================================
// Converts a Vec<EncodedSample> into tensors.
//
// How batching works here:
//   Input:  Vec of N EncodedSamples, each with V feature counts
//   Output: FeatureBatch with features [N, V] and targets [N]
//
//   We flatten all feature rows into one long Vec, then shape:
//   [s1_f1, s1_f2, ..., s1_fV, s2_f1, ..., sN_fV] → [N, V]
//
// Logistic regression is fitted full-batch, so in practice the
// whole training set becomes one FeatureBatch.
//
// Reference: Burn Book §4 (Batcher)

use burn::{prelude::*, tensor::TensorData};

use crate::data::dataset::EncodedSample;

/// Count features and class targets ready for the model.
/// B is the Burn Backend, generic so the same batcher serves
/// the autodiff training backend and the plain inference one.
#[derive(Debug, Clone)]
pub struct FeatureBatch<B: Backend> {
    /// Bag-of-words counts, shape [batch_size, n_features]
    pub features: Tensor<B, 2>,

    /// Class indices, shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct FeatureBatcher<B: Backend> {
    device:     B::Device,
    n_features: usize,
}

impl<B: Backend> FeatureBatcher<B> {
    pub fn new(device: B::Device, n_features: usize) -> Self {
        Self { device, n_features }
    }

    /// Stack `items` into one batch. `items` must be non-empty.
    pub fn batch(&self, items: Vec<EncodedSample>) -> FeatureBatch<B> {
        let batch_size = items.len();

        let targets: Vec<i64> = items.iter().map(|s| s.label as i64).collect();
        let flat:    Vec<f32> = items.into_iter().flat_map(|s| s.features).collect();

        FeatureBatch {
            features: self.features(flat, batch_size),
            targets:  Tensor::<B, 1, Int>::from_data(
                TensorData::new(targets, [batch_size]),
                &self.device,
            ),
        }
    }

    /// Shape a row-major count matrix into a [rows, n_features] tensor.
    pub fn features(&self, flat: Vec<f32>, rows: usize) -> Tensor<B, 2> {
        Tensor::<B, 2>::from_data(TensorData::new(flat, [rows, self.n_features]), &self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    #[test]
    fn test_batch_shapes() {
        let device  = Default::default();
        let batcher = FeatureBatcher::<NdArray>::new(device, 3);
        let batch   = batcher.batch(vec![
            EncodedSample { features: vec![1.0, 0.0, 2.0], label: 1 },
            EncodedSample { features: vec![0.0, 1.0, 0.0], label: 0 },
        ]);
        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(),  [2]);

        let targets: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();
        assert_eq!(targets, vec![1, 0]);
    }
}
