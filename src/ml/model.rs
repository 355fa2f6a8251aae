use burn::{
    nn::{loss::CrossEntropyLossConfig, Initializer, Linear, LinearConfig},
    prelude::*,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally; do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ActionClassifierConfig {
    /// Vocabulary size of the fitted vectorizer
    pub n_features: usize,
    /// Number of distinct remediation actions
    pub n_classes:  usize,
}

impl ActionClassifierConfig {
    /// Weights and bias start at zero, so every run is identical.
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActionClassifier<B> {
        let linear = LinearConfig::new(self.n_features, self.n_classes)
            .with_initializer(Initializer::Zeros)
            .init(device);
        ActionClassifier { linear }
    }
}

/// Multinomial logistic regression: one affine map from count
/// features to per-class logits, softmax applied by the loss.
#[derive(Module, Debug)]
pub struct ActionClassifier<B: Backend> {
    pub linear: Linear<B>,
}

impl<B: Backend> ActionClassifier<B> {
    /// features: [batch, n_features] → logits: [batch, n_classes]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        self.linear.forward(features)
    }

    /// Mean cross-entropy plus `l2_strength * ||W||²`.
    /// The bias is not penalised.
    pub fn forward_loss(
        &self,
        features:    Tensor<B, 2>,
        targets:     Tensor<B, 1, Int>,
        l2_strength: f64,
    ) -> Tensor<B, 1> {
        let logits = self.forward(features);
        let ce = CrossEntropyLossConfig::new().init(&logits.device());
        let data_loss = ce.forward(logits, targets);

        let weights = self.linear.weight.val();
        let penalty = (weights.clone() * weights).sum().mul_scalar(l2_strength);

        data_loss + penalty
    }

    /// Most likely class index per row.
    pub fn predict_indices(&self, features: Tensor<B, 2>) -> Vec<usize> {
        self.forward(features)
            .argmax(1)
            .into_data()
            .iter::<i64>()
            .map(|idx| idx as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    #[test]
    fn test_zero_init_gives_uniform_logits() {
        let device = Default::default();
        let model: ActionClassifier<NdArray> = ActionClassifierConfig::new(4, 3).init(&device);
        let x = Tensor::<NdArray, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 2.0, 1.0], [1, 4]),
            &device,
        );
        let logits: Vec<f32> = model.forward(x).into_data().iter::<f32>().collect();
        assert_eq!(logits, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_predict_indices_one_per_row() {
        let device = Default::default();
        let model: ActionClassifier<NdArray> = ActionClassifierConfig::new(2, 3).init(&device);
        let x = Tensor::<NdArray, 2>::from_data(TensorData::new(vec![0.0f32; 10], [5, 2]), &device);
        assert_eq!(model.predict_indices(x).len(), 5);
    }
}
