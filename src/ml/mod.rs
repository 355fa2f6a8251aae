// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains ALL Burn model and optimiser code.
//
// What's in this layer:
//
//   model.rs      Multinomial logistic regression
//                   (one Linear layer, zero-initialised,
//                   cross-entropy + L2 loss)
//
//   trainer.rs    Full-batch Adam loop with early stopping,
//                   per-iteration metrics and a TrainingReport
//
//   inferencer.rs Loads an artifact and maps messages to
//                   action labels
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)

/// Backend for training: CPU tensors with gradient tracking
pub type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

/// Backend for evaluation and serving
pub type InferBackend = burn::backend::NdArray;

/// Logistic-regression classifier
pub mod model;

/// Training loop
pub mod trainer;

/// Inference engine
pub mod inferencer;
