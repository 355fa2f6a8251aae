// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from the raw training CSV
// all the way to tensor batches.
//
// The pipeline flows in this order:
//
//   train.csv
//       │
//       ▼
//   CsvLoader         → reads rows, validates both columns
//       │
//       ▼
//   split_train_val   → optional seeded holdout of the records
//       │
//       ▼
//   CountVectorizer   → bag-of-words count vectors
//   LabelEncoder      → action label → class index
//                       (both fitted on the training split)
//       │
//       ▼
//   ActionDataset     → vectorised samples, one per split
//       │
//       ▼
//   FeatureBatcher    → stacks samples into tensors
//
// Each module is responsible for exactly one step.

/// Reads and writes the training CSV
pub mod loader;

/// Tokeniser, count vectorizer and label encoder
pub mod vectorizer;

/// Vectorised samples
pub mod dataset;

/// Turns samples into Burn tensors
pub mod batcher;

/// Seeded train/validation split
pub mod splitter;
