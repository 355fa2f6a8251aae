// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Shuffles samples and splits them into two sets:
//   - Training set:   used to fit the classifier
//   - Validation set: used to report accuracy on unseen data
//
// The shuffle is seeded so the same data and seed always give
// the same split, so a retrained artifact is reproducible.
//
// A fraction of 1.0 keeps everything for training, which is
// the default for small hand-labelled datasets.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, validation).
///
/// # Arguments
/// * `samples`        - All available samples (consumed by this function)
/// * `train_fraction` - Proportion for training, e.g. 0.8 = 80%
/// * `seed`           - RNG seed for the shuffle
pub fn split_train_val<T>(mut samples: Vec<T>, train_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    // Nothing to hold out: keep the original order
    if train_fraction >= 1.0 {
        return (samples, Vec::new());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    // e.g. 100 samples * 0.8 = 80 → first 80 are training
    let total    = samples.len();
    let split_at = ((total as f64) * train_fraction.max(0.0)).round() as usize;
    let split_at = split_at.min(total);

    // After this: samples = [0..split_at], val = [split_at..total]
    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        val.len(),
    );

    (samples, val)
}
