// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full-batch fit of the logistic-regression classifier with Adam.
//
// Every iteration sees the whole training set:
//
//   loss = mean CE(W·x + b, y) + λ·||W||²      λ = 1 / (2·C·n)
//
// which is the usual "sum of log-losses + ||W||² / 2C" objective
// divided by n. The loop stops after `max_iter` iterations or
// as soon as the loss moves by less than `tolerance`.
//
// Key Burn insight:
//   - Training uses TrainBackend (Autodiff<NdArray>) for gradients
//   - model.valid() returns the model on InferBackend (NdArray)
//   - Anything evaluated after training must use InferBackend
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{bail, Result};
use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::HyperParameters;
use crate::data::{batcher::FeatureBatcher, dataset::ActionDataset};
use crate::infra::metrics::{IterationMetrics, MetricsLogger};
use crate::ml::model::{ActionClassifier, ActionClassifierConfig};
use crate::ml::{InferBackend, TrainBackend};

/// Summary of one fit, stored inside the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub iterations_run:      usize,
    pub converged:           bool,
    pub final_loss:          f64,
    pub train_samples:       usize,
    pub validation_samples:  usize,
    pub train_accuracy:      f64,
    /// None when no validation split was requested
    pub validation_accuracy: Option<f64>,
}

/// Fit a classifier on `train`; report accuracy on `validation` if non-empty.
pub fn fit(
    train:      ActionDataset,
    validation: ActionDataset,
    n_classes:  usize,
    hp:         &HyperParameters,
    metrics:    Option<&MetricsLogger>,
) -> Result<(ActionClassifier<InferBackend>, TrainingReport)> {
    if train.is_empty() {
        bail!("No training samples left after the validation split");
    }
    if hp.max_iter == 0 {
        bail!("max_iter must be at least 1");
    }
    if hp.inverse_regularization <= 0.0 {
        bail!("inverse_regularization must be positive, got {}", hp.inverse_regularization);
    }

    let device        = burn::backend::ndarray::NdArrayDevice::default();
    let n_features    = train.n_features();
    let train_samples = train.len();
    let train_targets: Vec<usize> = train.samples().iter().map(|s| s.label).collect();

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: ActionClassifier<TrainBackend> =
        ActionClassifierConfig::new(n_features, n_classes).init(&device);
    tracing::info!(
        "Model ready: {} features → {} classes, {} samples",
        n_features, n_classes, train_samples
    );

    // ── Adam optimiser ────────────────────────────────────────────────────────
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init();

    // ── One batch holds the whole training set ────────────────────────────────
    let batcher = FeatureBatcher::<TrainBackend>::new(device.clone(), n_features);
    let batch   = batcher.batch(train.into_samples());

    let l2_strength = 0.5 / (hp.inverse_regularization * train_samples as f64);

    let mut previous_loss  = f64::INFINITY;
    let mut final_loss     = f64::NAN;
    let mut iterations_run = 0usize;
    let mut converged      = false;

    // ── Iteration loop ────────────────────────────────────────────────────────
    for iteration in 1..=hp.max_iter {
        let loss = model.forward_loss(batch.features.clone(), batch.targets.clone(), l2_strength);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass + Adam update
        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        model = optim.step(hp.learning_rate, model, grads);

        iterations_run = iteration;
        final_loss     = loss_val;
        converged      = (previous_loss - loss_val).abs() < hp.tolerance;

        if hp.log_every > 0 && (iteration % hp.log_every == 0 || converged) {
            let predicted = model.predict_indices(batch.features.clone());
            let row = IterationMetrics::new(iteration, loss_val, accuracy(&predicted, &train_targets));
            tracing::debug!(
                "Iteration {:>4}/{} | loss={:.6} | train_acc={:.1}%",
                iteration, hp.max_iter, loss_val, row.train_accuracy * 100.0
            );
            if let Some(logger) = metrics {
                logger.log(&row)?;
            }
        }

        if converged {
            tracing::info!("Converged after {} iterations (loss={:.6})", iteration, loss_val);
            break;
        }
        previous_loss = loss_val;
    }

    if !converged {
        tracing::warn!(
            "Stopped at max_iter={} without reaching tolerance {:e}",
            hp.max_iter, hp.tolerance
        );
    }

    // ── Evaluate on the inference backend ─────────────────────────────────────
    let model = model.valid();

    let inner_batcher  = FeatureBatcher::<InferBackend>::new(device, n_features);
    let train_features = batch.features.inner();
    let train_accuracy = accuracy(&model.predict_indices(train_features), &train_targets);

    let validation_samples  = validation.len();
    let validation_accuracy = if validation.is_empty() {
        None
    } else {
        let targets: Vec<usize> = validation.samples().iter().map(|s| s.label).collect();
        let val_batch = inner_batcher.batch(validation.into_samples());
        Some(accuracy(&model.predict_indices(val_batch.features), &targets))
    };

    let report = TrainingReport {
        iterations_run,
        converged,
        final_loss,
        train_samples,
        validation_samples,
        train_accuracy,
        validation_accuracy,
    };
    tracing::info!(
        "Training finished: loss={:.6}, train_acc={:.1}%, val_acc={}",
        report.final_loss,
        report.train_accuracy * 100.0,
        report
            .validation_accuracy
            .map(|a| format!("{:.1}%", a * 100.0))
            .unwrap_or_else(|| "n/a".to_string()),
    );

    Ok((model, report))
}

/// Fraction of positions where `predicted` equals `targets`.
pub fn accuracy(predicted: &[usize], targets: &[usize]) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    let correct = predicted.iter().zip(targets).filter(|(p, t)| p == t).count();
    correct as f64 / targets.len() as f64
}
