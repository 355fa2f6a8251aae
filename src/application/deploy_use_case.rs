// ============================================================
// Layer 2 — DeployUseCase
// ============================================================
// The end-to-end workflow, one stage after another:
//
//   Stage 1: prepare data    store → (messages, actions)
//   Stage 2: persist         <work_dir>/train.csv
//   Stage 3: upload          <bucket>/training/train.csv
//   Stage 4: train           TrainingJob → <bucket>/<job>/output/model/
//   Stage 5: deploy          download model → load → serve → register
//   Stage 6: smoke test      ["Error 500: Internal Server Error"]
//
// Stages 1-5 abort the run, with the stage name on the error.
// The smoke test only reports; the endpoint keeps serving.
//
// `train` is synchronous. Hosting (`deploy`, `smoke_test`,
// `teardown`) runs on the caller's Tokio runtime.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::{
    handler,
    prepare_data::prepare_data,
    train_use_case::HyperParameters,
    training_job::{ExecutionMode, TrainingJob, TrainingJobDescription},
};
use crate::data::loader::{write_csv, TRAIN_FILE_NAME};
use crate::domain::training_record::TrainingDataset;
use crate::domain::traits::{ObjectLocation, ObjectStore};
use crate::infra::{
    endpoint_client::{EndpointClient, InvokeError},
    endpoint_registry::{EndpointRecord, EndpointRegistry},
    endpoint_server::{share, EndpointServer},
    object_store::LocalObjectStore,
};

/// Key prefix the training channel is uploaded under
pub const TRAINING_PREFIX: &str = "training";

/// Message sent to a freshly deployed endpoint
pub const SMOKE_TEST_MESSAGE: &str = "Error 500: Internal Server Error";

// ─── Configuration ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Root directory of the local object store
    pub store_root:      PathBuf,
    pub bucket:          String,
    /// Key of the labelled CSV inside `bucket`
    pub data_key:        String,
    /// Scratch space: train.csv, jobs/, endpoints/
    pub work_dir:        PathBuf,
    pub base_job_name:   String,
    pub endpoint_name:   String,
    /// Address the endpoint binds to
    pub bind:            String,
    pub registry_path:   PathBuf,
    pub hyperparameters: HyperParameters,
    pub mode:            ExecutionMode,
}

/// A running, registered endpoint
#[derive(Debug)]
pub struct Deployment {
    pub record: EndpointRecord,
    server:     EndpointServer,
    registry:   EndpointRegistry,
}

impl Deployment {
    pub fn url(&self) -> &str {
        &self.record.url
    }
}

// ─── Hosting ──────────────────────────────────────────────────────────────────

/// Load `model_dir`, serve it on `bind` and register it under `name`.
/// The endpoint is only registered once it answers /ping.
pub async fn host(
    name:          &str,
    model_dir:     &Path,
    bind:          &str,
    registry_path: &Path,
) -> Result<Deployment> {
    let model  = handler::load_model(model_dir)?;
    let server = EndpointServer::start(bind, name, share(model)).await?;

    match EndpointClient::new(server.url()).ping().await {
        Ok(true) => tracing::debug!("Endpoint '{}' is healthy", name),
        outcome => {
            let url = server.url();
            server.shutdown().await?;
            match outcome {
                Err(e) => bail!("Endpoint '{}' at {} failed its health check: {}", name, url, e),
                Ok(_)  => bail!("Endpoint '{}' at {} failed its health check", name, url),
            }
        }
    }

    let record = EndpointRecord {
        name:       name.to_string(),
        url:        server.url(),
        model_dir:  model_dir.to_path_buf(),
        created_at: Utc::now(),
    };
    let registry = EndpointRegistry::new(registry_path);
    registry.register(record.clone())?;

    Ok(Deployment { record, server, registry })
}

/// Deregister and stop a deployment.
pub async fn teardown(deployment: Deployment) -> Result<()> {
    let Deployment { record, server, registry } = deployment;
    registry.deregister(&record.name)?;
    server.shutdown().await
}

// ─── DeployUseCase ────────────────────────────────────────────────────────────
pub struct DeployUseCase {
    config: DeployConfig,
    store:  Box<dyn ObjectStore>,
}

impl DeployUseCase {
    pub fn new(config: DeployConfig) -> Self {
        let store = Box::new(LocalObjectStore::new(&config.store_root));
        Self { config, store }
    }

    /// Stages 1-4: from the raw CSV in storage to a trained model in storage.
    pub fn train(&self) -> Result<TrainingJobDescription> {
        let cfg = &self.config;

        // ── Stage 1: Prepare data ─────────────────────────────────────────────
        let (messages, actions) = prepare_data(&*self.store, &cfg.bucket, &cfg.data_key, &cfg.work_dir)
            .context("Stage 'prepare data' failed")?;

        // ── Stage 2: Persist locally ──────────────────────────────────────────
        let train_csv = cfg.work_dir.join(TRAIN_FILE_NAME);
        write_csv(&TrainingDataset::from_columns(messages, actions), &train_csv)
            .context("Stage 'persist training data' failed")?;

        // ── Stage 3: Upload ───────────────────────────────────────────────────
        let uploaded = self
            .store
            .upload_data(&train_csv, &cfg.bucket, TRAINING_PREFIX)
            .context("Stage 'upload training data' failed")?;
        tracing::info!("Training data uploaded to {}", uploaded);

        // ── Stage 4: Train ────────────────────────────────────────────────────
        let job = TrainingJob::new(
            &*self.store,
            &cfg.base_job_name,
            &cfg.bucket,
            cfg.work_dir.join("jobs"),
            cfg.hyperparameters.clone(),
            cfg.mode.clone(),
        )
        .fit(&ObjectLocation::new(&cfg.bucket, TRAINING_PREFIX))
        .context("Stage 'train' failed")?;

        Ok(job)
    }

    /// Stage 5: fetch the job's model and put it behind an endpoint.
    pub async fn deploy(&self, job: &TrainingJobDescription) -> Result<Deployment> {
        let cfg       = &self.config;
        let model_dir = self.stage_model(job).context("Stage 'deploy' failed")?;
        host(&cfg.endpoint_name, &model_dir, &cfg.bind, &cfg.registry_path)
            .await
            .context("Stage 'deploy' failed")
    }

    /// Stage 6: one request against the live endpoint.
    pub async fn smoke_test(&self, deployment: &Deployment) -> Result<Vec<String>, InvokeError> {
        EndpointClient::new(deployment.url())
            .predict(&[SMOKE_TEST_MESSAGE.to_string()])
            .await
    }

    fn endpoint_model_dir(&self) -> PathBuf {
        self.config
            .work_dir
            .join("endpoints")
            .join(&self.config.endpoint_name)
            .join("model")
    }

    /// Download every model object of `job` into a fresh endpoint model dir.
    fn stage_model(&self, job: &TrainingJobDescription) -> Result<PathBuf> {
        let source: ObjectLocation = job
            .model_artifacts
            .as_ref()
            .map(Into::into)
            .with_context(|| format!("Training job '{}' has no model artifacts", job.job_name))?;

        let model_dir = self.endpoint_model_dir();
        if model_dir.exists() {
            fs::remove_dir_all(&model_dir)
                .with_context(|| format!("Cannot clear '{}'", model_dir.display()))?;
        }

        let prefix = format!("{}/", source.key.trim_end_matches('/'));
        for key in self.store.list(&source.bucket, &prefix)? {
            let dest = model_dir.join(&key[prefix.len()..]);
            self.store.download_file(&ObjectLocation::new(&source.bucket, &key), &dest)?;
        }
        tracing::info!("Model from job '{}' staged in '{}'", job.job_name, model_dir.display());
        Ok(model_dir)
    }
}
