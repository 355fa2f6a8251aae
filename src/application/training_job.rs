// ============================================================
// Layer 2 — Training Job
// ============================================================
// Runs the training entry point in a private job directory,
// the way a managed training service would:
//
//   <jobs_root>/<job_name>/
//     job.json                          ← TrainingJobDescription
//     input/config/hyperparameters.json
//     input/data/train/train.csv        ← downloaded channel objects
//     model/                            ← artifact written here
//     output/data/metrics.csv
//
// When training succeeds, every file under model/ is uploaded to
//   <bucket>/<job_name>/output/model/<file>
//
// Job names carry a millisecond timestamp:
//   logs-error-model-2025-05-03-20-09-24-417

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};
use walkdir::WalkDir;

use crate::application::train_use_case::{HyperParameters, TrainConfig, TrainUseCase};
use crate::domain::traits::{ObjectLocation, ObjectStore};

pub const JOB_FILE: &str = "job.json";

/// How the training entry point is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Call TrainUseCase on the current thread
    InProcess,
    /// Spawn `<program> train ...` and wait for it
    Subprocess { program: PathBuf },
}

impl ExecutionMode {
    /// A child process of the running binary.
    pub fn current_exe() -> Result<Self> {
        let program = std::env::current_exe().context("Cannot locate the running executable")?;
        Ok(Self::Subprocess { program })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingJobDescription {
    pub job_name:        String,
    pub status:          JobStatus,
    pub started_at:      DateTime<Utc>,
    pub finished_at:     Option<DateTime<Utc>>,
    pub hyperparameters: HyperParameters,
    /// Channel prefix the training data came from
    pub input_data:      String,
    /// Where the model was uploaded, once completed
    pub model_artifacts: Option<ObjectLocationRecord>,
    pub failure_reason:  Option<String>,
}

/// Serialisable form of an ObjectLocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocationRecord {
    pub bucket: String,
    pub key:    String,
}

impl From<&ObjectLocation> for ObjectLocationRecord {
    fn from(loc: &ObjectLocation) -> Self {
        Self { bucket: loc.bucket.clone(), key: loc.key.clone() }
    }
}

impl From<&ObjectLocationRecord> for ObjectLocation {
    fn from(rec: &ObjectLocationRecord) -> Self {
        ObjectLocation::new(rec.bucket.clone(), rec.key.clone())
    }
}

/// `<base>-YYYY-mm-dd-HH-MM-SS-mmm`
pub fn timestamped_job_name(base: &str, now: DateTime<Utc>) -> String {
    format!("{}-{}", base, now.format("%Y-%m-%d-%H-%M-%S-%3f"))
}

// ─── TrainingJob ──────────────────────────────────────────────────────────────
pub struct TrainingJob<'a> {
    store:           &'a dyn ObjectStore,
    base_job_name:   String,
    output_bucket:   String,
    jobs_root:       PathBuf,
    hyperparameters: HyperParameters,
    mode:            ExecutionMode,
}

impl<'a> TrainingJob<'a> {
    pub fn new(
        store:           &'a dyn ObjectStore,
        base_job_name:   impl Into<String>,
        output_bucket:   impl Into<String>,
        jobs_root:       impl Into<PathBuf>,
        hyperparameters: HyperParameters,
        mode:            ExecutionMode,
    ) -> Self {
        Self {
            store,
            base_job_name: base_job_name.into(),
            output_bucket: output_bucket.into(),
            jobs_root:     jobs_root.into(),
            hyperparameters,
            mode,
        }
    }

    /// Train on every object under `channel` and return the finished job.
    /// The job description is written to job.json even when training fails.
    pub fn fit(&self, channel: &ObjectLocation) -> Result<TrainingJobDescription> {
        let started_at = Utc::now();
        let job_name   = timestamped_job_name(&self.base_job_name, started_at);
        let job_dir    = self.jobs_root.join(&job_name);

        let mut job = TrainingJobDescription {
            job_name:        job_name.clone(),
            status:          JobStatus::InProgress,
            started_at,
            finished_at:     None,
            hyperparameters: self.hyperparameters.clone(),
            input_data:      channel.to_string(),
            model_artifacts: None,
            failure_reason:  None,
        };
        fs::create_dir_all(&job_dir)
            .with_context(|| format!("Cannot create job directory '{}'", job_dir.display()))?;
        write_description(&job_dir, &job)?;
        tracing::info!("Starting training job '{}'", job_name);

        let outcome = self.run(&job_dir, &job_name, channel);
        job.finished_at = Some(Utc::now());

        match outcome {
            Ok(location) => {
                job.status          = JobStatus::Completed;
                job.model_artifacts = Some((&location).into());
                write_description(&job_dir, &job)?;
                tracing::info!("Training job '{}' completed", job_name);
                Ok(job)
            }
            Err(e) => {
                job.status         = JobStatus::Failed;
                job.failure_reason = Some(format!("{e:#}"));
                write_description(&job_dir, &job)?;
                Err(e.context(format!("Training job '{}' failed", job_name)))
            }
        }
    }

    fn run(&self, job_dir: &Path, job_name: &str, channel: &ObjectLocation) -> Result<ObjectLocation> {
        let config = TrainConfig {
            train_dir:       job_dir.join("input/data/train"),
            model_dir:       job_dir.join("model"),
            output_data_dir: job_dir.join("output/data"),
            hyperparameters: self.hyperparameters.clone(),
        };
        let hp_file = job_dir.join("input/config/hyperparameters.json");
        self.hyperparameters.save(&hp_file)?;
        fs::create_dir_all(&config.model_dir)?;
        fs::create_dir_all(&config.output_data_dir)?;

        // ── Step 1: Stage the channel ─────────────────────────────────────────
        self.download_channel(channel, &config.train_dir)?;

        // ── Step 2: Train ─────────────────────────────────────────────────────
        match &self.mode {
            ExecutionMode::InProcess => {
                TrainUseCase::new(config.clone()).execute()?;
            }
            ExecutionMode::Subprocess { program } => {
                let status = Command::new(program)
                    .arg("train")
                    .arg("--train").arg(&config.train_dir)
                    .arg("--model-dir").arg(&config.model_dir)
                    .arg("--output-data-dir").arg(&config.output_data_dir)
                    .arg("--hyperparameters-file").arg(&hp_file)
                    .status()
                    .with_context(|| format!("Cannot start '{}'", program.display()))?;
                if !status.success() {
                    bail!("Training process exited with {}", status);
                }
            }
        }

        // ── Step 3: Publish the model ─────────────────────────────────────────
        let destination = ObjectLocation::new(&self.output_bucket, format!("{job_name}/output/model"));
        self.upload_model(&config.model_dir, &destination)?;
        Ok(destination)
    }

    fn download_channel(&self, channel: &ObjectLocation, train_dir: &Path) -> Result<()> {
        let prefix = format!("{}/", channel.key.trim_end_matches('/'));
        let keys   = self.store.list(&channel.bucket, &prefix)?;
        if keys.is_empty() {
            bail!("No training data found under {}", channel);
        }

        for key in keys {
            let relative = &key[prefix.len()..];
            let dest     = train_dir.join(relative);
            self.store.download_file(&ObjectLocation::new(&channel.bucket, &key), &dest)?;
        }
        Ok(())
    }

    fn upload_model(&self, model_dir: &Path, destination: &ObjectLocation) -> Result<()> {
        for entry in WalkDir::new(model_dir) {
            let entry = entry.with_context(|| format!("Cannot read '{}'", model_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry.path().strip_prefix(model_dir)?;
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            self.store.upload_file(entry.path(), &destination.child(&key))?;
        }
        Ok(())
    }
}

fn write_description(job_dir: &Path, job: &TrainingJobDescription) -> Result<()> {
    let path = job_dir.join(JOB_FILE);
    fs::write(&path, serde_json::to_string_pretty(job)?)
        .with_context(|| format!("Cannot write job description '{}'", path.display()))
}
