// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the five subcommands and all their flags:
//
//   train    the training entry point (runs inside a job)
//   serve    host an existing model directory over HTTP
//   deploy   prepare → upload → train → deploy → smoke test
//   invoke   send error messages to a deployed endpoint
//   upload   put a local file into the object store
//
// The defaults here are the compiled-in configuration.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::Result;
use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::application::{
    deploy_use_case::DeployConfig,
    invoke_use_case::InvokeConfig,
    train_use_case::{HyperParameters, TrainConfig},
    training_job::ExecutionMode,
};

pub const DEFAULT_BUCKET:        &str = "logs-poc";
pub const DEFAULT_DATA_KEY:      &str = "data/error_logs.csv";
pub const DEFAULT_JOB_NAME:      &str = "logs-error-model";
pub const DEFAULT_ENDPOINT_NAME: &str = "logs-error-endpoint";
pub const DEFAULT_MESSAGE:       &str = "Order : 12312 Error given by UPI ";

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fit the classifier on <train>/train.csv and write the model artifact
    Train(TrainArgs),

    /// Serve a model directory on /ping and /invocations
    Serve(ServeArgs),

    /// Run the whole workflow and keep the endpoint up until Ctrl-C
    Deploy(DeployArgs),

    /// Send error messages to a deployed endpoint
    Invoke(InvokeArgs),

    /// Upload a local file into the object store
    Upload(UploadArgs),
}

// ─── Hyperparameters ──────────────────────────────────────────────────────────
/// Optimiser flags shared by `train` and `deploy`
#[derive(Args, Debug, Clone)]
pub struct HyperParameterArgs {
    /// Maximum optimiser iterations
    #[arg(long, default_value_t = 1000)]
    pub max_iter: usize,

    /// Adam step size
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    /// Inverse L2 regularisation strength (C)
    #[arg(long = "c", default_value_t = 1.0)]
    pub inverse_regularization: f64,

    /// Stop when the loss changes by less than this
    #[arg(long, default_value_t = 1e-6)]
    pub tolerance: f64,

    /// Share of records held out for validation
    #[arg(long, default_value_t = 0.0)]
    pub validation_fraction: f64,

    /// Seed for the holdout shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Append a metrics row every N iterations
    #[arg(long, default_value_t = 50)]
    pub log_every: usize,
}

impl From<HyperParameterArgs> for HyperParameters {
    fn from(a: HyperParameterArgs) -> Self {
        HyperParameters {
            max_iter:               a.max_iter,
            learning_rate:          a.learning_rate,
            inverse_regularization: a.inverse_regularization,
            tolerance:              a.tolerance,
            validation_fraction:    a.validation_fraction,
            seed:                   a.seed,
            log_every:              a.log_every,
        }
    }
}

// ─── train ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding train.csv
    #[arg(long, default_value = "/opt/ml/input/data/train")]
    pub train: PathBuf,

    /// Directory the model artifact is written to
    #[arg(long, default_value = "/opt/ml/model")]
    pub model_dir: PathBuf,

    /// Directory for metrics.csv
    #[arg(long, default_value = "/opt/ml/output/data")]
    pub output_data_dir: PathBuf,

    /// JSON hyperparameters; overrides the flags below
    #[arg(long)]
    pub hyperparameters_file: Option<PathBuf>,

    #[command(flatten)]
    pub hyperparameters: HyperParameterArgs,
}

/// The hyperparameters file, when given, wins over the flags.
impl TryFrom<TrainArgs> for TrainConfig {
    type Error = anyhow::Error;

    fn try_from(a: TrainArgs) -> Result<Self> {
        let hyperparameters = match &a.hyperparameters_file {
            Some(path) => HyperParameters::load(path)?,
            None       => a.hyperparameters.into(),
        };
        Ok(TrainConfig {
            train_dir:       a.train,
            model_dir:       a.model_dir,
            output_data_dir: a.output_data_dir,
            hyperparameters,
        })
    }
}

// ─── serve ────────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory containing a trained model artifact
    #[arg(long, default_value = "/opt/ml/model")]
    pub model_dir: PathBuf,

    #[arg(long, default_value = "0.0.0.0:8080")]
    pub bind: String,

    /// Name the endpoint is registered under
    #[arg(long, default_value = DEFAULT_ENDPOINT_NAME)]
    pub endpoint_name: String,

    /// Endpoint registry file
    #[arg(long, default_value = ".log-triage/endpoints.json")]
    pub registry: PathBuf,
}

// ─── deploy ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Root directory of the local object store
    #[arg(long, default_value = ".log-triage/store")]
    pub store_root: PathBuf,

    #[arg(long, default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Key of the labelled error log CSV
    #[arg(long, default_value = DEFAULT_DATA_KEY)]
    pub data_key: String,

    /// Scratch directory for train.csv, jobs and endpoint models
    #[arg(long, default_value = ".log-triage/work")]
    pub work_dir: PathBuf,

    #[arg(long, default_value = DEFAULT_JOB_NAME)]
    pub base_job_name: String,

    #[arg(long, default_value = DEFAULT_ENDPOINT_NAME)]
    pub endpoint_name: String,

    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Endpoint registry file
    #[arg(long, default_value = ".log-triage/endpoints.json")]
    pub registry: PathBuf,

    /// Train on this thread instead of a child process
    #[arg(long)]
    pub in_process: bool,

    /// Stop the endpoint right after the smoke test
    #[arg(long)]
    pub exit_after_smoke_test: bool,

    #[command(flatten)]
    pub hyperparameters: HyperParameterArgs,
}

impl TryFrom<&DeployArgs> for DeployConfig {
    type Error = anyhow::Error;

    fn try_from(a: &DeployArgs) -> Result<Self> {
        let mode = if a.in_process {
            ExecutionMode::InProcess
        } else {
            ExecutionMode::current_exe()?
        };
        Ok(DeployConfig {
            store_root:      a.store_root.clone(),
            bucket:          a.bucket.clone(),
            data_key:        a.data_key.clone(),
            work_dir:        a.work_dir.clone(),
            base_job_name:   a.base_job_name.clone(),
            endpoint_name:   a.endpoint_name.clone(),
            bind:            a.bind.clone(),
            registry_path:   a.registry.clone(),
            hyperparameters: a.hyperparameters.clone().into(),
            mode,
        })
    }
}

// ─── invoke ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Error messages to classify, one request each
    #[arg(default_value = DEFAULT_MESSAGE)]
    pub messages: Vec<String>,

    #[arg(long, default_value = DEFAULT_ENDPOINT_NAME)]
    pub endpoint_name: String,

    /// Endpoint registry file
    #[arg(long, default_value = ".log-triage/endpoints.json")]
    pub registry: PathBuf,

    /// Call this base URL directly instead of looking the name up
    #[arg(long)]
    pub url: Option<String>,
}

impl From<&InvokeArgs> for InvokeConfig {
    fn from(a: &InvokeArgs) -> Self {
        InvokeConfig {
            endpoint_name: a.endpoint_name.clone(),
            registry_path: a.registry.clone(),
            url:           a.url.clone(),
        }
    }
}

// ─── upload ───────────────────────────────────────────────────────────────────
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Local file to upload
    #[arg(long)]
    pub file: PathBuf,

    #[arg(long, default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Destination key inside the bucket
    #[arg(long, default_value = DEFAULT_DATA_KEY)]
    pub key: String,

    /// Root directory of the local object store
    #[arg(long, default_value = ".log-triage/store")]
    pub store_root: PathBuf,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn test_train_defaults_match_job_layout() {
        let cli = Cli::try_parse_from(["log-triage", "train"]).unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        let cfg = TrainConfig::try_from(args).unwrap();
        assert_eq!(cfg.train_dir, PathBuf::from("/opt/ml/input/data/train"));
        assert_eq!(cfg.model_dir, PathBuf::from("/opt/ml/model"));
        assert_eq!(cfg.hyperparameters, HyperParameters::default());
    }

    #[test]
    fn test_hyperparameters_file_overrides_flags() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("hyperparameters.json");
        HyperParameters { max_iter: 7, ..HyperParameters::default() }.save(&path).unwrap();

        let cli = Cli::try_parse_from([
            "log-triage", "train",
            "--max-iter", "300",
            "--hyperparameters-file", path.to_str().unwrap(),
        ])
        .unwrap();
        let Commands::Train(args) = cli.command else { panic!("expected train") };
        assert_eq!(TrainConfig::try_from(args).unwrap().hyperparameters.max_iter, 7);
    }

    #[test]
    fn test_invoke_default_message() {
        let cli = Cli::try_parse_from(["log-triage", "invoke"]).unwrap();
        let Commands::Invoke(args) = cli.command else { panic!("expected invoke") };
        assert_eq!(args.messages, vec![DEFAULT_MESSAGE.to_string()]);
        assert_eq!(args.endpoint_name, "logs-error-endpoint");
    }

    #[test]
    fn test_deploy_defaults() {
        let cli = Cli::try_parse_from(["log-triage", "deploy", "--in-process", "--c", "0.5"]).unwrap();
        let Commands::Deploy(args) = cli.command else { panic!("expected deploy") };
        let cfg = DeployConfig::try_from(&args).unwrap();
        assert_eq!(cfg.bucket, "logs-poc");
        assert_eq!(cfg.data_key, "data/error_logs.csv");
        assert_eq!(cfg.base_job_name, "logs-error-model");
        assert_eq!(cfg.mode, ExecutionMode::InProcess);
        assert_eq!(cfg.hyperparameters.inverse_regularization, 0.5);
    }
}
