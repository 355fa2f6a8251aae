// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments
// and is the only layer that prints.
// All business logic is delegated to Layer 2 (application).
//
// Commands that host or call an endpoint build a Tokio
// runtime here; `train` and `upload` stay synchronous.
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, DeployArgs, InvokeArgs, ServeArgs, TrainArgs, UploadArgs};

#[derive(Parser, Debug)]
#[command(
    name = "log-triage",
    version = "0.1.0",
    about = "Train a classifier that maps error log messages to remediation actions, then host and query it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)  => run_train(args),
            Commands::Serve(args)  => run_serve(args),
            Commands::Deploy(args) => run_deploy(args),
            Commands::Invoke(args) => run_invoke(args),
            Commands::Upload(args) => run_upload(args),
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("Cannot start the async runtime")
}

/// The two lines printed for each classified message.
fn prediction_report(message: &str, action: &str) -> String {
    format!("Input Error: {}\nPredicted Action: {}", message, action)
}

async fn wait_for_ctrl_c() -> Result<()> {
    println!("Serving. Press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await.context("Cannot listen for Ctrl-C")
}

/// Handles the `train` subcommand.
fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training on data in '{}'", args.train.display());
    let report = TrainUseCase::new(args.try_into()?).execute()?;

    tracing::info!(
        "{} iterations, final loss {:.6}, train accuracy {:.3}",
        report.iterations_run,
        report.final_loss,
        report.train_accuracy
    );
    println!("Model training completed and saved.");
    Ok(())
}

/// Handles the `serve` subcommand.
fn run_serve(args: ServeArgs) -> Result<()> {
    use crate::application::deploy_use_case::{host, teardown};

    runtime()?.block_on(async {
        let deployment = host(&args.endpoint_name, &args.model_dir, &args.bind, &args.registry).await?;
        println!("Endpoint '{}' is serving at {}", args.endpoint_name, deployment.url());

        let waited = wait_for_ctrl_c().await;
        teardown(deployment).await?;
        waited
    })
}

/// Handles the `deploy` subcommand.
fn run_deploy(args: DeployArgs) -> Result<()> {
    use crate::application::deploy_use_case::{teardown, DeployUseCase, SMOKE_TEST_MESSAGE};

    let use_case = DeployUseCase::new((&args).try_into()?);

    let job = use_case.train()?;
    println!("Training job '{}' completed.", job.job_name);

    runtime()?.block_on(async {
        let deployment = use_case.deploy(&job).await?;
        tracing::info!("Endpoint '{}' deployed at {}", args.endpoint_name, deployment.url());
        println!("Model deployed successfully. Testing endpoint...");

        match use_case.smoke_test(&deployment).await {
            Ok(labels) => {
                println!("Test successful!");
                println!("{}", prediction_report(SMOKE_TEST_MESSAGE, &labels.join(", ")));
            }
            Err(e) => println!("Error testing endpoint: {}", e),
        }

        let waited = if args.exit_after_smoke_test {
            Ok(())
        } else {
            wait_for_ctrl_c().await
        };
        teardown(deployment).await?;
        waited
    })
}

/// Handles the `invoke` subcommand. Invocation errors, including an
/// endpoint that cannot be resolved, are printed rather than returned.
fn run_invoke(args: InvokeArgs) -> Result<()> {
    use crate::application::invoke_use_case::InvokeUseCase;

    let use_case = match InvokeUseCase::new((&args).into()) {
        Ok(use_case) => use_case,
        Err(e) => {
            println!("Error invoking endpoint: {:#}", e);
            return Ok(());
        }
    };
    tracing::info!("Invoking endpoint at {}", use_case.endpoint_url());

    runtime()?.block_on(async {
        for message in &args.messages {
            match use_case.predict_one(message).await {
                Ok(action) => println!("{}", prediction_report(message, &action)),
                Err(e) => {
                    println!("Error invoking endpoint: {}", e);
                    if let Some(response) = e.response() {
                        println!("Error response: {}", serde_json::to_string(response)?);
                    }
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

/// Handles the `upload` subcommand.
fn run_upload(args: UploadArgs) -> Result<()> {
    use crate::domain::traits::{ObjectLocation, ObjectStore};
    use crate::infra::object_store::LocalObjectStore;

    let location = ObjectLocation::new(args.bucket, args.key);
    LocalObjectStore::new(args.store_root).upload_file(&args.file, &location)?;
    println!("Uploaded '{}' to {}", args.file.display(), location);
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_report_lines() {
        let report = prediction_report("Error 500: Internal Server Error", "Restart application server");
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Input Error: Error 500: Internal Server Error",
                "Predicted Action: Restart application server",
            ]
        );
    }

    #[test]
    fn test_invoke_unregistered_endpoint_is_reported_not_returned() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("none.json");
        let cli = Cli::try_parse_from([
            "log-triage", "invoke",
            "--registry", registry.to_str().unwrap(),
            "Order : 12312",
        ])
        .unwrap();

        assert!(cli.run().is_ok());
        assert!(!registry.exists());
    }
}
