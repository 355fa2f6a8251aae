// ============================================================
// Layer 2 — InvokeUseCase
// ============================================================
// Client side of an endpoint. The target is found either by
// name in the endpoint registry or by an explicit URL:
//
//   --endpoint-name logs-error-endpoint   → registry lookup
//   --url http://127.0.0.1:8080           → used as-is
//
// Each message goes out as its own ["<message>"] request.

use anyhow::Result;
use std::path::PathBuf;

use crate::infra::{
    endpoint_client::{EndpointClient, InvokeError},
    endpoint_registry::EndpointRegistry,
};

#[derive(Debug, Clone)]
pub struct InvokeConfig {
    pub endpoint_name: String,
    pub registry_path: PathBuf,
    /// Skips the registry when set
    pub url:           Option<String>,
}

pub struct InvokeUseCase {
    client: EndpointClient,
}

impl InvokeUseCase {
    /// Resolve the endpoint URL and build a client for it.
    pub fn new(config: InvokeConfig) -> Result<Self> {
        let url = match config.url {
            Some(url) => url,
            None => {
                let record = EndpointRegistry::new(config.registry_path).resolve(&config.endpoint_name)?;
                tracing::debug!("Endpoint '{}' resolved to {}", record.name, record.url);
                record.url
            }
        };
        Ok(Self { client: EndpointClient::new(url) })
    }

    pub fn endpoint_url(&self) -> &str {
        self.client.base_url()
    }

    /// Predicted action for a single error message.
    pub async fn predict_one(&self, message: &str) -> Result<String, InvokeError> {
        let labels = self.client.predict(&[message.to_string()]).await?;
        labels.into_iter().next().ok_or_else(|| InvokeError::Endpoint {
            status:   200,
            message:  "endpoint returned no prediction".to_string(),
            response: None,
        })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::ActionPredictor;
    use crate::infra::endpoint_registry::EndpointRecord;
    use crate::infra::endpoint_server::{share, EndpointServer};
    use chrono::Utc;

    struct FixedPredictor {
        labels: Vec<String>,
    }

    impl ActionPredictor for FixedPredictor {
        fn predict(&self, messages: &[String]) -> Result<Vec<String>> {
            Ok(messages.iter().map(|_| self.labels[0].clone()).collect())
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    #[tokio::test]
    async fn test_invoke_by_registered_name() {
        let dir    = tempfile::tempdir().unwrap();
        let server = EndpointServer::start(
            "127.0.0.1:0",
            "logs-error-endpoint",
            share(FixedPredictor { labels: vec!["Retry payment via UPI".into()] }),
        )
        .await
        .unwrap();

        let registry_path = dir.path().join("endpoints.json");
        EndpointRegistry::new(&registry_path)
            .register(EndpointRecord {
                name:       "logs-error-endpoint".into(),
                url:        server.url(),
                model_dir:  dir.path().join("model"),
                created_at: Utc::now(),
            })
            .unwrap();

        let use_case = InvokeUseCase::new(InvokeConfig {
            endpoint_name: "logs-error-endpoint".into(),
            registry_path,
            url:           None,
        })
        .unwrap();
        assert_eq!(use_case.endpoint_url(), server.url());

        let action = use_case.predict_one("Order : 12312 Error given by UPI ").await.unwrap();
        assert_eq!(action, "Retry payment via UPI");

        server.shutdown().await.unwrap();
    }

    #[test]
    fn test_unknown_name_fails_without_url() {
        let dir = tempfile::tempdir().unwrap();
        let err = InvokeUseCase::new(InvokeConfig {
            endpoint_name: "ghost".into(),
            registry_path: dir.path().join("endpoints.json"),
            url:           None,
        })
        .err()
        .unwrap();
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_url_bypasses_registry() {
        let dir = tempfile::tempdir().unwrap();
        let use_case = InvokeUseCase::new(InvokeConfig {
            endpoint_name: "ghost".into(),
            registry_path: dir.path().join("endpoints.json"),
            url:           Some("http://127.0.0.1:9/".into()),
        })
        .unwrap();
        assert_eq!(use_case.endpoint_url(), "http://127.0.0.1:9");
    }
}
