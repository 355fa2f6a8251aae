// ============================================================
// Layer 6 — Endpoint Client
// ============================================================
// Sends invocation requests to a running endpoint over HTTP.
//
//   POST {base_url}/invocations
//   Content-Type: application/json
//   Accept:       application/json
//   ["Order : 12312 Error given by UPI "]
//
// A non-2xx answer becomes InvokeError::Endpoint; when the body
// parses as an ErrorResponse it is kept so callers can print the
// structured detail.

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use thiserror::Error;

use crate::domain::inference::{ErrorResponse, InferenceRequest, InferenceResponse, JSON_CONTENT_TYPE};

#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("Could not reach endpoint: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Endpoint returned HTTP {status}: {message}")]
    Endpoint {
        status:   u16,
        message:  String,
        response: Option<ErrorResponse>,
    },

    #[error("Cannot decode endpoint response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl InvokeError {
    /// Structured error body returned by the endpoint, if any.
    pub fn response(&self) -> Option<&ErrorResponse> {
        match self {
            InvokeError::Endpoint { response, .. } => response.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EndpointClient {
    http:     reqwest::Client,
    base_url: String,
}

impl EndpointClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http:     reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw invocation: send `body` and return the response body.
    pub async fn invoke_endpoint(
        &self,
        body:         Vec<u8>,
        content_type: &str,
        accept:       &str,
    ) -> Result<Vec<u8>, InvokeError> {
        let response = self
            .http
            .post(format!("{}/invocations", self.base_url))
            .header(CONTENT_TYPE, content_type)
            .header(ACCEPT, accept)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes  = response.bytes().await?;

        if !status.is_success() {
            let detail: Option<ErrorResponse> = serde_json::from_slice(&bytes).ok();
            let message = match &detail {
                Some(d) => d.message.clone(),
                None    => String::from_utf8_lossy(&bytes).into_owned(),
            };
            return Err(InvokeError::Endpoint {
                status: status.as_u16(),
                message,
                response: detail,
            });
        }

        Ok(bytes.to_vec())
    }

    /// JSON in, JSON out: one label per message.
    pub async fn predict(&self, messages: &[String]) -> Result<Vec<String>, InvokeError> {
        let request = InferenceRequest::new(messages.to_vec());
        let body    = serde_json::to_vec(&request)?;
        let raw     = self.invoke_endpoint(body, JSON_CONTENT_TYPE, JSON_CONTENT_TYPE).await?;
        let decoded: InferenceResponse = serde_json::from_slice(&raw)?;
        Ok(decoded.labels)
    }

    /// True when the endpoint answers its health check.
    pub async fn ping(&self) -> Result<bool, InvokeError> {
        let response = self.http.get(format!("{}/ping", self.base_url)).send().await?;
        Ok(response.status().is_success())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
// Spin up a real endpoint on an ephemeral port and talk to it.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::ActionPredictor;
    use crate::infra::endpoint_server::{share, EndpointServer};

    /// Labels messages mentioning "disk" as "free space", everything else "retry".
    struct KeywordPredictor {
        labels: Vec<String>,
    }

    impl ActionPredictor for KeywordPredictor {
        fn predict(&self, messages: &[String]) -> anyhow::Result<Vec<String>> {
            Ok(messages
                .iter()
                .map(|m| {
                    let idx = if m.to_lowercase().contains("disk") { 0 } else { 1 };
                    self.labels[idx].clone()
                })
                .collect())
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    async fn start() -> EndpointServer {
        let predictor = KeywordPredictor { labels: vec!["free space".into(), "retry".into()] };
        EndpointServer::start("127.0.0.1:0", "test-endpoint", share(predictor))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_predict_round_trip() {
        let server = start().await;
        let client = EndpointClient::new(server.url());

        assert!(client.ping().await.unwrap());

        let labels = client
            .predict(&["Disk quota exceeded".to_string(), "UPI timeout".to_string()])
            .await
            .unwrap();
        assert_eq!(labels, vec!["free space", "retry"]);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_bare_string_body_is_accepted() {
        let server = start().await;
        let client = EndpointClient::new(server.url());

        let raw = client
            .invoke_endpoint(br#""disk full""#.to_vec(), "application/json", "*/*")
            .await
            .unwrap();
        assert_eq!(serde_json::from_slice::<Vec<String>>(&raw).unwrap(), vec!["free space"]);

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_content_type_returns_structured_error() {
        let server = start().await;
        let client = EndpointClient::new(server.url());

        let err = client
            .invoke_endpoint(b"disk full".to_vec(), "text/csv", "application/json")
            .await
            .unwrap_err();

        let detail = err.response().expect("structured error body");
        assert_eq!(detail.status, 415);
        assert_eq!(detail.error_code, "UnsupportedContentType");
        assert!(detail.message.contains("text/csv"));

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_wrong_shape_and_accept_are_rejected() {
        let server = start().await;
        let client = EndpointClient::new(server.url());

        let err = client
            .invoke_endpoint(b"{\"a\":1}".to_vec(), "application/json", "application/json")
            .await
            .unwrap_err();
        assert_eq!(err.response().map(|r| r.status), Some(400));

        let err = client
            .invoke_endpoint(b"[\"x\"]".to_vec(), "application/json", "text/csv")
            .await
            .unwrap_err();
        assert_eq!(err.response().map(|r| r.status), Some(406));

        server.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = EndpointClient::new(format!("http://127.0.0.1:{port}"));
        let err = client.predict(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, InvokeError::Transport(_)));
        assert!(err.response().is_none());
    }
}
