// ============================================================
// Layer 3 — Inference Domain Types
// ============================================================
// The request is a list of raw error strings; the response is
// a list of predicted action labels, one per input, in order.
//
// When an endpoint fails it answers with an ErrorResponse body
// so clients can show more than a bare status code.

use serde::{Deserialize, Serialize};

/// The only media type the endpoint speaks, both directions
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Accept value that means "whatever the endpoint prefers"
pub const ANY_CONTENT_TYPE: &str = "*/*";

/// Messages to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceRequest {
    pub messages: Vec<String>,
}

impl InferenceRequest {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// Predicted labels, positionally aligned with the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InferenceResponse {
    pub labels: Vec<String>,
}

/// Structured error body returned by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, e.g. "UnsupportedContentType"
    pub error_code: String,
    /// Human-readable description
    pub message:    String,
    /// HTTP status the endpoint answered with
    pub status:     u16,
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.error_code, self.status, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialises_as_bare_array() {
        let req = InferenceRequest::new(vec!["Error 500: Internal Server Error".to_string()]);
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"["Error 500: Internal Server Error"]"#);
    }

    #[test]
    fn test_response_decodes_in_order() {
        let resp: InferenceResponse =
            serde_json::from_str(r#"["restart", "retry", "escalate"]"#).unwrap();
        assert_eq!(resp.labels, vec!["restart", "retry", "escalate"]);
    }
}
