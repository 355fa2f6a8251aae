// ============================================================
// Layer 2 — Inference Handler
// ============================================================
// The four entry points a hosting runtime calls, in order:
//
//   load_model     model directory      → ready predictor
//   decode_input   body + content type  → Vec<String>
//   predict        Vec<String>          → Vec<String> labels
//   encode_output  labels + accept type → body + content type
//
// Only JSON is spoken in either direction:
//   "foo"              → ["foo"]
//   ["a", "b"]         → ["a", "b"]
//   42 / {..} / [1]    → InvalidShape
//   text/csv body      → UnsupportedContentType
//
// The HTTP server in Layer 6 is a thin shell around `invoke`.

use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

use crate::domain::errors::PayloadError;
use crate::domain::inference::{ANY_CONTENT_TYPE, JSON_CONTENT_TYPE};
use crate::domain::traits::ActionPredictor;
use crate::infra::artifact::ArtifactManager;
use crate::ml::inferencer::Inferencer;

/// Strip parameters and case: "Application/JSON; charset=utf-8" → "application/json"
fn media_type(header: &str) -> String {
    header
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null      => "null",
        Value::Bool(_)   => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_)  => "an array",
        Value::Object(_) => "an object",
    }
}

// ─── Entry points ─────────────────────────────────────────────────────────────

/// Load the fitted pipeline from `model_dir`.
pub fn load_model(model_dir: &Path) -> Result<Inferencer> {
    Inferencer::from_artifact(&ArtifactManager::new(model_dir))
}

/// Decode a request body into the list of messages to classify.
pub fn decode_input(body: &[u8], content_type: &str) -> Result<Vec<String>, PayloadError> {
    if media_type(content_type) != JSON_CONTENT_TYPE {
        return Err(PayloadError::UnsupportedContentType(content_type.to_string()));
    }

    match serde_json::from_slice::<Value>(body)? {
        Value::String(message) => Ok(vec![message]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(message) => Ok(message),
                other => Err(PayloadError::InvalidShape(format!(
                    "{} at position {}",
                    json_kind(&other),
                    i
                ))),
            })
            .collect(),
        other => Err(PayloadError::InvalidShape(json_kind(&other).to_string())),
    }
}

/// One label per message, same order.
pub fn predict(input: &[String], model: &dyn ActionPredictor) -> Result<Vec<String>> {
    model.predict(input)
}

/// Encode predicted labels for the requested accept type.
/// Returns the body and the content type to send it with.
pub fn encode_output(
    prediction: &[String],
    accept:     &str,
) -> Result<(Vec<u8>, &'static str), PayloadError> {
    // An Accept header may list several types; take JSON if any allows it
    let wants_json = accept.trim().is_empty()
        || accept.split(',').map(media_type).any(|m| {
            m == JSON_CONTENT_TYPE || m == ANY_CONTENT_TYPE || m == "application/*"
        });

    if !wants_json {
        return Err(PayloadError::UnsupportedAcceptType(accept.to_string()));
    }
    Ok((serde_json::to_vec(prediction)?, JSON_CONTENT_TYPE))
}

// ─── Full invocation ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum InvocationError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("Prediction failed: {0:#}")]
    Prediction(anyhow::Error),
}

/// Encoded response of one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub body:         Vec<u8>,
    pub content_type: &'static str,
    pub count:        usize,
}

/// decode → predict → encode.
pub fn invoke(
    model:        &dyn ActionPredictor,
    body:         &[u8],
    content_type: &str,
    accept:       &str,
) -> Result<Invocation, InvocationError> {
    let input      = decode_input(body, content_type)?;
    let prediction = predict(&input, model).map_err(InvocationError::Prediction)?;

    if prediction.len() != input.len() {
        return Err(InvocationError::Prediction(anyhow::anyhow!(
            "predictor returned {} labels for {} inputs",
            prediction.len(),
            input.len()
        )));
    }

    let (body, content_type) = encode_output(&prediction, accept)?;
    Ok(Invocation { body, content_type, count: prediction.len() })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Labels every message by its length parity.
    struct ParityPredictor {
        labels: Vec<String>,
    }

    impl ParityPredictor {
        fn new() -> Self {
            Self { labels: vec!["even".into(), "odd".into()] }
        }
    }

    impl ActionPredictor for ParityPredictor {
        fn predict(&self, messages: &[String]) -> Result<Vec<String>> {
            Ok(messages.iter().map(|m| self.labels[m.len() % 2].clone()).collect())
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    #[test]
    fn test_decode_list_of_one() {
        let body = br#"["Order : 12312 Error given by UPI"]"#;
        assert_eq!(
            decode_input(body, "application/json").unwrap(),
            vec!["Order : 12312 Error given by UPI".to_string()]
        );
    }

    #[test]
    fn test_decode_bare_string() {
        assert_eq!(decode_input(br#""foo""#, "application/json").unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_decode_ignores_media_type_parameters() {
        let decoded = decode_input(br#"["a","b"]"#, "Application/JSON; charset=utf-8").unwrap();
        assert_eq!(decoded, vec!["a", "b"]);
    }

    #[test]
    fn test_decode_rejects_unsupported_content_type() {
        let err = decode_input(b"foo", "text/csv").unwrap_err();
        assert!(matches!(err, PayloadError::UnsupportedContentType(ref ct) if ct == "text/csv"));
        assert_eq!(err.to_string(), "Unsupported content type: text/csv");
    }

    #[test]
    fn test_decode_rejects_other_shapes() {
        for body in [&b"42"[..], b"{\"message\":\"x\"}", b"null", b"[\"ok\", 3]"] {
            let err = decode_input(body, "application/json").unwrap_err();
            assert!(matches!(err, PayloadError::InvalidShape(_)), "{err}");
        }
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = decode_input(b"[\"unterminated", "application/json").unwrap_err();
        assert!(matches!(err, PayloadError::MalformedJson(_)));
    }

    #[test]
    fn test_encode_then_decode_preserves_labels() {
        let labels: Vec<String> = vec!["restart".into(), "retry".into(), "restart".into()];
        let (body, content_type) = encode_output(&labels, "application/json").unwrap();
        assert_eq!(content_type, "application/json");
        assert_eq!(serde_json::from_slice::<Vec<String>>(&body).unwrap(), labels);
    }

    #[test]
    fn test_encode_accept_defaults_and_lists() {
        let labels = vec!["x".to_string()];
        assert!(encode_output(&labels, "").is_ok());
        assert!(encode_output(&labels, "*/*").is_ok());
        assert!(encode_output(&labels, "text/html, application/json;q=0.9").is_ok());

        let err = encode_output(&labels, "text/csv").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported accept type: text/csv");
    }

    #[test]
    fn test_invoke_output_aligned_with_input() {
        let model = ParityPredictor::new();
        let out = invoke(&model, br#"["ab", "abc", "", "x"]"#, "application/json", "application/json")
            .unwrap();
        assert_eq!(out.count, 4);
        let labels: Vec<String> = serde_json::from_slice(&out.body).unwrap();
        assert_eq!(labels, vec!["even", "odd", "even", "odd"]);
        assert!(labels.iter().all(|l| model.labels().contains(l)));
    }

    #[test]
    fn test_invoke_empty_list() {
        let out = invoke(&ParityPredictor::new(), b"[]", "application/json", "*/*").unwrap();
        assert_eq!(out.body, b"[]");
    }
}
