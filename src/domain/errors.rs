// ============================================================
// Layer 3 — Data-Shape Errors
// ============================================================
// Validation failures with descriptive messages. Platform
// failures (storage, jobs, network) stay as anyhow errors in
// the layers that perform the I/O.

use thiserror::Error;

/// Problems with an inference request or response encoding.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("Unsupported accept type: {0}")]
    UnsupportedAcceptType(String),

    #[error("Input must be a string or list of strings, got {0}")]
    InvalidShape(String),

    #[error("Malformed JSON body: {0}")]
    MalformedJson(#[from] serde_json::Error),
}

impl PayloadError {
    /// Stable code used in structured error bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            PayloadError::UnsupportedContentType(_) => "UnsupportedContentType",
            PayloadError::UnsupportedAcceptType(_)  => "UnsupportedAcceptType",
            PayloadError::InvalidShape(_)           => "InvalidInput",
            PayloadError::MalformedJson(_)          => "MalformedInput",
        }
    }
}

/// Problems with the training data itself.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatasetError {
    #[error("Column '{column}' is missing from '{source_name}'")]
    MissingColumn { column: String, source_name: String },

    #[error("Row {row} has an empty '{column}' field")]
    EmptyField { row: usize, column: String },

    #[error("Training data contains no records")]
    NoRecords,

    #[error("Need samples of at least 2 classes, found only '{0}'")]
    SingleClass(String),

    #[error("Empty vocabulary: no message contains a token of two or more word characters")]
    EmptyVocabulary,
}
