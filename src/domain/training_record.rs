// ============================================================
// Layer 3 — TrainingRecord Domain Type
// ============================================================
// One labelled example: an error-log message and the
// remediation action an operator should take for it.
//
// Example:
//   error_message:      "Order : 12312 Error given by UPI"
//   recommended_action: "Retry payment via alternate gateway"
//
// The CSV column names are the serde field names, so the
// same struct reads and writes the training file.

use serde::{Deserialize, Serialize};

/// Column holding the raw error-log text
pub const MESSAGE_COLUMN: &str = "error_message";

/// Column holding the remediation label
pub const ACTION_COLUMN: &str = "recommended_action";

/// A labelled (message, action) pair.
///
/// Both fields are non-empty once a record has passed
/// through the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub error_message:      String,
    pub recommended_action: String,
}

impl TrainingRecord {
    pub fn new(error_message: impl Into<String>, recommended_action: impl Into<String>) -> Self {
        Self {
            error_message:      error_message.into(),
            recommended_action: recommended_action.into(),
        }
    }
}

/// Ordered collection of training records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingDataset {
    records: Vec<TrainingRecord>,
}

impl TrainingDataset {
    pub fn new(records: Vec<TrainingRecord>) -> Self {
        Self { records }
    }

    /// Rebuild a dataset from two parallel lists.
    /// Extra entries in the longer list are dropped.
    pub fn from_columns(messages: Vec<String>, actions: Vec<String>) -> Self {
        let records = messages
            .into_iter()
            .zip(actions)
            .map(|(m, a)| TrainingRecord::new(m, a))
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TrainingRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Split into the two parallel lists (messages, labels).
    pub fn into_columns(self) -> (Vec<String>, Vec<String>) {
        self.records
            .into_iter()
            .map(|r| (r.error_message, r.recommended_action))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_round_trip_preserves_order() {
        let ds = TrainingDataset::from_columns(
            vec!["a".into(), "b".into()],
            vec!["x".into(), "y".into()],
        );
        assert_eq!(ds.len(), 2);
        let (messages, labels) = ds.into_columns();
        assert_eq!(messages, vec!["a", "b"]);
        assert_eq!(labels,   vec!["x", "y"]);
    }
}
