// ============================================================
// Layer 4 — Bag-of-Words Vectorizer and Label Encoder
// ============================================================
// Turns free text into fixed-length count vectors.
//
// Tokenisation:
//   1. Lowercase the whole message
//   2. Extract every run of 2+ word characters
//      (pattern `(?u)\b\w\w+\b`, so "a" and "%" vanish)
//
// Vocabulary:
//   Every distinct token seen during fit, sorted
//   lexicographically. A token's feature index is its rank.
//
//   "Disk full on /var"  →  tokens: disk, full, on, var
//   vocabulary            →  {disk: 0, full: 1, on: 2, var: 3}
//   "disk DISK quota"    →  [2, 0, 0, 0]   (quota is unknown)
//
// Tokens never seen during fit are dropped at transform time,
// so an all-unknown message becomes the zero vector.
//
// Labels get the same treatment: sorted distinct values, the
// class index is the rank.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::errors::DatasetError;

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is a valid regex"));

/// Split a message into lowercase tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

// ─── CountVectorizer ──────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    /// Learn the vocabulary from a corpus.
    pub fn fit(messages: &[String]) -> Result<Self> {
        let tokens: BTreeSet<String> = messages.iter().flat_map(|m| tokenize(m)).collect();
        if tokens.is_empty() {
            return Err(DatasetError::EmptyVocabulary.into());
        }

        // BTreeSet iterates in sorted order, so enumerate gives the rank
        let vocabulary = tokens
            .into_iter()
            .enumerate()
            .map(|(idx, tok)| (tok, idx))
            .collect();
        Ok(Self { vocabulary })
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.vocabulary.get(token).copied()
    }

    /// Count vector for one message.
    pub fn transform_one(&self, message: &str) -> Vec<f32> {
        let mut counts = vec![0.0f32; self.n_features()];
        for tok in tokenize(message) {
            if let Some(idx) = self.index_of(&tok) {
                counts[idx] += 1.0;
            }
        }
        counts
    }

    /// Row-major [messages.len(), n_features] count matrix.
    pub fn transform(&self, messages: &[String]) -> Vec<f32> {
        let mut matrix = Vec::with_capacity(messages.len() * self.n_features());
        for m in messages {
            matrix.extend(self.transform_one(m));
        }
        matrix
    }
}

// ─── LabelEncoder ─────────────────────────────────────────────────────────────
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Collect the sorted distinct labels. Needs at least two classes.
    pub fn fit(labels: &[String]) -> Result<Self> {
        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        match classes.as_slice() {
            []     => Err(DatasetError::NoRecords.into()),
            [only] => Err(DatasetError::SingleClass(only.clone()).into()),
            _      => Ok(Self { classes }),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes.binary_search_by(|c| c.as_str().cmp(label)).ok()
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }
}
