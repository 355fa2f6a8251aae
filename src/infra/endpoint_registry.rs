// ============================================================
// Layer 6 — Endpoint Registry
// ============================================================
// Maps endpoint names to the URL they are served on, so a client
// only needs the name:
//
//   endpoints.json
//   {
//     "logs-error-endpoint": {
//       "name": "logs-error-endpoint",
//       "url": "http://127.0.0.1:8080",
//       "model_dir": "work/endpoints/logs-error-endpoint/model",
//       "created_at": "2025-05-03T20:09:24Z"
//     }
//   }
//
// A deployment registers itself once it is listening and
// removes its entry on graceful shutdown.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub name:       String,
    pub url:        String,
    pub model_dir:  PathBuf,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct EndpointRegistry {
    path: PathBuf,
}

impl EndpointRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<BTreeMap<String, EndpointRecord>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let json = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read endpoint registry '{}'", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Corrupt endpoint registry '{}'", self.path.display()))
    }

    fn save(&self, entries: &BTreeMap<String, EndpointRecord>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)
            .with_context(|| format!("Cannot write endpoint registry '{}'", self.path.display()))
    }

    /// Add or replace the entry for `record.name`.
    pub fn register(&self, record: EndpointRecord) -> Result<()> {
        let mut entries = self.load()?;
        tracing::info!("Registering endpoint '{}' at {}", record.name, record.url);
        entries.insert(record.name.clone(), record);
        self.save(&entries)
    }

    /// Remove `name`; returns whether it was present.
    pub fn deregister(&self, name: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let removed = entries.remove(name).is_some();
        if removed {
            self.save(&entries)?;
            tracing::info!("Deregistered endpoint '{}'", name);
        }
        Ok(removed)
    }

    pub fn resolve(&self, name: &str) -> Result<EndpointRecord> {
        self.load()?.remove(name).ok_or_else(|| {
            anyhow!(
                "Endpoint '{}' is not registered in '{}'. Is it deployed and running?",
                name,
                self.path.display()
            )
        })
    }
}
