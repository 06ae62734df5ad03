// src/store.rs
//! Persisted set of delivered job identifiers (a JSON array of strings).
//!
//! The set only grows; there is no eviction. Concurrent cycles are kept from
//! racing on the file by the delivery loop's cycle lock, not here.

use anyhow::{Context, Result};
use metrics::counter;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::jobs::types::{JobId, Stage, StageOutcome};

#[derive(Debug, Clone)]
pub struct DedupStore {
    path: PathBuf,
}

impl DedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file -> empty set; unreadable or malformed file -> error.
    pub async fn try_load(&self) -> Result<HashSet<JobId>> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()))
            }
        };
        let ids: Vec<JobId> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(ids.into_iter().collect())
    }

    /// Overwrite the file with the sorted identifiers.
    pub async fn try_save(&self, ids: &HashSet<JobId>) -> Result<()> {
        let mut sorted: Vec<&JobId> = ids.iter().collect();
        sorted.sort();
        let body = serde_json::to_string(&sorted).context("serializing dedup store")?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, body)
            .await
            .with_context(|| format!("writing {}", self.path.display()))
    }

    /// Never fails: read errors degrade to an empty set and are logged.
    pub async fn load(&self) -> HashSet<JobId> {
        let out = StageOutcome::from_result(
            self.try_load().await,
            Stage::Persistence,
            self.path.display().to_string(),
        );
        if !out.is_success() {
            counter!("dedup_store_errors_total").increment(1);
        }
        out.unwrap_or_log(HashSet::new())
    }

    /// Logs and keeps the previous file content on failure.
    pub async fn save(&self, ids: &HashSet<JobId>) -> StageOutcome<()> {
        let out = StageOutcome::from_result(
            self.try_save(ids).await,
            Stage::Persistence,
            self.path.display().to_string(),
        );
        if let StageOutcome::Failure(f) = &out {
            counter!("dedup_store_errors_total").increment(1);
            f.log();
        }
        out
    }
}
