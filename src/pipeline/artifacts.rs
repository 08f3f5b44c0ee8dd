//! Storage for plan artifacts.
//!
//! Each completed run is written once as `<plans_dir>/<run_id>.json`.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::state::PlanArtifact;

/// Errors that can occur during plan storage operations.
#[derive(Debug, Error)]
pub enum PlanStoreError {
    /// Failed to read or write to the filesystem.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize or deserialize plan data.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No plan exists for the run id.
    #[error("Plan not found for run {0}")]
    NotFound(String),

    /// The storage directory could not be created.
    #[error("Failed to create plans directory {path:?}: {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Local file storage for plan artifacts.
#[derive(Debug, Clone)]
pub struct PlanStore {
    base_path: PathBuf,
}

impl PlanStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the artifact for `run_id`.
    pub fn plan_path(&self, run_id: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", run_id))
    }

    async fn ensure_directory(&self) -> Result<(), PlanStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|source| PlanStoreError::DirectoryCreationFailed {
                path: self.base_path.clone(),
                source,
            })
    }

    /// Writes the plan for `run_id`, replacing any existing file.
    ///
    /// # Returns
    ///
    /// The path the plan was written to.
    pub async fn save(&self, run_id: &str, plan: &PlanArtifact) -> Result<PathBuf, PlanStoreError> {
        self.ensure_directory().await?;

        let path = self.plan_path(run_id);
        let json = serde_json::to_string_pretty(plan)?;

        let mut file = fs::File::create(&path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;

        Ok(path)
    }

    /// Loads the plan for `run_id`.
    pub async fn load(&self, run_id: &str) -> Result<PlanArtifact, PlanStoreError> {
        let path = self.plan_path(run_id);
        if !fs::try_exists(&path).await? {
            return Err(PlanStoreError::NotFound(run_id.to_string()));
        }

        let contents = fs::read_to_string(&path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Run ids with a stored plan, sorted.
    pub async fn list(&self) -> Result<Vec<String>, PlanStoreError> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut run_ids = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                run_ids.push(stem.to_string());
            }
        }
        run_ids.sort();
        Ok(run_ids)
    }
}
