use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

use crate::constants::{DESCRIPTOR_TABLE_FILE, OBJECT_TABLE_FILE, RUN_REPORT_FILE};
use crate::error::{CatalogError, Result};
use crate::pipeline::pipeline::PipelineResult;

/// Storage trait for persisting emitted catalogs
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn save(&self, result: &PipelineResult) -> Result<()>;
}

/// Writes `DataSources.tsv`, `Objects.tsv` and `run_report.json` into a directory
pub struct FsCatalogStore {
    output_dir: PathBuf,
}

impl FsCatalogStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[async_trait]
impl CatalogStore for FsCatalogStore {
    async fn save(&self, result: &PipelineResult) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let report = serde_json::to_string_pretty(&result.report)?;
        for (file, contents) in [
            (DESCRIPTOR_TABLE_FILE, result.descriptor_tsv.as_str()),
            (OBJECT_TABLE_FILE, result.object_tsv.as_str()),
            (RUN_REPORT_FILE, report.as_str()),
        ] {
            let path = self.output_dir.join(file);
            tokio::fs::write(&path, contents).await?;
            debug!("Wrote {} bytes to {}", contents.len(), path.display());
        }

        info!("Saved catalog to {}", self.output_dir.display());
        Ok(())
    }
}

/// A saved run, as kept by [`InMemoryCatalogStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCatalog {
    pub descriptor_tsv: String,
    pub object_tsv: String,
    pub report_json: String,
}

/// In-memory storage implementation for development/testing
#[derive(Default, Clone)]
pub struct InMemoryCatalogStore {
    saved: Arc<Mutex<Vec<StoredCatalog>>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved(&self) -> Vec<StoredCatalog> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn save(&self, result: &PipelineResult) -> Result<()> {
        let stored = StoredCatalog {
            descriptor_tsv: result.descriptor_tsv.clone(),
            object_tsv: result.object_tsv.clone(),
            report_json: serde_json::to_string(&result.report)?,
        };
        self.saved
            .lock()
            .map_err(|_| CatalogError::Storage("in-memory store lock poisoned".to_string()))?
            .push(stored);
        Ok(())
    }
}
