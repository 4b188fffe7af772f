use async_trait::async_trait;
use std::path::PathBuf;

use crate::app::ports::CatalogSourcePort;
use crate::error::{CatalogError, Result};

/// Reads locations as file paths, relative ones against `root`
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl CatalogSourcePort for FsSource {
    async fn fetch(&self, location: &str) -> Result<String> {
        let path = self.root.join(location);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CatalogError::Fetch {
                location: path.display().to_string(),
                message: e.to_string(),
            })
    }
}
