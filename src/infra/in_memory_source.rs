use async_trait::async_trait;
use std::collections::HashMap;

use crate::app::ports::CatalogSourcePort;
use crate::error::{CatalogError, Result};

/// Serves pre-materialized text by location; unknown locations fail
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    blobs: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: &str, text: &str) -> Self {
        self.blobs.insert(location.to_string(), text.to_string());
        self
    }
}

#[async_trait]
impl CatalogSourcePort for InMemorySource {
    async fn fetch(&self, location: &str) -> Result<String> {
        self.blobs.get(location).cloned().ok_or_else(|| CatalogError::Fetch {
            location: location.to_string(),
            message: "not available".to_string(),
        })
    }
}
