use std::collections::HashMap;

use super::{RecordNormalizer, SourceConventions};
use crate::error::{CatalogError, Result};

/// Registry of per-source normalizers, built from configuration
#[derive(Debug, Default)]
pub struct NormalizationRegistry {
    normalizers: HashMap<String, RecordNormalizer>,
}

impl NormalizationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the conventions for a source, replacing any earlier entry
    pub fn register(&mut self, source_id: &str, conventions: SourceConventions) {
        self.normalizers
            .insert(source_id.to_string(), RecordNormalizer::new(source_id, conventions));
    }

    /// The normalizer for `source_id`, or `UnknownSource` if none is registered
    pub fn normalizer_for(&self, source_id: &str) -> Result<&RecordNormalizer> {
        self.normalizers
            .get(source_id)
            .ok_or_else(|| CatalogError::UnknownSource(source_id.to_string()))
    }
}
