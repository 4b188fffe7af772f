use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::pipeline::processing::catalog::DescriptorRegistry;
use crate::pipeline::processing::conflation::SourcePriority;
use crate::pipeline::processing::normalize::{NormalizationRegistry, SourceConventions};
use crate::pipeline::processing::parser::canonical_descriptor_name;
use crate::types::{AngleUnit, ElementRepresentation};

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_http_timeout_secs() -> u64 {
    30
}

/// Run configuration, usually read from `catalog.toml`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Optional `Code\tName` table; otherwise descriptors come from `sources`
    #[serde(default)]
    pub descriptor_table: Option<String>,
    /// Most preferred source first
    #[serde(default)]
    pub source_priority: Vec<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    /// Each location is fetched and loaded on its own
    pub locations: Vec<String>,
    pub angle_unit: AngleUnit,
    pub element_representation: ElementRepresentation,
    /// Canonical field name -> header token in this source
    #[serde(default)]
    pub columns: HashMap<String, String>,
}

impl SourceConfig {
    pub fn conventions(&self) -> SourceConventions {
        SourceConventions {
            angle_unit: self.angle_unit,
            element_representation: self.element_representation,
            columns: self.columns.clone(),
        }
    }
}

impl CatalogConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CatalogConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(CatalogError::Config("at least one source is required".to_string()));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.id.trim().is_empty() {
                return Err(CatalogError::Config("source id must not be empty".to_string()));
            }
            if !seen.insert(source.id.as_str()) {
                return Err(CatalogError::Config(format!("duplicate source id '{}'", source.id)));
            }
            if source.locations.is_empty() {
                return Err(CatalogError::Config(format!(
                    "source '{}' has no locations",
                    source.id
                )));
            }
        }
        Ok(())
    }

    pub fn priority(&self) -> SourcePriority {
        SourcePriority::new(self.source_priority.iter().cloned())
    }

    pub fn normalization_registry(&self) -> NormalizationRegistry {
        let mut registry = NormalizationRegistry::new();
        for source in &self.sources {
            registry.register(&source.id, source.conventions());
        }
        registry
    }

    /// Descriptors declared by the configured sources themselves
    pub fn declared_descriptors(&self) -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        for source in &self.sources {
            registry.insert(source.id.as_str(), canonical_descriptor_name(&source.id, &source.name));
        }
        registry
    }
}
