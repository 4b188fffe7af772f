use indexmap::map::Entry;
use indexmap::IndexMap;
use tracing::debug;

use crate::types::DataSourceDescriptor;

/// Known data sources in first-encounter order
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    entries: IndexMap<String, DataSourceDescriptor>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a descriptor. A repeated code keeps its first name and position.
    pub fn insert(&mut self, code: impl Into<String>, name: impl Into<String>) -> bool {
        match self.entries.entry(code.into()) {
            Entry::Occupied(entry) => {
                debug!("Ignoring repeated descriptor code {}", entry.key());
                false
            }
            Entry::Vacant(entry) => {
                let code = entry.key().clone();
                entry.insert(DataSourceDescriptor {
                    code,
                    name: name.into(),
                });
                true
            }
        }
    }

    pub fn resolve(&self, code: &str) -> Option<&str> {
        self.entries.get(code).map(|d| d.name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataSourceDescriptor> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_encounter_wins_and_order_is_kept() {
        let mut registry = DescriptorRegistry::new();
        assert!(registry.insert("4", "ESA"));
        assert!(registry.insert("0", "USSTRATCOM"));
        assert!(!registry.insert("4", "Other"));

        let codes: Vec<&str> = registry.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["4", "0"]);
        assert_eq!(registry.resolve("4"), Some("ESA"));
        assert_eq!(registry.resolve("7"), None);
    }
}
