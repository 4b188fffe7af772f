use async_trait::async_trait;

use crate::error::Result;

/// Retrieves the raw text of one source location.
///
/// Implementations may be called concurrently for different locations. A
/// failure only removes that location's contribution from the run.
#[async_trait]
pub trait CatalogSourcePort: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<String>;
}
