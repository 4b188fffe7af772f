//! Fetch adapters for source locations.

pub mod fs_source;
pub mod http_client;
pub mod in_memory_source;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::app::ports::CatalogSourcePort;
use crate::error::Result;

pub use fs_source::FsSource;
pub use http_client::ReqwestSource;
pub use in_memory_source::InMemorySource;

/// Routes `http://` and `https://` locations to HTTP, everything else to disk
pub struct LocationFetcher {
    http: ReqwestSource,
    fs: FsSource,
}

impl LocationFetcher {
    pub fn new(root: impl Into<PathBuf>, http_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: ReqwestSource::new(http_timeout)?,
            fs: FsSource::new(root),
        })
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl CatalogSourcePort for LocationFetcher {
    async fn fetch(&self, location: &str) -> Result<String> {
        if is_remote(location) {
            self.http.fetch(location).await
        } else {
            self.fs.fetch(location).await
        }
    }
}
