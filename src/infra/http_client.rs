use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use std::time::Duration;
use tracing::debug;

use crate::app::ports::CatalogSourcePort;
use crate::error::{CatalogError, Result};

pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl CatalogSourcePort for ReqwestSource {
    async fn fetch(&self, location: &str) -> Result<String> {
        let resp = self.client.get(location).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Fetch {
                location: location.to_string(),
                message: format!("HTTP status {}", status.as_u16()),
            });
        }
        let content_length = resp
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        let body = resp.text().await?;
        debug!(location, ?content_length, bytes = body.len(), "Fetched remote source");
        Ok(body)
    }
}
