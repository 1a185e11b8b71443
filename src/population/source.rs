use crate::storage::record::Record;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Where a node's records come from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetches the complete record set for `collection`.
    ///
    /// Any transport or parse problem is an error. An empty list is a valid answer.
    async fn fetch(&self, collection: &str) -> Result<Vec<Record>>;
}

/// Upstream test-data service reached over HTTP at `{base_url}/{collection}`.
pub struct HttpRecordSource {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpRecordSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn url_for(&self, collection: &str) -> String {
        format!("{}/{}", self.base_url, collection)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, collection: &str) -> Result<Vec<Record>> {
        let url = self.url_for(collection);
        tracing::debug!("Fetching {} from {}", collection, url);

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "GET {} failed with status {}",
                url,
                response.status()
            ));
        }

        let records: Vec<Record> = response.json().await?;
        Ok(records)
    }
}
