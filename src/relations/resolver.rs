//! Relation Resolver
//!
//! Resolves `/{collection}/{ids}/{related}` by reading the internal linkage field of the matching
//! local records and asking the node that owns the related collection for those identifiers.
//!
//! ## Fan-out Protocol
//! 1. Look up the source records locally (store error and not-found rules apply).
//! 2. Concatenate the linkage identifiers in source order, duplicates kept.
//! 3. Find the related node's address in the service directory.
//! 4. `GET {base}/{related}/,{ids}`. The leading comma makes the sibling answer with an array.
//! 5. Relay the sibling's status, content type and body unchanged.

use crate::discovery::directory::ServiceDirectory;
use crate::error::NodeError;
use crate::query::engine::QueryEngine;
use crate::query::types::IdSelector;
use crate::storage::record::linked_identifiers;

use axum::body::Bytes;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// A sibling node's answer, passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

pub struct RelationResolver {
    query: Arc<QueryEngine>,
    directory: Arc<ServiceDirectory>,
    /// Related collection name -> linkage field on this collection's records.
    relations: HashMap<String, String>,
    http_client: reqwest::Client,
    outbound: Arc<Semaphore>,
    timeout: Duration,
}

impl RelationResolver {
    pub fn new(
        query: Arc<QueryEngine>,
        directory: Arc<ServiceDirectory>,
        relations: HashMap<String, String>,
        timeout: Duration,
        max_outbound: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            query,
            directory,
            relations,
            http_client: reqwest::Client::new(),
            outbound: Arc::new(Semaphore::new(max_outbound.max(1))),
            timeout,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.query.collection().name
    }

    /// Identifiers of `related` linked from the records selected by `raw_ids`.
    pub fn linked_ids(&self, raw_ids: &str, related: &str) -> Result<Vec<String>, NodeError> {
        let sources = self.query.find(&IdSelector::parse(raw_ids))?;

        let Some(field) = self.relations.get(related) else {
            tracing::debug!(
                "{} has no linkage to {}",
                self.collection_name(),
                related
            );
            return Err(NodeError::NotFound);
        };

        let ids: Vec<String> = sources
            .iter()
            .flat_map(|record| linked_identifiers(record, field))
            .collect();

        if ids.is_empty() {
            return Err(NodeError::NotFound);
        }
        Ok(ids)
    }

    pub async fn get_related(
        &self,
        raw_ids: &str,
        related: &str,
    ) -> Result<RelayedResponse, NodeError> {
        let ids = self.linked_ids(raw_ids, related)?;

        let base_url = self
            .directory
            .base_url(related)
            .ok_or_else(|| NodeError::DownstreamResolution(related.to_string()))?;

        let url = related_url(&base_url, related, &ids)?;

        let _permit = self
            .outbound
            .acquire()
            .await
            .map_err(|e| NodeError::DownstreamCall(e.to_string()))?;

        tracing::debug!("Fan-out {} id(s) to {}", ids.len(), url);
        let response = self
            .http_client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Related call to {} failed: {}", url, e);
                NodeError::DownstreamCall(e.to_string())
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| {
            tracing::error!("Reading related response from {} failed: {}", url, e);
            NodeError::DownstreamCall(e.to_string())
        })?;

        Ok(RelayedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// `{base}/{related}/,{ids}` with each path segment percent-encoded, so identifiers containing
/// `#`, `?`, `/` or `%` reach the sibling intact.
fn related_url(base_url: &str, related: &str, ids: &[String]) -> Result<Url, NodeError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| NodeError::DownstreamCall(format!("invalid base URL {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| NodeError::DownstreamCall(format!("{} cannot be a base URL", base_url)))?
        .pop_if_empty()
        .push(related)
        .push(&IdSelector::array_argument(ids));
    Ok(url)
}
