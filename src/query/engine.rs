use super::types::{IdSelector, QueryResult};
use crate::config::CollectionConfig;
use crate::error::NodeError;
use crate::storage::record::{Record, strip_internal};
use crate::storage::store::{RecordStore, StoreSnapshot};

use std::sync::Arc;

/// Read-only query access to the node's collection.
pub struct QueryEngine {
    collection: CollectionConfig,
    store: Arc<RecordStore>,
}

impl QueryEngine {
    pub fn new(collection: CollectionConfig, store: Arc<RecordStore>) -> Arc<Self> {
        Arc::new(Self { collection, store })
    }

    pub fn collection(&self) -> &CollectionConfig {
        &self.collection
    }

    /// Every record, public fields only.
    pub fn get_all(&self) -> Result<Vec<Record>, NodeError> {
        let snapshot = self.available()?;
        Ok(snapshot.query_all().iter().map(strip_internal).collect())
    }

    /// Records whose primary key is listed in `raw_ids`, shaped by the comma rule of
    /// [`IdSelector`].
    pub fn get_by_ids(&self, raw_ids: &str) -> Result<QueryResult, NodeError> {
        let selector = IdSelector::parse(raw_ids);
        let mut matches: Vec<Record> = self
            .find(&selector)?
            .iter()
            .map(strip_internal)
            .collect();

        if selector.plural {
            Ok(QueryResult::Many(matches))
        } else {
            Ok(QueryResult::One(matches.swap_remove(0)))
        }
    }

    /// Matching records with their internal fields intact, for use inside the node.
    ///
    /// Fails with the store error first, then with `NotFound` when nothing matches.
    pub fn find(&self, selector: &IdSelector) -> Result<Vec<Record>, NodeError> {
        let snapshot = self.available()?;
        if selector.ids.is_empty() {
            return Err(NodeError::NotFound);
        }

        let matches = snapshot.query_by(&self.collection.primary_key, &selector.ids);
        tracing::debug!(
            "{} lookup of {} id(s) matched {} record(s)",
            self.collection.name,
            selector.ids.len(),
            matches.len()
        );
        if matches.is_empty() {
            return Err(NodeError::NotFound);
        }
        Ok(matches)
    }

    fn available(&self) -> Result<Arc<StoreSnapshot>, NodeError> {
        let snapshot = self.store.snapshot();
        if let Some(message) = &snapshot.error_message {
            return Err(NodeError::StoreUnavailable(message.clone()));
        }
        if !snapshot.has_data() {
            return Err(NodeError::StoreUnavailable(format!(
                "{} data not yet loaded",
                self.collection.name
            )));
        }
        Ok(snapshot)
    }
}
