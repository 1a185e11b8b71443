use super::record::{Record, identifier_text};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;

/// One complete, immutable view of the store.
///
/// Every reader works against a single snapshot, so a concurrent `replace` can never hand it a
/// mix of old and new records.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    /// `None` until the first successful population.
    pub records: Option<Arc<Vec<Record>>>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Time of the most recent population attempt, successful or not.
    pub last_attempt: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl StoreSnapshot {
    pub fn has_data(&self) -> bool {
        self.records.is_some()
    }

    pub fn record_count(&self) -> usize {
        self.records.as_ref().map(|records| records.len()).unwrap_or(0)
    }

    pub fn query_all(&self) -> Vec<Record> {
        self.records
            .as_ref()
            .map(|records| records.as_ref().clone())
            .unwrap_or_default()
    }

    /// Every record whose `field` equals any of `values`.
    pub fn query_by(&self, field: &str, values: &[String]) -> Vec<Record> {
        let Some(records) = self.records.as_ref() else {
            return Vec::new();
        };
        let wanted: HashSet<&str> = values.iter().map(String::as_str).collect();

        records
            .iter()
            .filter(|record| {
                record
                    .get(field)
                    .and_then(identifier_text)
                    .is_some_and(|text| wanted.contains(text.as_str()))
            })
            .cloned()
            .collect()
    }
}

/// In-memory record collection for a single node.
///
/// `replace` is the only way data enters the store and swaps the whole snapshot in one step.
pub struct RecordStore {
    snapshot: ArcSwap<StoreSnapshot>,
}

impl RecordStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Installs a fresh record set, clearing any error and stamping the update time.
    pub fn replace(&self, records: Vec<Record>) {
        let now = Utc::now();
        self.snapshot.store(Arc::new(StoreSnapshot {
            records: Some(Arc::new(records)),
            last_updated: Some(now),
            last_attempt: Some(now),
            error_message: None,
        }));
    }

    /// Records a failed population attempt. Held records, if any, are left in place.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        let now = Utc::now();
        self.snapshot.rcu(|current| StoreSnapshot {
            records: current.records.clone(),
            last_updated: current.last_updated,
            last_attempt: Some(now),
            error_message: Some(message.clone()),
        });
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.snapshot.load_full()
    }

    pub fn query_all(&self) -> Vec<Record> {
        self.snapshot.load().query_all()
    }

    pub fn query_by(&self, field: &str, values: &[String]) -> Vec<Record> {
        self.snapshot.load().query_by(field, values)
    }

    pub fn error_message(&self) -> Option<String> {
        self.snapshot.load().error_message.clone()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(StoreSnapshot::default()),
        }
    }
}
