use crate::population::engine::PopulationEngine;
use crate::population::types::PopulationState;
use crate::storage::store::RecordStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub collection: String,
    pub healthy: bool,
    pub has_data: bool,
    pub record_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub error: Option<String>,
    pub population: PopulationState,
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.healthy {
            write!(
                f,
                "OK: {} holds {} records",
                self.collection, self.record_count
            )?;
            if let Some(updated) = self.last_updated {
                write!(f, ", last updated {}", updated.to_rfc3339())?;
            }
            return Ok(());
        }

        match &self.error {
            Some(error) => write!(f, "UNAVAILABLE: {}", error)?,
            None => write!(f, "UNAVAILABLE: {} data not yet loaded", self.collection)?,
        }
        write!(f, " ({})", self.population)
    }
}

/// Read-only view of store freshness.
pub struct HealthReporter {
    collection: String,
    store: Arc<RecordStore>,
    population: Option<Arc<PopulationEngine>>,
}

impl HealthReporter {
    pub fn new(
        collection: &str,
        store: Arc<RecordStore>,
        population: Option<Arc<PopulationEngine>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            collection: collection.to_string(),
            store,
            population,
        })
    }

    /// Healthy iff the store holds data, has been stamped, and carries no error.
    pub fn health(&self) -> HealthReport {
        let snapshot = self.store.snapshot();
        let healthy = snapshot.has_data()
            && snapshot.last_updated.is_some()
            && snapshot.error_message.is_none();

        HealthReport {
            collection: self.collection.clone(),
            healthy,
            has_data: snapshot.has_data(),
            record_count: snapshot.record_count(),
            last_updated: snapshot.last_updated,
            last_attempt: snapshot.last_attempt,
            error: snapshot.error_message.clone(),
            population: self
                .population
                .as_ref()
                .map(|engine| engine.state())
                .unwrap_or(PopulationState::Empty),
        }
    }
}
