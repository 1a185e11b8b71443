use super::middleware::access_log;
use crate::config::{CollectionConfig, NodeConfig};
use crate::discovery::directory::ServiceDirectory;
use crate::discovery::resolver::{DiscoveryResolver, DnsResolver, NameResolver};
use crate::health::handlers::handle_healthz;
use crate::health::reporter::HealthReporter;
use crate::population::engine::PopulationEngine;
use crate::population::source::{HttpRecordSource, RecordSource};
use crate::population::types::PopulationState;
use crate::query::engine::QueryEngine;
use crate::query::handlers::{handle_get_all, handle_get_by_ids};
use crate::relations::handlers::handle_get_related;
use crate::relations::resolver::RelationResolver;
use crate::storage::store::RecordStore;

use anyhow::Result;
use axum::{Extension, Router, middleware, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const ENDPOINT_HEALTHZ: &str = "/healthz";

/// Everything one node runs, wired together from configuration.
pub struct CollectionNode {
    pub collection: CollectionConfig,
    pub store: Arc<RecordStore>,
    pub population: Arc<PopulationEngine>,
    pub directory: Arc<ServiceDirectory>,
    pub discovery: Arc<DiscoveryResolver>,
    pub query: Arc<QueryEngine>,
    pub relations: Arc<RelationResolver>,
    pub health: Arc<HealthReporter>,
    recheck_interval: Option<Duration>,
}

impl CollectionNode {
    /// Production wiring: HTTP upstream source and system DNS.
    pub fn new(config: &NodeConfig) -> Result<Arc<Self>> {
        let source = Arc::new(HttpRecordSource::new(&config.source_url, config.fetch_timeout));
        Self::with_parts(config, source, Arc::new(DnsResolver))
    }

    pub fn with_parts(
        config: &NodeConfig,
        source: Arc<dyn RecordSource>,
        resolver: Arc<dyn NameResolver>,
    ) -> Result<Arc<Self>> {
        let collection = config.collection.clone();
        let store = RecordStore::new();
        let population =
            PopulationEngine::new(&collection.name, store.clone(), source, config.retry.clone());
        let directory = ServiceDirectory::new(&config.services)?;
        let discovery = DiscoveryResolver::new(directory.clone(), resolver);
        let query = QueryEngine::new(collection.clone(), store.clone());
        let relations = RelationResolver::new(
            query.clone(),
            directory.clone(),
            config.relations.clone(),
            config.relation_timeout,
            config.max_outbound,
        );
        let health = HealthReporter::new(&collection.name, store.clone(), Some(population.clone()));

        Ok(Arc::new(Self {
            collection,
            store,
            population,
            directory,
            discovery,
            query,
            relations,
            health,
            recheck_interval: config.recheck_interval,
        }))
    }

    /// Launches population and the discovery check. Neither blocks request handling.
    pub fn start_background(&self) -> (JoinHandle<PopulationState>, JoinHandle<()>) {
        let population = self.population.clone().start();
        let discovery = self.discovery.clone().start(self.recheck_interval);
        (population, discovery)
    }

    /// Routes for this node's collection plus the health endpoint.
    pub fn router(&self) -> Router {
        let name = &self.collection.name;

        Router::new()
            .route(ENDPOINT_HEALTHZ, get(handle_healthz))
            .route(&format!("/{}", name), get(handle_get_all))
            .route(&format!("/{}/:id", name), get(handle_get_by_ids))
            .route(&format!("/{}/:id/:related", name), get(handle_get_related))
            .layer(middleware::from_fn(access_log))
            .layer(Extension(self.query.clone()))
            .layer(Extension(self.relations.clone()))
            .layer(Extension(self.health.clone()))
    }
}
