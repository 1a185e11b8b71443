//! Population State Machine
//!
//! Drives the store from `Empty` to either `Populated` or `FailedTerminal`.
//!
//! ## Attempt Cycle
//! Each attempt runs the upstream fetch alongside a wait timer and only moves on once both have
//! finished. Fast failures therefore still honour the retry interval, and a slow fetch is never
//! overlapped by the next one.

use super::source::RecordSource;
use super::types::{PopulationState, RetryPolicy};
use crate::storage::store::RecordStore;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct PopulationEngine {
    collection: String,
    store: Arc<RecordStore>,
    source: Arc<dyn RecordSource>,
    policy: RetryPolicy,
    state: watch::Sender<PopulationState>,
    started: AtomicBool,
}

impl PopulationEngine {
    pub fn new(
        collection: &str,
        store: Arc<RecordStore>,
        source: Arc<dyn RecordSource>,
        policy: RetryPolicy,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(PopulationState::Empty);
        Arc::new(Self {
            collection: collection.to_string(),
            store,
            source,
            policy,
            state,
            started: AtomicBool::new(false),
        })
    }

    pub fn state(&self) -> PopulationState {
        self.state.borrow().clone()
    }

    /// Observes state transitions. The receiver starts at the current state.
    pub fn subscribe(&self) -> watch::Receiver<PopulationState> {
        self.state.subscribe()
    }

    /// Spawns [`run`](Self::run) in the background.
    pub fn start(self: Arc<Self>) -> JoinHandle<PopulationState> {
        tokio::spawn(async move { self.run().await })
    }

    /// Runs the state machine to a final state and returns it.
    ///
    /// Only the first call drives population; later calls return the current state at once.
    pub async fn run(&self) -> PopulationState {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                "Population for {} already started, ignoring second run",
                self.collection
            );
            return self.state();
        }

        tracing::info!(
            "Populating {} (max {} attempts)",
            self.collection,
            self.policy.max_attempts
        );

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.transition(PopulationState::Fetching { attempt });

            let (result, _) = tokio::join!(
                self.source.fetch(&self.collection),
                tokio::time::sleep(self.policy.delay_for(attempt))
            );

            let error = match result {
                Ok(records) => {
                    let count = records.len();
                    self.store.replace(records);
                    tracing::info!(
                        "Loaded {} records for {} on attempt {}",
                        count,
                        self.collection,
                        attempt
                    );
                    return self.transition(PopulationState::Populated { records: count });
                }
                Err(e) => e,
            };

            if attempt >= self.policy.max_attempts {
                let message = format!(
                    "{} service not available (gave up after {} attempts)",
                    self.collection, attempt
                );
                self.store.fail(message.clone());
                tracing::error!(
                    "Population of {} failed permanently after {} attempts: {:#}",
                    self.collection,
                    attempt,
                    error
                );
                return self.transition(PopulationState::FailedTerminal {
                    attempts: attempt,
                    error: message,
                });
            }

            let message = format!("{} service not available", self.collection);
            self.store.fail(message.clone());
            tracing::warn!(
                "Population of {} failed (attempt {}/{}): {:#}",
                self.collection,
                attempt,
                self.policy.max_attempts,
                error
            );
            self.transition(PopulationState::FailedRetry {
                attempt,
                error: message,
            });
        }
    }

    fn transition(&self, next: PopulationState) -> PopulationState {
        tracing::debug!("{} population -> {}", self.collection, next);
        self.state.send_replace(next.clone());
        next
    }
}
