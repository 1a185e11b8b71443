//! Population Module Tests
//!
//! Exercises the retry state machine against scripted upstream sources on a paused tokio clock,
//! so attempt spacing is checked without real waiting.
//!
//! ## Test Scopes
//! - **State Machine**: Success, retry-then-success, and terminal failure paths.
//! - **Pacing**: Minimum spacing between attempts and no overlapping fetches.
//! - **RetryPolicy**: Fixed and exponential delays.
//! - **HttpRecordSource**: Fetching from a live upstream stub.

#[cfg(test)]
mod tests {
    use crate::population::engine::PopulationEngine;
    use crate::population::source::{HttpRecordSource, RecordSource};
    use crate::population::types::{PopulationState, RetryPolicy};
    use crate::storage::record::Record;
    use crate::storage::store::RecordStore;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const INTERVAL: Duration = Duration::from_secs(3);

    /// Upstream stand-in that replays a script of outcomes and fails once the script runs out.
    struct ScriptedSource {
        outcomes: Mutex<VecDeque<Result<Vec<Record>, String>>>,
        fetch_time: Duration,
        calls: AtomicU32,
        in_flight: AtomicU32,
        max_in_flight: AtomicU32,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<Result<Vec<Record>, String>>) -> Arc<Self> {
            Self::slow(outcomes, Duration::ZERO)
        }

        fn slow(outcomes: Vec<Result<Vec<Record>, String>>, fetch_time: Duration) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                fetch_time,
                calls: AtomicU32::new(0),
                in_flight: AtomicU32::new(0),
                max_in_flight: AtomicU32::new(0),
            })
        }

        fn always_failing() -> Arc<Self> {
            Self::new(Vec::new())
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RecordSource for ScriptedSource {
        async fn fetch(&self, _collection: &str) -> Result<Vec<Record>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if !self.fetch_time.is_zero() {
                tokio::time::sleep(self.fetch_time).await;
            }

            let next = self.outcomes.lock().unwrap().pop_front();
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match next {
                Some(Ok(records)) => Ok(records),
                Some(Err(message)) => Err(anyhow::anyhow!(message)),
                None => Err(anyhow::anyhow!("connect ECONNREFUSED testdata-service")),
            }
        }
    }

    fn records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| match json!({"accountId": format!("a{i}"), "_customerIds": ["c1"]}) {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect()
    }

    // ============================================================
    // STATE MACHINE TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_populates_store() {
        let store = RecordStore::new();
        let source = ScriptedSource::new(vec![Ok(records(4))]);
        let engine = PopulationEngine::new(
            "accounts",
            store.clone(),
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );

        assert_eq!(engine.state(), PopulationState::Empty);

        let final_state = engine.run().await;

        assert_eq!(final_state, PopulationState::Populated { records: 4 });
        assert_eq!(engine.state(), final_state);
        assert_eq!(source.calls(), 1);
        assert_eq!(store.snapshot().record_count(), 4);
        assert!(store.error_message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let store = RecordStore::new();
        let source = ScriptedSource::new(vec![
            Err("timeout".to_string()),
            Err("connection reset".to_string()),
            Ok(records(2)),
        ]);
        let engine = PopulationEngine::new(
            "accounts",
            store.clone(),
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );

        let final_state = engine.run().await;

        assert_eq!(final_state, PopulationState::Populated { records: 2 });
        assert_eq!(source.calls(), 3);
        let snapshot = store.snapshot();
        assert!(snapshot.error_message.is_none(), "success clears the retry error");
        assert!(snapshot.last_updated.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_upstream_response_is_success() {
        let store = RecordStore::new();
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let engine = PopulationEngine::new(
            "accounts",
            store.clone(),
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );

        let final_state = engine.run().await;

        assert_eq!(final_state, PopulationState::Populated { records: 0 });
        assert_eq!(source.calls(), 1);
        assert!(store.snapshot().has_data());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_ends_terminal_after_max_attempts() {
        let store = RecordStore::new();
        let source = ScriptedSource::always_failing();
        let engine = PopulationEngine::new(
            "accounts",
            store.clone(),
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );

        let final_state = engine.run().await;

        match &final_state {
            PopulationState::FailedTerminal { attempts, error } => {
                assert_eq!(*attempts, 12);
                assert_eq!(store.error_message().as_deref(), Some(error.as_str()));
            }
            other => panic!("expected terminal failure, got {other:?}"),
        }
        assert_eq!(source.calls(), 12);
        assert!(!store.snapshot().has_data());

        // No further attempts once terminal.
        tokio::time::sleep(INTERVAL * 10).await;
        assert_eq!(source.calls(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_reports_error_while_retrying() {
        let store = RecordStore::new();
        let source = ScriptedSource::always_failing();
        let engine = PopulationEngine::new(
            "accounts",
            store.clone(),
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );
        let mut states = engine.subscribe();

        let handle = engine.clone().start();

        // The second attempt only starts after the first failure was recorded.
        loop {
            states.changed().await.unwrap();
            let current = states.borrow_and_update().clone();
            if let PopulationState::Fetching { attempt } = current
                && attempt >= 2
            {
                break;
            }
        }
        assert_eq!(
            store.error_message().as_deref(),
            Some("accounts service not available")
        );

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_does_not_restart_population() {
        let store = RecordStore::new();
        let source = ScriptedSource::new(vec![Ok(records(1))]);
        let engine = PopulationEngine::new(
            "accounts",
            store,
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );

        engine.run().await;
        let again = engine.run().await;

        assert_eq!(again, PopulationState::Populated { records: 1 });
        assert_eq!(source.calls(), 1);
    }

    // ============================================================
    // PACING TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_fast_failures_are_spaced_by_interval() {
        let store = RecordStore::new();
        let source = ScriptedSource::always_failing();
        let engine = PopulationEngine::new(
            "accounts",
            store,
            source,
            RetryPolicy::fixed(INTERVAL, 5),
        );

        let started = tokio::time::Instant::now();
        engine.run().await;

        assert!(started.elapsed() >= INTERVAL * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_is_never_overlapped() {
        let store = RecordStore::new();
        let fetch_time = Duration::from_secs(5);
        let source = ScriptedSource::slow(
            vec![Err("slow".into()), Err("slow".into()), Ok(records(1))],
            fetch_time,
        );
        let engine = PopulationEngine::new(
            "accounts",
            store,
            source.clone(),
            RetryPolicy::fixed(INTERVAL, 12),
        );

        let started = tokio::time::Instant::now();
        engine.run().await;

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        assert!(
            started.elapsed() >= fetch_time * 3,
            "each attempt lasts as long as the slower of fetch and timer"
        );
        assert!(started.elapsed() < fetch_time * 3 + INTERVAL);
    }

    // ============================================================
    // RETRY POLICY TESTS
    // ============================================================

    #[test]
    fn test_fixed_policy_delay_is_constant() {
        let policy = RetryPolicy::fixed(INTERVAL, 12);
        assert_eq!(policy.delay_for(1), INTERVAL);
        assert_eq!(policy.delay_for(12), INTERVAL);
    }

    #[test]
    fn test_default_policy_matches_polling_period() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(3));
        assert_eq!(policy.max_attempts, 12);
    }

    #[test]
    fn test_exponential_policy_grows_and_caps() {
        let initial = Duration::from_millis(100);
        let max = Duration::from_secs(2);
        let policy = RetryPolicy::exponential(initial, max, 12);

        let first = policy.delay_for(1);
        assert!(first >= initial && first <= initial + initial / 10);

        let third = policy.delay_for(3);
        assert!(third >= initial * 4 && third <= initial * 4 + initial * 4 / 10);

        for attempt in 6..40 {
            assert!(policy.delay_for(attempt) <= max);
        }
        assert!(policy.delay_for(30) >= max - max / 10);
    }

    // ============================================================
    // HTTP SOURCE TESTS
    // ============================================================

    async fn spawn_upstream(status: axum::http::StatusCode, body: serde_json::Value) -> String {
        use axum::{Json, Router, routing::get};

        let app = Router::new().route(
            "/testdata/accounts",
            get(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/testdata", addr)
    }

    #[tokio::test]
    async fn test_http_source_fetches_record_array() {
        let base = spawn_upstream(
            axum::http::StatusCode::OK,
            json!([{"accountId": "a1"}, {"accountId": "a2", "_customerIds": ["c1"]}]),
        )
        .await;
        let source = HttpRecordSource::new(&format!("{base}/"), Duration::from_secs(2));

        let fetched = source.fetch("accounts").await.unwrap();

        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[1]["_customerIds"], json!(["c1"]));
    }

    #[tokio::test]
    async fn test_http_source_treats_error_status_as_failure() {
        let base = spawn_upstream(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            json!({"error": "warming up"}),
        )
        .await;
        let source = HttpRecordSource::new(&base, Duration::from_secs(2));

        let result = source.fetch("accounts").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_http_source_rejects_non_array_payload() {
        let base = spawn_upstream(axum::http::StatusCode::OK, json!({"accountId": "a1"})).await;
        let source = HttpRecordSource::new(&base, Duration::from_secs(2));

        assert!(source.fetch("accounts").await.is_err());
    }

    #[test]
    fn test_http_source_url_trims_trailing_slash() {
        let source = HttpRecordSource::new("http://testdata-service/testdata/", Duration::from_secs(1));
        assert_eq!(
            source.url_for("customers"),
            "http://testdata-service/testdata/customers"
        );
    }
}
