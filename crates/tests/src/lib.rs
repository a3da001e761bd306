//! # Integration Tests
//!
//! End-to-end tests against a mock site.
//!
//! Covers:
//! - Contract smoke tests
//! - Queue -> worker -> HTTP wire format
//! - Dispatcher lifecycle driven from a loaded config

#[cfg(test)]
mod contract_tests {
    use contracts::{track_metrics_url, MetricEvent, MetricsPayload, MIN_METRICS_VERSION};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert_eq!(MIN_METRICS_VERSION.to_string(), "7.4.0");
    }

    #[test]
    fn test_payload_shape() {
        let payload = MetricsPayload::new("tok", &[MetricEvent::new("App", "Opened")]);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["auth_args"]["session_token"], "tok");
        assert_eq!(json["metrics"][0]["event_group"], "App");
        assert_eq!(json["metrics"][0]["event_name"], "Opened");
        assert_eq!(json["metrics"][0]["event_property"]["event_type"], "event");
        assert_eq!(
            track_metrics_url("https://studio.example.com/"),
            "https://studio.example.com/api3/track_metrics/"
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{
        ContractError, DispatchHook, HookConfig, HookKind, MetricEvent, RelayConfig, SiteConfig,
    };
    use dispatcher::{
        create_dispatcher, CycleOutcome, DispatchMetrics, DispatchWorker, HttpConnection,
        MetricQueue, WorkerExit,
    };
    use serde_json::{json, Value};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Hook that keeps every batch it is handed
    #[derive(Default)]
    struct CollectingHook {
        batches: Mutex<Vec<Vec<Value>>>,
    }

    impl DispatchHook for CollectingHook {
        fn on_dispatched(&self, metrics: &[Value]) -> Result<(), ContractError> {
            self.batches.lock().unwrap().push(metrics.to_vec());
            Ok(())
        }
    }

    async fn site_with_version(version: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api3/info/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": version })))
            .mount(&server)
            .await;
        server
    }

    fn site_config(server: &MockServer) -> SiteConfig {
        SiteConfig {
            base_url: server.uri(),
            user: Some("jdoe".to_string()),
            session_token: "secret-token".to_string(),
            proxy: None,
            timeout_secs: 5,
        }
    }

    fn worker(
        server: &MockServer,
        queue: Arc<MetricQueue>,
        hook: Arc<CollectingHook>,
    ) -> DispatchWorker<HttpConnection> {
        let connection = HttpConnection::new(&site_config(server)).unwrap();
        let (worker, _halt_tx) = DispatchWorker::new(
            0,
            queue,
            Arc::new(connection),
            hook,
            Arc::new(DispatchMetrics::new()),
            Duration::from_millis(10),
            10,
        );
        worker
    }

    fn fill(queue: &MetricQueue, count: usize) {
        for i in 0..count {
            queue.log_event("Toolkit", format!("Event {i}"), [("index", i as u64)], false);
        }
    }

    async fn track_metrics_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == "/api3/track_metrics/")
            .map(|r| r.body_json::<Value>().unwrap())
            .collect()
    }

    /// Poll until `done` holds or roughly two seconds pass
    async fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..200 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn test_cycle_posts_wire_format() {
        let server = site_with_version(json!([8, 0, 0])).await;
        Mock::given(method("POST"))
            .and(path("/api3/track_metrics/"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(json!({
                "auth_args": { "session_token": "secret-token" }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(2)
            .mount(&server)
            .await;

        let queue = Arc::new(MetricQueue::new());
        fill(&queue, 15);
        let hook = Arc::new(CollectingHook::default());
        let worker = worker(&server, Arc::clone(&queue), Arc::clone(&hook));

        assert_eq!(worker.run_cycle().await, CycleOutcome::Delivered(10));
        assert_eq!(queue.len(), 5);
        assert_eq!(worker.run_cycle().await, CycleOutcome::Delivered(5));
        assert_eq!(worker.run_cycle().await, CycleOutcome::Idle);

        let bodies = track_metrics_bodies(&server).await;
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0]["metrics"].as_array().unwrap().len(), 10);
        assert_eq!(bodies[1]["metrics"].as_array().unwrap().len(), 5);

        // FIFO across batches
        assert_eq!(bodies[0]["metrics"][0]["event_name"], "Event 0");
        assert_eq!(bodies[1]["metrics"][0]["event_name"], "Event 10");
        assert_eq!(
            bodies[0]["metrics"][3]["event_property"],
            json!({ "event_type": "event", "index": 3 })
        );

        let batches = hook.batches.lock().unwrap();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], bodies[0]["metrics"].as_array().unwrap().clone());
    }

    #[tokio::test]
    async fn test_server_error_still_notifies_hook() {
        let server = site_with_version(json!([7, 4, 0])).await;
        Mock::given(method("POST"))
            .and(path("/api3/track_metrics/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let queue = Arc::new(MetricQueue::new());
        fill(&queue, 3);
        let hook = Arc::new(CollectingHook::default());
        let worker = worker(&server, Arc::clone(&queue), Arc::clone(&hook));

        assert_eq!(worker.run_cycle().await, CycleOutcome::Dropped(3));
        assert!(queue.is_empty());
        assert_eq!(hook.batches.lock().unwrap()[0].len(), 3);
    }

    #[tokio::test]
    async fn test_old_site_exits_without_posting() {
        let server = site_with_version(json!([7, 3, 9])).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let queue = Arc::new(MetricQueue::new());
        fill(&queue, 4);
        let hook = Arc::new(CollectingHook::default());
        let worker = worker(&server, Arc::clone(&queue), Arc::clone(&hook));

        assert_eq!(worker.run().await, WorkerExit::Unsupported);
        assert_eq!(queue.len(), 4);
        assert!(hook.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_once_suppresses_repeat_identity() {
        let server = site_with_version(json!([8, 1, 0])).await;
        Mock::given(method("POST"))
            .and(path("/api3/track_metrics/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let queue = Arc::new(MetricQueue::new());
        queue.enqueue(MetricEvent::new("Toolkit", "Launched"), true);
        queue.enqueue(MetricEvent::new("Toolkit", "Launched"), true);
        queue.enqueue(MetricEvent::new("Toolkit", "Launched"), false);

        let hook = Arc::new(CollectingHook::default());
        let worker = worker(&server, Arc::clone(&queue), hook);
        assert_eq!(worker.run_cycle().await, CycleOutcome::Delivered(2));

        // Identity stays seen after the events are dispatched
        queue.enqueue(MetricEvent::new("Toolkit", "Launched"), true);
        assert!(queue.is_empty());
        assert_eq!(queue.stats().suppressed, 2);
    }

    #[tokio::test]
    async fn test_dispatcher_from_config_with_file_hook() {
        let server = site_with_version(json!([8, 0, 0])).await;
        Mock::given(method("POST"))
            .and(path("/api3/track_metrics/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let hook_path = dir.path().join("hooks").join("metrics.jsonl");
        let toml = format!(
            r#"
[site]
base_url = "{}"
user = "jdoe"
session_token = "secret-token"

[dispatch]
workers = 2
interval_secs = 0.02

[hook]
kind = "file"
path = "{}"
"#,
            server.uri(),
            hook_path.display()
        );
        let config: RelayConfig =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.hook.kind, HookKind::File);

        let queue = Arc::new(MetricQueue::new());
        fill(&queue, 25);

        let mut dispatcher = create_dispatcher(&config, Arc::clone(&queue)).unwrap();
        dispatcher.start();
        assert!(dispatcher.is_dispatching());
        assert_eq!(dispatcher.worker_count(), 2);

        let metrics = dispatcher.metrics_handle();
        wait_until(|| metrics.snapshot().events_sent == 25).await;
        let exits = dispatcher.shutdown().await;

        assert_eq!(exits, vec![WorkerExit::Halted, WorkerExit::Halted]);
        assert!(queue.is_empty());
        assert_eq!(metrics.snapshot().events_sent, 25);

        let bodies = track_metrics_bodies(&server).await;
        let posted: usize = bodies
            .iter()
            .map(|b| b["metrics"].as_array().unwrap().len())
            .sum();
        assert_eq!(posted, 25);
        assert!(bodies
            .iter()
            .all(|b| b["metrics"].as_array().unwrap().len() <= 10));

        let content = std::fs::read_to_string(&hook_path).unwrap();
        let hooked: u64 = content
            .lines()
            .map(|line| serde_json::from_str::<Value>(line).unwrap()["count"].as_u64().unwrap())
            .sum();
        assert_eq!(hooked, 25);
    }

    #[tokio::test]
    async fn test_dispatcher_without_user_never_probes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = RelayConfig {
            version: Default::default(),
            site: SiteConfig {
                user: None,
                ..site_config(&server)
            },
            dispatch: Default::default(),
            hook: HookConfig {
                kind: HookKind::None,
                path: None,
            },
        };

        let queue = Arc::new(MetricQueue::new());
        fill(&queue, 2);
        let mut dispatcher = create_dispatcher(&config, Arc::clone(&queue)).unwrap();
        dispatcher.start();
        assert!(!dispatcher.is_dispatching());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(queue.len(), 2);
    }

    #[tokio::test]
    async fn test_stop_restart_keeps_undelivered_events() {
        let server = site_with_version(json!([8, 0, 0])).await;
        Mock::given(method("POST"))
            .and(path("/api3/track_metrics/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let config = RelayConfig {
            version: Default::default(),
            site: site_config(&server),
            dispatch: contracts::DispatchConfig {
                workers: 1,
                interval_secs: 0.01,
                batch_size: 10,
            },
            hook: HookConfig {
                kind: HookKind::None,
                path: None,
            },
        };

        let queue = Arc::new(MetricQueue::new());
        let mut dispatcher = create_dispatcher(&config, Arc::clone(&queue)).unwrap();
        dispatcher.start();
        dispatcher.stop();
        assert!(!dispatcher.is_dispatching());

        // Enqueued while stopped
        fill(&queue, 3);
        assert_eq!(queue.len(), 3);

        dispatcher.start();
        let metrics = dispatcher.metrics_handle();
        wait_until(|| metrics.snapshot().events_sent == 3).await;
        dispatcher.shutdown().await;

        assert!(queue.is_empty());
        assert_eq!(metrics.snapshot().events_sent, 3);
    }

    #[test]
    fn test_aggregator_reads_live_counters() {
        let queue = MetricQueue::new();
        fill(&queue, 12);
        queue.drain(Some(10));

        let mut aggregator = observability::RelayStatsAggregator::new();
        aggregator.update(queue.stats(), Default::default());
        let summary = aggregator.summary(Duration::from_secs(1));

        assert_eq!(summary.enqueued, 12);
        assert_eq!(summary.pending, 2);
    }
}
