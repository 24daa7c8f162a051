//! Queue lanes draining into a SQLite warehouse

use crate::assert_ok;
use crate::common::RecordFactory;
use crate::common::database::test_db_config;
use llm_meter::config::{QueueConfig, StorageConfig};
use llm_meter::services::delivery::{BatchOutcome, DispatchRoute, LogDispatcher, lane_workers};
use llm_meter::storage::StorageLayer;

fn queue_config() -> QueueConfig {
    QueueConfig {
        max_message_bytes: 2048,
        ..QueueConfig::default()
    }
}

async fn storage(queue: &QueueConfig) -> StorageLayer {
    let config = StorageConfig {
        database: test_db_config(),
        ..StorageConfig::default()
    };
    assert_ok!(StorageLayer::new(&config, queue).await)
}

#[tokio::test]
async fn test_records_reach_the_warehouse() {
    let queue = queue_config();
    let storage = storage(&queue).await;
    let db = storage.database.clone().expect("database configured");
    let dispatcher = LogDispatcher::new(storage.queue.clone(), storage.kv.clone(), &queue);

    let request = RecordFactory::request("req-1");
    let mut response = RecordFactory::response("req-1");
    response.body = Some("x".repeat(4096));
    response.cost = Some(0.006);

    let (request_route, response_route) =
        assert_ok!(dispatcher.dispatch_records(request, response.clone()).await);
    assert!(matches!(request_route, DispatchRoute::Primary { .. }));
    assert!(matches!(response_route, DispatchRoute::Fallback { .. }));
    assert_ok!(
        dispatcher
            .submit_feedback(RecordFactory::feedback(&response.id, true))
            .await
    );

    let workers = lane_workers(&storage, &queue);
    let worker = |lane: &str| {
        workers
            .iter()
            .find(|w| w.lane() == lane)
            .cloned()
            .expect("worker for lane")
    };
    let primary = worker(&queue.lanes.primary);
    let fallback = worker(&queue.lanes.fallback);
    let feedback = worker(&queue.lanes.feedback);

    // Feedback for a response that is not logged yet waits for redelivery
    assert_eq!(
        assert_ok!(feedback.run_once().await),
        Some(BatchOutcome::Retry)
    );

    assert_eq!(assert_ok!(primary.run_once().await), Some(BatchOutcome::Ack));
    assert_eq!(assert_ok!(fallback.run_once().await), Some(BatchOutcome::Ack));
    assert_eq!(assert_ok!(feedback.run_once().await), Some(BatchOutcome::Ack));

    let row = assert_ok!(db.find_request("req-1").await).expect("request row");
    assert_eq!(row.provider, "openai");

    let row = assert_ok!(db.find_response(&response.id).await).expect("response row");
    assert_eq!(row.body.as_deref().map(str::len), Some(4096));
    assert_eq!(row.cost, Some(0.006));

    let row = assert_ok!(db.find_feedback(&response.id).await).expect("feedback row");
    assert!(row.rating);

    for worker in &workers {
        assert_eq!(assert_ok!(worker.run_once().await), None);
    }
}

#[tokio::test]
async fn test_storage_health_check() {
    let queue = queue_config();
    let storage = storage(&queue).await;
    let db = storage.database.clone().expect("database configured");
    assert_eq!(db.backend_type().as_str(), "sqlite");
    assert_ok!(storage.health_check().await);
}
