//! Warehouse upsert tests on in-memory SQLite

use crate::assert_ok;
use crate::common::{RecordFactory, TestDatabase};
use llm_meter::GatewayError;
use llm_meter::storage::LogStore;

#[tokio::test]
async fn test_request_upsert_is_idempotent() {
    let db = TestDatabase::new().await;
    let mut record = RecordFactory::request("req-1");
    record.properties.insert("team".to_string(), "search".to_string());

    assert_ok!(db.db().upsert_request(&record).await);
    assert_ok!(db.db().upsert_request(&record).await);

    record.user_id = Some("user-7".to_string());
    assert_ok!(db.db().upsert_request(&record).await);

    let row = assert_ok!(db.db().find_request("req-1").await).expect("request row");
    assert_eq!(row.provider, "openai");
    assert_eq!(row.user_id.as_deref(), Some("user-7"));
    assert!(!row.is_stream);
}

#[tokio::test]
async fn test_response_upsert_keeps_one_row() {
    let db = TestDatabase::new().await;
    let mut record = RecordFactory::response("req-1");
    record.cost = Some(0.006);

    assert_ok!(db.db().upsert_response(&record).await);
    record.status = -3;
    record.completion_reason = Some("cancel".to_string());
    assert_ok!(db.db().upsert_response(&record).await);

    let row = assert_ok!(db.db().find_response(&record.id).await).expect("response row");
    assert_eq!(row.request_id, "req-1");
    assert_eq!(row.status, -3);
    assert_eq!(row.completion_reason.as_deref(), Some("cancel"));
    assert_eq!(row.prompt_tokens, Some(100));
    assert!((row.cost.unwrap() - 0.006).abs() < 1e-12);
}

#[tokio::test]
async fn test_feedback_batch_needs_logged_responses() {
    let db = TestDatabase::new().await;
    let response = RecordFactory::response("req-1");
    assert_ok!(db.db().upsert_response(&response).await);

    let batch = vec![
        RecordFactory::feedback(&response.id, true),
        RecordFactory::feedback("never-logged", false),
    ];
    let err = db.db().upsert_feedback_batch(&batch).await.unwrap_err();
    assert!(matches!(err, GatewayError::BatchApply(_)));

    // Nothing from the failed batch was applied
    assert!(assert_ok!(db.db().find_feedback(&response.id).await).is_none());
}

#[tokio::test]
async fn test_feedback_last_record_wins() {
    let db = TestDatabase::new().await;
    let response = RecordFactory::response("req-1");
    assert_ok!(db.db().upsert_response(&response).await);

    let batch = vec![
        RecordFactory::feedback(&response.id, true),
        RecordFactory::feedback(&response.id, false),
    ];
    assert_ok!(db.db().upsert_feedback_batch(&batch).await);
    let row = assert_ok!(db.db().find_feedback(&response.id).await).expect("feedback row");
    assert!(!row.rating);

    // Redelivery of the same batch is harmless
    assert_ok!(db.db().upsert_feedback_batch(&batch).await);
    assert_ok!(db.db().upsert_feedback_batch(&[]).await);
}

#[tokio::test]
async fn test_health_check() {
    let db = TestDatabase::new().await;
    assert_ok!(db.db().health_check().await);
}
