//! Request handler integration tests
//!
//! Drive the full pipeline (decode, validate, build, submit, poll,
//! materialize) against a scripted engine and check the response envelopes.

use quake_query::api::{QueryHandler, RawRequest, ResponseBody, ResponseEnvelope, CORS_HEADERS};
use quake_query::config::QueryConfig;
use quake_query::engine::{
    EngineCall, ExecutionState, ExecutionStatus, QueryEngine, ResultSet, ScriptedEngine,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const VALID_BODY: &str = r#"{"start_date":"2024-03-01","end_date":"2024-03-02"}"#;

fn test_config() -> QueryConfig {
    QueryConfig {
        poll_interval: Duration::from_millis(2),
        max_wait: Duration::from_millis(20),
        ..QueryConfig::default()
    }
}

fn handler_for(engine: &Arc<ScriptedEngine>) -> QueryHandler {
    let engine: Arc<dyn QueryEngine> = engine.clone();
    QueryHandler::new(engine, test_config()).expect("Failed to create handler")
}

fn row(cells: &[&str]) -> Vec<Option<String>> {
    cells.iter().map(|c| Some((*c).to_string())).collect()
}

fn quake_results() -> ResultSet {
    ResultSet {
        columns: vec!["full_time".into(), "mag".into(), "place".into(), "id".into()],
        rows: vec![
            row(&["full_time", "mag", "place", "id"]),
            row(&["2024-03-01 04:12:09", "2.6", "10 km SW of Anza, CA", "ci40000001"]),
            vec![
                Some("2024-03-01 18:40:51".into()),
                Some("4.1".into()),
                None,
                Some("us7000m1ab".into()),
            ],
        ],
        has_header_row: true,
    }
}

fn body_json(envelope: &ResponseEnvelope) -> Value {
    serde_json::to_value(&envelope.body).expect("body serializes")
}

fn assert_cors(envelope: &ResponseEnvelope) {
    for (name, value) in CORS_HEADERS {
        assert_eq!(envelope.headers.get(name).map(String::as_str), Some(value), "{}", name);
    }
}

/// Exactly one of `data` and `error` is present.
fn assert_exclusive(envelope: &ResponseEnvelope) {
    let body = body_json(envelope);
    let has_data = body.get("data").is_some();
    let has_error = body.get("error").and_then(Value::as_str).is_some_and(|e| !e.is_empty());
    assert!(has_data ^ has_error, "body must carry data or error, not both: {}", body);
}

#[tokio::test]
async fn test_success_returns_records_in_engine_order() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let envelope = handler_for(&engine).handle(RawRequest::post(VALID_BODY)).await;

    assert_eq!(envelope.status_code, 200);
    assert_cors(&envelope);
    assert_exclusive(&envelope);

    let body = body_json(&envelope);
    assert_eq!(body["count"], 2);
    assert_eq!(body["query_execution_id"], "scripted-1");
    assert_eq!(body["data"][0]["id"], "ci40000001");
    assert_eq!(body["data"][1]["id"], "us7000m1ab");
    assert_eq!(body["data"][1]["place"], Value::Null);

    let text = envelope.body_text().unwrap();
    assert!(text.find("\"full_time\"").unwrap() < text.find("\"mag\"").unwrap());
}

#[tokio::test]
async fn test_single_row_after_one_check() {
    let engine = Arc::new(ScriptedEngine::succeeding(ResultSet {
        columns: vec!["id".into(), "mag".into()],
        rows: vec![row(&["q1", "4.5"])],
        has_header_row: false,
    }));
    let envelope = handler_for(&engine).handle(RawRequest::post(VALID_BODY)).await;

    assert_eq!(envelope.status_code, 200);
    let body = body_json(&envelope);
    assert_eq!(body["data"], json!([{"id": "q1", "mag": "4.5"}]));
    assert_eq!(body["count"], 1);
    assert_eq!(engine.status_checks(), 1);
}

#[tokio::test]
async fn test_header_only_result_is_empty_success() {
    let engine = Arc::new(ScriptedEngine::succeeding(ResultSet {
        columns: vec!["id".into(), "mag".into()],
        rows: vec![row(&["id", "mag"])],
        has_header_row: true,
    }));
    let envelope = handler_for(&engine).handle(RawRequest::post(VALID_BODY)).await;

    assert_eq!(envelope.status_code, 200);
    let body = body_json(&envelope);
    assert_eq!(body["count"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_missing_dates_are_rejected_before_submission() {
    for body in [
        r#"{"end_date":"2024-03-02"}"#,
        r#"{"start_date":"2024-03-01"}"#,
        r#"{}"#,
    ] {
        let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
        let envelope = handler_for(&engine).handle(RawRequest::post(body)).await;

        assert_eq!(envelope.status_code, 400, "{}", body);
        assert_eq!(body_json(&envelope), json!({"error": "start_date and end_date required"}));
        assert_cors(&envelope);
        assert!(engine.calls().is_empty());
    }
}

#[tokio::test]
async fn test_invalid_json_is_400() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let envelope = handler_for(&engine).handle(RawRequest::post("start_date=2024-03-01")).await;

    assert_eq!(envelope.status_code, 400);
    let error = body_json(&envelope)["error"].as_str().unwrap().to_string();
    assert!(error.contains("Invalid JSON"), "{}", error);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_date_is_400() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let body = r#"{"start_date":"2024-03-01' OR '1'='1","end_date":"2024-03-02"}"#;
    let envelope = handler_for(&engine).handle(RawRequest::post(body)).await;

    assert_eq!(envelope.status_code, 400);
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_options_short_circuits_regardless_of_body() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let handler = handler_for(&engine);

    for request in [
        RawRequest::options(),
        RawRequest::from_event(json!({
            "requestContext": {"http": {"method": "OPTIONS"}},
            "body": "not json at all"
        })),
    ] {
        let envelope = handler.handle(request).await;
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.body, ResponseBody::Empty);
        assert_eq!(envelope.body_text().unwrap(), "");
        assert_cors(&envelope);
    }
    assert!(engine.calls().is_empty());
}

#[tokio::test]
async fn test_submission_rejection_is_500_with_reason() {
    let engine = Arc::new(ScriptedEngine::rejecting("Database earthquakes_db_dashboard not found"));
    let envelope = handler_for(&engine).handle(RawRequest::post(VALID_BODY)).await;

    assert_eq!(envelope.status_code, 500);
    let error = body_json(&envelope)["error"].as_str().unwrap().to_string();
    assert!(error.contains("Database earthquakes_db_dashboard not found"), "{}", error);
    assert_eq!(engine.status_checks(), 0);
    assert_exclusive(&envelope);
}

#[tokio::test]
async fn test_timeout_skips_materialization() {
    let engine = Arc::new(ScriptedEngine::always_running());
    let envelope = handler_for(&engine).handle(RawRequest::post(VALID_BODY)).await;

    assert_eq!(envelope.status_code, 500);
    assert_eq!(body_json(&envelope), json!({"error": "Query timeout"}));
    assert_eq!(engine.status_checks(), 10);
    assert_eq!(engine.result_fetches(), 0);
}

#[tokio::test]
async fn test_failed_and_cancelled_surface_engine_detail() {
    for (state, reason) in [
        (ExecutionState::Failed, "SYNTAX_ERROR: line 4:13: Column 'event_date' cannot be resolved"),
        (ExecutionState::Cancelled, "Query was cancelled by the workgroup"),
    ] {
        let engine = Arc::new(ScriptedEngine::with_statuses(
            vec![
                ExecutionStatus::new(ExecutionState::Running),
                ExecutionStatus::with_reason(state, reason),
            ],
            quake_results(),
        ));
        let envelope = handler_for(&engine).handle(RawRequest::post(VALID_BODY)).await;

        assert_eq!(envelope.status_code, 500);
        let body = body_json(&envelope);
        assert_eq!(body["error"], format!("Athena query failed: {}", state));
        assert_eq!(body["details"], reason);
        assert!(body.get("data").is_none());
        assert_eq!(engine.result_fetches(), 0);
    }
}

#[tokio::test]
async fn test_repeated_calls_are_independent_executions() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let handler = handler_for(&engine);

    let first = handler.handle(RawRequest::post(VALID_BODY)).await;
    let second = handler.handle(RawRequest::post(VALID_BODY)).await;

    let first = body_json(&first);
    let second = body_json(&second);
    assert_ne!(first["query_execution_id"], second["query_execution_id"]);
    assert_eq!(first["data"], second["data"]);

    let submissions =
        engine.calls().iter().filter(|c| matches!(c, EngineCall::Submit { .. })).count();
    assert_eq!(submissions, 2);
}

#[tokio::test]
async fn test_concurrent_calls_poll_independently() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let handler = Arc::new(handler_for(&engine));

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move { handler.handle(RawRequest::post(VALID_BODY)).await })
        })
        .collect();

    for task in tasks {
        let envelope = task.await.expect("handler task panicked");
        assert_eq!(envelope.status_code, 200);
    }
    assert_eq!(engine.result_fetches(), 4);
}

#[tokio::test]
async fn test_direct_invocation_event() {
    let engine = Arc::new(ScriptedEngine::succeeding(quake_results()));
    let event = json!({"start_date": "2024-03-01", "end_date": "2024-03-02"});
    let envelope = handler_for(&engine).handle(RawRequest::from_event(event)).await;

    assert_eq!(envelope.status_code, 200);
    let proxy = envelope.to_proxy_response().unwrap();
    let inner: Value = serde_json::from_str(proxy["body"].as_str().unwrap()).unwrap();
    assert_eq!(inner["count"], 2);
}
