//! Dispatcher integration tests.
//!
//! Exercise validation, the outbound call shape and outcome classification
//! against a recording stand-in for the n8n client.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{dispatcher, request, RecordingApi};
use mcp_n8n_bridge::protocol::{ErrorKind, Outcome};
use mcp_n8n_bridge::registry::HttpVerb;
use mcp_n8n_bridge::remote::RemoteError;
use serde_json::json;

const TIMEOUT: Duration = Duration::from_secs(5);

fn failure_kind(outcome: &Outcome) -> ErrorKind {
    match outcome {
        Outcome::Failure(f) => f.kind,
        Outcome::Success(v) => panic!("expected failure, got success: {v}"),
    }
}

// ---------------------------------------------------------------------------
// Rejections before any remote call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_method_never_reaches_remote() {
    let api = Arc::new(RecordingApi::ok(json!({})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    for params in [json!({}), json!(null), json!({"workflow_id": "1"}), json!([1, 2, 3])] {
        let outcome = dispatcher.dispatch(&request("r", "tools/list", params)).await;
        assert_eq!(failure_kind(&outcome), ErrorKind::UnknownMethod);
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn create_without_workflow_names_the_field() {
    let api = Arc::new(RecordingApi::ok(json!({"id": "new"})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r1", "create_workflow", json!({"name": "orphan"})))
        .await;

    match outcome {
        Outcome::Failure(f) => {
            assert_eq!(f.kind, ErrorKind::InvalidParams);
            assert_eq!(f.details, Some(json!({"field": "workflow"})));
            assert!(f.message.contains("workflow"), "message should name the field: {}", f.message);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(api.calls().is_empty(), "no outbound call may be made");
}

#[tokio::test]
async fn wrongly_typed_identifier_rejected() {
    let api = Arc::new(RecordingApi::ok(json!({})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "get_execution_status", json!({"execution_id": 42})))
        .await;

    assert_eq!(failure_kind(&outcome), ErrorKind::InvalidParams);
    assert!(api.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Outbound call shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_workflow_forwards_identifier_and_payload() {
    let api = Arc::new(RecordingApi::ok(json!({"data": {"executionId": "exec-77"}})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let payload = json!({
        "runData": {"Webhook": [{"json": {"x": 1}}]},
        "startNodes": ["Webhook"],
        "destinationNode": "Respond"
    });
    let outcome = dispatcher
        .dispatch(&request(
            "run-1",
            "run_workflow",
            json!({"workflow_id": "wf-12", "payload": payload}),
        ))
        .await;

    let calls = api.calls();
    assert_eq!(calls.len(), 1, "exactly one outbound call");
    assert_eq!(calls[0].verb, HttpVerb::Post);
    assert_eq!(calls[0].path(), "workflows/run");

    let mut expected_body = payload.clone();
    expected_body["workflowId"] = json!("wf-12");
    assert_eq!(calls[0].body, Some(expected_body));

    match outcome {
        Outcome::Success(data) => assert_eq!(data["data"]["executionId"], json!("exec-77")),
        other => panic!("expected success, got {other:?}"),
    }
}

#[tokio::test]
async fn run_workflow_without_payload_sends_identifier_only() {
    let api = Arc::new(RecordingApi::ok(json!({"executionId": 5})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "run_workflow", json!({"workflow_id": "wf-1"})))
        .await;

    assert!(outcome.is_success());
    assert_eq!(api.calls()[0].body, Some(json!({"workflowId": "wf-1"})));
}

#[tokio::test]
async fn delete_sends_no_body_and_acknowledges_empty_reply() {
    let api = Arc::new(RecordingApi::raw(204, ""));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "delete_workflow", json!({"workflow_id": "wf-3"})))
        .await;

    let calls = api.calls();
    assert_eq!(calls[0].verb, HttpVerb::Delete);
    assert_eq!(calls[0].path(), "workflows/wf-3");
    assert_eq!(calls[0].body, None);
    assert_eq!(outcome, Outcome::Success(json!({"status": "deleted"})));
}

#[tokio::test]
async fn list_passes_pagination_as_query() {
    let api = Arc::new(RecordingApi::ok(json!({"data": []})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    dispatcher
        .dispatch(&request("r", "list_workflows", json!({"limit": 25, "offset": 50})))
        .await;

    let calls = api.calls();
    assert_eq!(calls[0].verb, HttpVerb::Get);
    assert_eq!(
        calls[0].query,
        vec![
            ("limit".to_string(), "25".to_string()),
            ("offset".to_string(), "50".to_string()),
        ]
    );
}

// ---------------------------------------------------------------------------
// Explicit null means omitted
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_with_null_payload_sends_identifier_only() {
    let api = Arc::new(RecordingApi::ok(json!({"executionId": 8})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request(
            "r",
            "run_workflow",
            json!({"workflow_id": "wf", "payload": null}),
        ))
        .await;

    assert!(outcome.is_success(), "got {outcome:?}");
    assert_eq!(api.calls()[0].body, Some(json!({"workflowId": "wf"})));
}

#[tokio::test]
async fn list_with_null_limit_sends_no_query() {
    let api = Arc::new(RecordingApi::ok(json!({"data": []})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "list_workflows", json!({"limit": null, "offset": 10})))
        .await;

    assert!(outcome.is_success());
    assert_eq!(
        api.calls()[0].query,
        vec![("offset".to_string(), "10".to_string())]
    );
}

#[tokio::test]
async fn update_with_null_workflow_sends_empty_object() {
    let api = Arc::new(RecordingApi::ok(json!({"id": "wf"})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    dispatcher
        .dispatch(&request(
            "r",
            "update_workflow",
            json!({"workflow_id": "wf", "workflow": null}),
        ))
        .await;

    assert_eq!(api.calls()[0].body, Some(json!({})));
}

#[tokio::test]
async fn whole_float_limit_forwarded_as_integer() {
    let api = Arc::new(RecordingApi::ok(json!({"data": []})));
    let dispatcher = dispatcher(api.clone(), TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "list_workflows", json!({"limit": 5.0})))
        .await;

    assert!(outcome.is_success());
    assert_eq!(api.calls()[0].query, vec![("limit".to_string(), "5".to_string())]);
}

// ---------------------------------------------------------------------------
// Remote failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_remote_times_out() {
    let api = Arc::new(RecordingApi::ok(json!({})).with_delay(Duration::from_secs(10)));
    let dispatcher = dispatcher(api, Duration::from_millis(50));

    let started = Instant::now();
    let outcome = dispatcher
        .dispatch(&request("r", "get_execution_status", json!({"execution_id": "1"})))
        .await;

    assert_eq!(failure_kind(&outcome), ErrorKind::RemoteTimeout);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "timeout must fire promptly, took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn rejection_carries_status_and_body() {
    let api = Arc::new(RecordingApi::failing(RemoteError::Rejected {
        status: 404,
        body: json!({"message": "Workflow not found"}),
    }));
    let dispatcher = dispatcher(api, TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "update_workflow", json!({"workflow_id": "missing"})))
        .await;

    match outcome {
        Outcome::Failure(f) => {
            assert_eq!(f.kind, ErrorKind::RemoteRejected);
            assert_eq!(f.details.unwrap()["status"], json!(404));
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_remote_classified() {
    let api = Arc::new(RecordingApi::failing(RemoteError::Unreachable(
        "connection refused".into(),
    )));
    let dispatcher = dispatcher(api, TIMEOUT);

    let outcome = dispatcher.dispatch(&request("r", "list_workflows", json!({}))).await;
    assert_eq!(failure_kind(&outcome), ErrorKind::RemoteUnreachable);
}

#[tokio::test]
async fn run_reply_without_execution_id_is_malformed() {
    let api = Arc::new(RecordingApi::ok(json!({"accepted": true})));
    let dispatcher = dispatcher(api, TIMEOUT);

    let outcome = dispatcher
        .dispatch(&request("r", "run_workflow", json!({"workflow_id": "wf"})))
        .await;
    assert_eq!(failure_kind(&outcome), ErrorKind::RemoteMalformed);
}

#[tokio::test]
async fn client_panic_becomes_internal_failure() {
    let api = Arc::new(RecordingApi::panicking());
    let dispatcher = dispatcher(api, TIMEOUT);

    let outcome = dispatcher.dispatch(&request("r", "list_workflows", json!({}))).await;
    assert_eq!(failure_kind(&outcome), ErrorKind::InternalFailure);
}
