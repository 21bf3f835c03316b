//! End-to-end workflow through the HTTP router against the in-memory
//! store, in mock mode or with a scripted live model.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use legalops_router::api::build_app;
use legalops_router::app_state::AppState;
use legalops_router::domain::EventBus;
use legalops_router::llm::{JsonModel, LlmError, LlmGateway};
use legalops_router::persistence::MemoryStore;
use legalops_router::service::{WorkflowService, WorkflowSettings};

/// Live model with a fixed answer, or a provider error when `None`.
#[derive(Debug)]
struct ScriptedModel(Option<Value>);

#[async_trait]
impl JsonModel for ScriptedModel {
    async fn generate_json(&self, _prompt: &str, _input: &str) -> Result<Value, LlmError> {
        self.0.clone().ok_or(LlmError::Upstream {
            status: 500,
            body: "internal".to_string(),
        })
    }
}

fn app_with(llm: LlmGateway) -> Router {
    let service = Arc::new(WorkflowService::new(
        Arc::new(MemoryStore::new()),
        llm,
        EventBus::new(256),
        WorkflowSettings::default(),
    ));
    build_app(AppState::new(service), Duration::from_secs(30))
}

fn app() -> Router {
    app_with(LlmGateway::mock())
}

fn live_app(answer: Option<Value>) -> Router {
    app_with(LlmGateway::new(false, Some(Arc::new(ScriptedModel(answer)))))
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router failed");
    };
    let status = response.status();
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body read failed");
    };
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
        panic!("bad request");
    };
    call(app, request).await
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let Ok(request) = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
    else {
        panic!("bad request");
    };
    call(app, request).await
}

async fn ingest(app: &Router, case_id: &str) -> String {
    let (status, body) = post(
        app,
        "/api/ingest",
        &json!({
            "caseId": case_id,
            "text": "Attaching my ortho bill. What are the next steps?",
            "attachments": [{ "filename": "ortho.pdf", "ocrText": "Orlando Ortho 01/18 $642.50" }],
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    let Some(id) = body["messageId"].as_str() else {
        panic!("missing messageId: {body}");
    };
    id.to_string()
}

fn task_of_type<'a>(tasks: &'a Value, task_type: &str) -> &'a Value {
    let Some(task) = tasks["data"]
        .as_array()
        .and_then(|rows| rows.iter().find(|t| t["type"] == task_type))
    else {
        panic!("no {task_type} task in {tasks}");
    };
    task
}

#[tokio::test]
async fn intake_to_execution() {
    let app = app();
    let message_id = ingest(&app, "case-42").await;

    let (status, body) = post(
        &app,
        "/api/classify",
        &json!({ "caseId": "case-42", "messageId": message_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "created": 2 }));

    let (_, pending) = get(&app, "/api/tasks?status=pending&caseId=case-42").await;
    assert_eq!(pending["data"].as_array().map(Vec::len), Some(2));
    assert_eq!(
        task_of_type(&pending, "evidence_sort")["assignee_agent"],
        "evidence_sorter"
    );

    let (status, body) = post(&app, "/api/orchestrator/run", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "dispatched": 2 }));

    let (_, proposed) = get(&app, "/api/tasks?status=proposed").await;
    let evidence = task_of_type(&proposed, "evidence_sort");
    assert_eq!(evidence["output"]["actions"][0]["kind"], "extract_table");
    let Some(task_id) = evidence["id"].as_str() else {
        panic!("task without id");
    };

    let (status, body) = post(
        &app,
        "/api/approve",
        &json!({ "taskId": task_id, "approve": true, "reviewer": "paralegal" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "executed");
    assert_eq!(body["execution"], json!({ "ok": true, "actionsProcessed": 1 }));

    let (_, task) = get(&app, &format!("/api/tasks/{task_id}")).await;
    assert_eq!(task["status"], "executed");

    let (_, saved) = get(&app, "/api/audit?action=evidence_table_saved").await;
    let Some(row) = saved["data"].as_array().and_then(|rows| rows.first()) else {
        panic!("no evidence_table_saved row");
    };
    assert_eq!(row["subject_type"], "task");
    assert_eq!(row["payload"]["rowsCount"], 2);

    let (status, telemetry) = get(&app, "/api/telemetry").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(telemetry["parallelDispatch"], 1);
    assert_eq!(telemetry["tasks"]["executed"], 1);
    assert_eq!(telemetry["tasks"]["proposed"], 1);
}

#[tokio::test]
async fn specialist_endpoints_hand_off_evidence() {
    let app = app();
    let message_id = ingest(&app, "case-7").await;
    let _ = post(&app, "/api/classify", &json!({ "messageId": message_id })).await;
    let (_, pending) = get(&app, "/api/tasks?caseId=case-7").await;

    let evidence_id = task_of_type(&pending, "evidence_sort")["id"].clone();
    let update_id = task_of_type(&pending, "client_update")["id"].clone();

    let (status, body) = post(
        &app,
        "/api/agents/evidence-sorter",
        &json!({ "taskId": evidence_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proposal"]["confidence"], 0.83);

    let (status, body) = post(
        &app,
        "/api/agents/client-comms",
        &json!({ "taskId": update_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summary = body["proposal"]["summary"].as_str().unwrap_or_default();
    assert!(summary.contains("Central Imaging (2025-01-25): $380"), "{summary}");

    let (_, telemetry) = get(&app, "/api/telemetry").await;
    assert_eq!(telemetry["a2aHandoff"], 1);
}

#[tokio::test]
async fn execute_counts_actions() {
    let app = app();
    let message_id = ingest(&app, "case-3").await;
    let _ = post(&app, "/api/classify", &json!({ "messageId": message_id })).await;
    let _ = post(&app, "/api/orchestrator/run", &json!({})).await;
    let (_, proposed) = get(&app, "/api/tasks?status=proposed").await;
    let update_id = task_of_type(&proposed, "client_update")["id"].clone();

    let (status, body) = post(&app, "/api/execute", &json!({ "taskId": update_id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "actionsProcessed": 1 }));

    let (_, sent) = get(&app, "/api/audit?action=draft_message_sent").await;
    let Some(row) = sent["data"].as_array().and_then(|rows| rows.first()) else {
        panic!("no draft_message_sent row");
    };
    assert_eq!(row["payload"]["to"], "client");
    assert_eq!(row["payload"]["subject"], "Case Update");
}

#[tokio::test]
async fn rejection_leaves_task_rejected() {
    let app = app();
    let message_id = ingest(&app, "case-5").await;
    let _ = post(&app, "/api/classify", &json!({ "messageId": message_id })).await;
    let (_, pending) = get(&app, "/api/tasks").await;
    let task_id = task_of_type(&pending, "client_update")["id"].clone();

    let (status, body) = post(
        &app,
        "/api/approve",
        &json!({ "taskId": task_id, "approve": false, "reviewer": "lead", "comments": "tone" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "status": "rejected" }));
}

#[tokio::test]
async fn loop_tick_picks_up_unclassified_messages() {
    let app = app();
    let _ = ingest(&app, "case-1").await;
    let _ = ingest(&app, "case-2").await;

    let (status, body) = post(&app, "/api/loop/tick", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "classified": 2 }));

    let (_, body) = post(&app, "/api/loop/tick", &json!({})).await;
    assert_eq!(body["classified"], 0);

    let (_, telemetry) = get(&app, "/api/telemetry").await;
    assert!(telemetry["lastLoop"].is_string());
}

#[tokio::test]
async fn ingest_validates_fields() {
    let app = app();
    let (status, body) = post(&app, "/api/ingest", &json!({ "caseId": "case-1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);

    let Ok(request) = Request::builder()
        .method("POST")
        .uri("/api/ingest")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
    else {
        panic!("bad request");
    };
    let (status, _) = call(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ingest_keeps_valid_fields_next_to_bad_ones() {
    let app = app();
    let bodies = [
        json!({ "caseId": "case-n1", "text": "hi", "attachments": null }),
        json!({ "caseId": "case-n2", "text": "hi", "attachments": [{ "filename": 7 }] }),
        json!({ "caseId": 42, "text": "hi" }),
    ];
    for body in &bodies {
        let (status, reply) = post(&app, "/api/ingest", body).await;
        assert_eq!(status, StatusCode::OK, "{body} -> {reply}");
        assert_eq!(reply["ok"], true);
    }

    let (_, messages) = get(&app, "/api/messages?caseId=42").await;
    assert_eq!(messages["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(messages["data"][0]["case_id"], "42");
}

#[tokio::test]
async fn ingest_accepts_multipart_forms() {
    let app = app();
    let boundary = "XBOUNDARYX";
    let form = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"caseId\"\r\n\r\ncase-mp\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\nSee attached\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"bill.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n%PDF-1.4\r\n\
         --{boundary}--\r\n"
    );
    let Ok(request) = Request::builder()
        .method("POST")
        .uri("/api/ingest")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(form))
    else {
        panic!("bad request");
    };
    let (status, body) = call(&app, request).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, messages) = get(&app, "/api/messages?caseId=case-mp").await;
    assert_eq!(messages["data"][0]["raw_text"], "See attached");
    assert_eq!(messages["data"][0]["source"], "upload");
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let app = app();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = post(&app, "/api/classify", &json!({ "messageId": missing })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], 2001);

    for uri in ["/api/approve", "/api/execute", "/api/agents/evidence-sorter"] {
        let (status, body) = post(
            &app,
            uri,
            &json!({ "taskId": missing, "approve": true, "reviewer": "x" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body["error"]["code"], 2002);
    }

    let (status, _) = get(&app, &format!("/api/tasks/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn orchestrator_with_nothing_pending() {
    let app = app();
    let (status, body) = post(&app, "/api/orchestrator/run", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "dispatched": 0 }));
}

#[tokio::test]
async fn task_listing_rejects_unknown_status() {
    let app = app();
    let (status, body) = get(&app, "/api/tasks?status=archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn health_reports_mock_mode() {
    let app = app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["llm_mode"], "mock");
}

#[tokio::test]
async fn classify_reports_model_failures() {
    let app = live_app(None);
    let message_id = ingest(&app, "case-llm").await;
    let (status, body) = post(&app, "/api/classify", &json!({ "messageId": message_id })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], 5001);

    let app = live_app(Some(json!({ "_raw": "no JSON here" })));
    let message_id = ingest(&app, "case-llm").await;
    let (status, body) = post(&app, "/api/classify", &json!({ "messageId": message_id })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], 5002);

    let (_, tasks) = get(&app, "/api/tasks?caseId=case-llm").await;
    assert_eq!(tasks["data"].as_array().map(Vec::len), Some(0));
}
