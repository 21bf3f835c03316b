//! Live audit feed over a real WebSocket connection.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use legalops_router::api::build_app;
use legalops_router::app_state::AppState;
use legalops_router::domain::EventBus;
use legalops_router::llm::LlmGateway;
use legalops_router::persistence::MemoryStore;
use legalops_router::service::{IngestInput, WorkflowService, WorkflowSettings};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start() -> (Arc<WorkflowService>, String) {
    let service = Arc::new(WorkflowService::new(
        Arc::new(MemoryStore::new()),
        LlmGateway::mock(),
        EventBus::new(256),
        WorkflowSettings::default(),
    ));
    let app = build_app(AppState::new(Arc::clone(&service)), Duration::from_secs(30));

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (service, format!("ws://{addr}/ws"))
}

async fn connect(url: &str) -> WsStream {
    let Ok((ws, _)) = connect_async(url).await else {
        panic!("ws connect failed");
    };
    ws
}

async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let Ok(Some(Ok(msg))) = timeout(Duration::from_secs(5), ws.next()).await else {
            panic!("no message within timeout");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("non-JSON frame: {text}");
            };
            return value;
        }
    }
}

async fn subscribe(ws: &mut WsStream, case_ids: &[&str]) -> Value {
    let command = json!({
        "id": "sub-1",
        "type": "command",
        "payload": { "command": "subscribe", "case_ids": case_ids },
    });
    let Ok(()) = ws.send(Message::text(command.to_string())).await else {
        panic!("send failed");
    };
    next_json(ws).await
}

async fn ingest(service: &WorkflowService, case_id: &str) {
    let result = service
        .ingest(IngestInput {
            case_id: case_id.to_string(),
            text: "Any update on my claim?".to_string(),
            attachments: Vec::new(),
        })
        .await;
    tokio_test::assert_ok!(result);
}

#[tokio::test]
async fn subscriber_receives_events_for_its_case() {
    let (service, url) = start().await;
    let mut ws = connect(&url).await;

    let reply = subscribe(&mut ws, &["case-ws"]).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["payload"]["count"], 1);

    ingest(&service, "other-case").await;
    ingest(&service, "case-ws").await;

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["case_id"], "case-ws");
    assert_eq!(event["payload"]["entry"]["action"], "message_ingested");
}

#[tokio::test]
async fn wildcard_receives_system_events() {
    let (service, url) = start().await;
    let mut ws = connect(&url).await;

    let reply = subscribe(&mut ws, &["*"]).await;
    assert_eq!(reply["payload"]["wildcard"], true);

    ingest(&service, "case-a").await;
    let Ok(classified) = service.loop_tick().await else {
        panic!("loop tick failed");
    };
    assert_eq!(classified.len(), 1);

    let mut actions = Vec::new();
    while !actions.iter().any(|a| a == "loop_tick") {
        let event = next_json(&mut ws).await;
        if let Some(action) = event["payload"]["entry"]["action"].as_str() {
            actions.push(action.to_string());
        }
    }
    assert_eq!(
        actions,
        vec!["message_ingested", "classified", "loop_tick"]
    );
}

#[tokio::test]
async fn unknown_command_gets_error_reply() {
    let (_service, url) = start().await;
    let mut ws = connect(&url).await;

    let command = json!({ "id": "x", "type": "command", "payload": { "command": "swap" } });
    let Ok(()) = ws.send(Message::text(command.to_string())).await else {
        panic!("send failed");
    };
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["payload"]["code"], 404);
}
