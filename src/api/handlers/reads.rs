//! Read-model handlers backing the inbox, tasks, audit and telemetry views.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    AuditListResponse, AuditQuery, MessageListResponse, MessageQuery, TaskDto, TaskListResponse,
    TaskQuery, TelemetryResponse,
};
use crate::app_state::AppState;
use crate::domain::{TaskId, TaskStatus};
use crate::error::{ErrorResponse, WorkflowError};
use crate::persistence::{AuditFilter, MessageFilter, TaskFilter, clamp_limit};

/// `GET /api/messages` — List messages, newest first.
///
/// # Errors
///
/// Returns a persistence error.
#[utoipa::path(
    get,
    path = "/api/messages",
    tag = "Reads",
    summary = "List messages",
    params(MessageQuery),
    responses(
        (status = 200, description = "Messages", body = MessageListResponse),
    )
)]
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<impl IntoResponse, WorkflowError> {
    let messages = state
        .service
        .messages(&MessageFilter {
            case_id: query.case_id,
            since: None,
            limit: clamp_limit(query.limit),
        })
        .await?;
    Ok(Json(MessageListResponse {
        data: messages.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /api/tasks` — List tasks, newest first.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidRequest`] for an unknown `status`.
#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = "Reads",
    summary = "List tasks",
    params(TaskQuery),
    responses(
        (status = 200, description = "Tasks", body = TaskListResponse),
        (status = 400, description = "Unknown status", body = ErrorResponse),
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<TaskQuery>,
) -> Result<impl IntoResponse, WorkflowError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()
        .map_err(WorkflowError::InvalidRequest)?;
    let tasks = state
        .service
        .tasks(&TaskFilter {
            status,
            case_id: query.case_id,
            limit: clamp_limit(query.limit),
        })
        .await?;
    Ok(Json(TaskListResponse {
        data: tasks.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /api/tasks/{id}` — Fetch one task.
///
/// # Errors
///
/// Returns [`WorkflowError::TaskNotFound`] for an unknown task.
#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    tag = "Reads",
    summary = "Get a task",
    params(
        ("id" = uuid::Uuid, Path, description = "Task UUID"),
    ),
    responses(
        (status = 200, description = "Task", body = TaskDto),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, WorkflowError> {
    let task = state.service.require_task(TaskId::from_uuid(id)).await?;
    Ok(Json(TaskDto::from(task)))
}

/// `GET /api/audit` — List audit rows, newest first.
///
/// # Errors
///
/// Returns a persistence error.
#[utoipa::path(
    get,
    path = "/api/audit",
    tag = "Reads",
    summary = "List audit log entries",
    params(AuditQuery),
    responses(
        (status = 200, description = "Audit rows", body = AuditListResponse),
    )
)]
pub async fn list_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<impl IntoResponse, WorkflowError> {
    let entries = state
        .service
        .audit(&AuditFilter {
            action: query.action,
            limit: clamp_limit(query.limit),
        })
        .await?;
    Ok(Json(AuditListResponse {
        data: entries.into_iter().map(Into::into).collect(),
    }))
}

/// `GET /api/telemetry` — Workflow counters.
///
/// # Errors
///
/// Returns a persistence error.
#[utoipa::path(
    get,
    path = "/api/telemetry",
    tag = "Reads",
    summary = "Telemetry",
    description = "Task counts by status, parallel dispatch and handoff counts, and the last loop tick.",
    responses(
        (status = 200, description = "Counters", body = TelemetryResponse),
    )
)]
pub async fn telemetry(State(state): State<AppState>) -> Result<impl IntoResponse, WorkflowError> {
    let telemetry = state.service.telemetry().await?;
    Ok(Json(TelemetryResponse::from(telemetry)))
}

/// Read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(list_messages))
        .route("/tasks", get(list_tasks))
        .route("/tasks/{id}", get(get_task))
        .route("/audit", get(list_audit))
        .route("/telemetry", get(telemetry))
}
