//! Human review handlers: approve/reject and execute.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ApproveRequest, ApproveResponse, ExecuteResponse, TaskRef};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /api/approve` — Record a reviewer decision.
///
/// Approved tasks are executed immediately; the execution outcome is
/// returned and written to the audit log.
///
/// # Errors
///
/// Returns [`WorkflowError::TaskNotFound`] for an unknown task.
#[utoipa::path(
    post,
    path = "/api/approve",
    tag = "Review",
    summary = "Approve or reject a task",
    description = "Stores the decision, updates the task status and executes approved proposals.",
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Decision recorded", body = ApproveResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn approve(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> Result<impl IntoResponse, WorkflowError> {
    let outcome = state.service.decide(req.into()).await?;
    Ok(Json(ApproveResponse {
        ok: true,
        status: outcome.status.as_str().to_string(),
        execution: outcome.execution,
    }))
}

/// `POST /api/execute` — Execute the actions of a task's proposal.
///
/// # Errors
///
/// Returns [`WorkflowError::TaskNotFound`] for an unknown task.
#[utoipa::path(
    post,
    path = "/api/execute",
    tag = "Review",
    summary = "Execute a task",
    description = "Writes one audit row per proposed action and marks the task executed.",
    request_body = TaskRef,
    responses(
        (status = 200, description = "Actions executed", body = ExecuteResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn execute(
    State(state): State<AppState>,
    Json(req): Json<TaskRef>,
) -> Result<impl IntoResponse, WorkflowError> {
    let report = state.service.execute(req.id()).await?;
    Ok(Json(ExecuteResponse {
        ok: true,
        actions_processed: report.actions_processed,
    }))
}

/// Review routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approve", post(approve))
        .route("/execute", post(execute))
}
