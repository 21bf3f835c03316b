//! Orchestrator and loop handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{DispatchResponse, LoopTickResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /api/orchestrator/run` — Dispatch pending tasks concurrently.
///
/// # Errors
///
/// Returns a persistence error if pending tasks cannot be loaded.
#[utoipa::path(
    post,
    path = "/api/orchestrator/run",
    tag = "Orchestrator",
    summary = "Dispatch pending tasks",
    description = "Runs the specialist of each pending task (up to the batch size) in parallel.",
    responses(
        (status = 200, description = "Dispatch finished", body = DispatchResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn run(State(state): State<AppState>) -> Result<impl IntoResponse, WorkflowError> {
    let dispatched = state.service.dispatch_pending().await?;
    Ok(Json(DispatchResponse {
        ok: true,
        dispatched,
    }))
}

/// `POST /api/loop/tick` — Classify recent unprocessed messages.
///
/// # Errors
///
/// Returns a persistence error if recent messages cannot be loaded.
#[utoipa::path(
    post,
    path = "/api/loop/tick",
    tag = "Orchestrator",
    summary = "Run one loop tick",
    description = "Classifies messages from the lookback window that have no tasks yet.",
    responses(
        (status = 200, description = "Tick finished", body = LoopTickResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse),
    )
)]
pub async fn loop_tick(State(state): State<AppState>) -> Result<impl IntoResponse, WorkflowError> {
    let classified = state.service.loop_tick().await?;
    Ok(Json(LoopTickResponse {
        ok: true,
        classified: classified.len(),
    }))
}

/// Orchestrator routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orchestrator/run", post(run))
        .route("/loop/tick", post(loop_tick))
}
