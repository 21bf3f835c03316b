//! Specialist agent handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ProposalResponse, TaskRef};
use crate::app_state::AppState;
use crate::domain::AgentKind;
use crate::error::{ErrorResponse, WorkflowError};

/// `POST /api/agents/evidence-sorter` — Propose an evidence table.
///
/// # Errors
///
/// Returns [`WorkflowError::TaskNotFound`] for an unknown task.
#[utoipa::path(
    post,
    path = "/api/agents/evidence-sorter",
    tag = "Agents",
    summary = "Run the evidence sorter",
    description = "Extracts an evidence table from the case artifacts and stores it as the task proposal.",
    request_body = TaskRef,
    responses(
        (status = 200, description = "Proposal stored", body = ProposalResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
    )
)]
pub async fn evidence_sorter(
    State(state): State<AppState>,
    Json(req): Json<TaskRef>,
) -> Result<impl IntoResponse, WorkflowError> {
    run(&state, AgentKind::EvidenceSorter, &req).await
}

/// `POST /api/agents/client-comms` — Propose a client update.
///
/// # Errors
///
/// Returns [`WorkflowError::TaskNotFound`] for an unknown task or
/// [`WorkflowError::MessageNotFound`] if its source message is gone.
#[utoipa::path(
    post,
    path = "/api/agents/client-comms",
    tag = "Agents",
    summary = "Run client comms",
    description = "Drafts a client update, quoting the latest evidence table of the case when one exists.",
    request_body = TaskRef,
    responses(
        (status = 200, description = "Proposal stored", body = ProposalResponse),
        (status = 404, description = "Task or message not found", body = ErrorResponse),
    )
)]
pub async fn client_comms(
    State(state): State<AppState>,
    Json(req): Json<TaskRef>,
) -> Result<impl IntoResponse, WorkflowError> {
    run(&state, AgentKind::ClientComms, &req).await
}

async fn run(
    state: &AppState,
    agent: AgentKind,
    req: &TaskRef,
) -> Result<Json<ProposalResponse>, WorkflowError> {
    let proposal = state.service.run_specialist(agent, req.id()).await?;
    Ok(Json(ProposalResponse { ok: true, proposal }))
}

/// Agent routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/agents/evidence-sorter", post(evidence_sorter))
        .route("/agents/client-comms", post(client_comms))
}
