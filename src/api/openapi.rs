//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{agents, intake, orchestrator, reads, review, system};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "legalops-router",
        description = "Human-in-the-loop routing of legal-operations intake into reviewed, executed tasks."
    ),
    paths(
        intake::ingest,
        intake::classify,
        agents::evidence_sorter,
        agents::client_comms,
        orchestrator::run,
        orchestrator::loop_tick,
        review::approve,
        review::execute,
        reads::list_messages,
        reads::list_tasks,
        reads::get_task,
        reads::list_audit,
        reads::telemetry,
        system::health_handler,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        dto::TaskRef,
        dto::IngestRequest,
        dto::AttachmentDto,
        dto::IngestResponse,
        dto::ClassifyRequest,
        dto::ClassifyResponse,
        dto::TaskDto,
        dto::TaskListResponse,
        dto::ProposalResponse,
        dto::DispatchResponse,
        dto::LoopTickResponse,
        dto::ApproveRequest,
        dto::ApproveResponse,
        dto::ExecuteResponse,
        dto::MessageDto,
        dto::MessageListResponse,
        dto::AuditEntryDto,
        dto::AuditListResponse,
        dto::TelemetryResponse,
        system::HealthResponse,
    )),
    tags(
        (name = "Intake", description = "Message ingest and classification"),
        (name = "Agents", description = "Specialist proposals"),
        (name = "Orchestrator", description = "Parallel dispatch and the classification loop"),
        (name = "Review", description = "Human approval and execution"),
        (name = "Reads", description = "Inbox, tasks, audit log and telemetry"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;
