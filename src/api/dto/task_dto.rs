//! Task DTOs: listings, specialist runs, review and execution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{Task, TaskId};
use crate::service::ReviewDecision;

/// A task as stored, with snake_case column names.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskDto {
    /// Task identifier.
    pub id: Uuid,
    /// Owning case.
    pub case_id: String,
    /// Message the task was classified from.
    pub message_id: Option<Uuid>,
    /// `evidence_sort` or `client_update`.
    #[serde(rename = "type")]
    pub task_type: String,
    /// Lifecycle status.
    pub status: String,
    /// Specialist responsible for the task.
    pub assignee_agent: String,
    /// Classifier input (`messageId`, `rationale`, `required_fields`).
    #[schema(value_type = Object)]
    pub input: serde_json::Value,
    /// Specialist proposal, once proposed.
    #[schema(value_type = Option<Object>)]
    pub output: Option<serde_json::Value>,
    /// Classifier or specialist confidence.
    pub confidence: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id: *task.id.as_uuid(),
            case_id: task.case_id,
            message_id: task.message_id.map(|m| *m.as_uuid()),
            task_type: task.task_type.as_str().to_string(),
            status: task.status.as_str().to_string(),
            assignee_agent: task.assignee_agent.as_str().to_string(),
            input: task.input,
            output: task.output,
            confidence: task.confidence,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Response body for `GET /api/tasks`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskListResponse {
    /// Tasks, newest first.
    pub data: Vec<TaskDto>,
}

/// Query parameters for `GET /api/tasks`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TaskQuery {
    /// Only tasks with this status.
    pub status: Option<String>,
    /// Only tasks of this case.
    pub case_id: Option<String>,
    /// Maximum number of rows (default 50, max 200).
    pub limit: Option<u32>,
}

/// Response body for the specialist endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProposalResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Proposal stored on the task.
    #[schema(value_type = Object)]
    pub proposal: serde_json::Value,
}

/// Response body for `POST /api/orchestrator/run`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DispatchResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Number of pending tasks dispatched.
    pub dispatched: usize,
}

/// Response body for `POST /api/loop/tick`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoopTickResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Number of messages classified.
    pub classified: usize,
}

/// Request body for `POST /api/approve`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    /// Task under review.
    pub task_id: Uuid,
    /// `true` approves, `false` rejects.
    pub approve: bool,
    /// Reviewer name.
    #[serde(default)]
    pub reviewer: String,
    /// Optional reviewer notes.
    #[serde(default)]
    pub comments: Option<String>,
}

impl From<ApproveRequest> for ReviewDecision {
    fn from(req: ApproveRequest) -> Self {
        Self {
            task_id: TaskId::from_uuid(req.task_id),
            approve: req.approve,
            reviewer: req.reviewer,
            comments: req.comments,
        }
    }
}

/// Response body for `POST /api/approve`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApproveResponse {
    /// Always `true` once the decision is recorded.
    pub ok: bool,
    /// Task status after the decision.
    pub status: String,
    /// Execution outcome for approvals.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub execution: Option<serde_json::Value>,
}

/// Response body for `POST /api/execute`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Number of actions interpreted.
    pub actions_processed: usize,
}
