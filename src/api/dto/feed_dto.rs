//! Read-model DTOs: messages, audit log and telemetry.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::{AuditEntry, Message};
use crate::service::Telemetry;

/// A stored message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageDto {
    /// Message identifier.
    pub id: Uuid,
    /// Owning case.
    pub case_id: String,
    /// Where the message came from.
    pub source: String,
    /// Message body.
    pub raw_text: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: *message.id.as_uuid(),
            case_id: message.case_id,
            source: message.source,
            raw_text: message.raw_text,
            created_at: message.created_at,
        }
    }
}

/// Response body for `GET /api/messages`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageListResponse {
    /// Messages, newest first.
    pub data: Vec<MessageDto>,
}

/// Query parameters for `GET /api/messages`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct MessageQuery {
    /// Only messages of this case.
    pub case_id: Option<String>,
    /// Maximum number of rows (default 50, max 200).
    pub limit: Option<u32>,
}

/// One audit log row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditEntryDto {
    /// Monotonic row id.
    pub id: i64,
    /// `task`, `case` or `system`.
    pub subject_type: String,
    /// Task id, case id or component name.
    pub subject_id: String,
    /// What happened.
    pub action: String,
    /// Action-specific details.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// When it happened.
    pub created_at: DateTime<Utc>,
}

impl From<AuditEntry> for AuditEntryDto {
    fn from(entry: AuditEntry) -> Self {
        Self {
            id: entry.id,
            subject_type: entry.subject_type.as_str().to_string(),
            subject_id: entry.subject_id,
            action: entry.action,
            payload: entry.payload,
            created_at: entry.created_at,
        }
    }
}

/// Response body for `GET /api/audit`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuditListResponse {
    /// Audit rows, newest first.
    pub data: Vec<AuditEntryDto>,
}

/// Query parameters for `GET /api/audit`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// Only rows with this action.
    pub action: Option<String>,
    /// Maximum number of rows (default 50, max 200).
    pub limit: Option<u32>,
}

/// Response body for `GET /api/telemetry`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryResponse {
    /// Task counts keyed by status.
    pub tasks: BTreeMap<String, u64>,
    /// Orchestrator runs that dispatched tasks.
    pub parallel_dispatch: u64,
    /// Evidence summaries handed to client updates.
    pub a2a_handoff: u64,
    /// Latest loop tick that classified messages.
    pub last_loop: Option<DateTime<Utc>>,
}

impl From<Telemetry> for TelemetryResponse {
    fn from(t: Telemetry) -> Self {
        Self {
            tasks: t.tasks,
            parallel_dispatch: t.parallel_dispatch,
            a2a_handoff: t.a2a_handoff,
            last_loop: t.last_loop,
        }
    }
}
