//! Raw database rows and their conversion into domain types.
//!
//! Queries fetch plain tuples; the `*_from_row` helpers parse the string
//! columns (`type`, `status`, `subject_type`, ...) into their enums.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    AgentKind, Approval, Artifact, AuditEntry, Message, MessageId, SubjectType, Task, TaskId,
    TaskStatus, TaskType,
};
use crate::error::WorkflowError;

/// Column list matching [`TaskRow`].
pub const TASK_COLUMNS: &str = "id, case_id, message_id, type, status, assignee_agent, input, \
                                output, confidence, created_at, updated_at";

/// Column list matching [`MessageRow`].
pub const MESSAGE_COLUMNS: &str = "id, case_id, source, raw_text, created_at";

/// Column list matching [`AuditRow`].
pub const AUDIT_COLUMNS: &str = "id, subject_type, subject_id, action, payload, created_at";

/// `messages` row.
pub type MessageRow = (Uuid, String, String, String, DateTime<Utc>);

/// `artifacts` row.
pub type ArtifactRow = (Uuid, String, Option<String>, Option<String>, DateTime<Utc>);

/// `tasks` row.
pub type TaskRow = (
    Uuid,
    String,
    Option<Uuid>,
    String,
    String,
    String,
    serde_json::Value,
    Option<serde_json::Value>,
    Option<f64>,
    DateTime<Utc>,
    DateTime<Utc>,
);

/// `approvals` row.
pub type ApprovalRow = (Uuid, Uuid, String, String, Option<String>, DateTime<Utc>);

/// `audit_logs` row.
pub type AuditRow = (i64, String, String, String, serde_json::Value, DateTime<Utc>);

fn parse_column<T: FromStr<Err = String>>(value: &str) -> Result<T, WorkflowError> {
    value.parse().map_err(WorkflowError::PersistenceError)
}

/// Converts a `messages` row.
#[must_use]
pub fn message_from_row(row: MessageRow) -> Message {
    let (id, case_id, source, raw_text, created_at) = row;
    Message {
        id: MessageId::from_uuid(id),
        case_id,
        source,
        raw_text,
        created_at,
    }
}

/// Converts an `artifacts` row.
#[must_use]
pub fn artifact_from_row(row: ArtifactRow) -> Artifact {
    let (id, case_id, filename, ocr_text, created_at) = row;
    Artifact {
        id,
        case_id,
        filename,
        ocr_text,
        created_at,
    }
}

/// Converts a `tasks` row.
///
/// # Errors
///
/// Returns [`WorkflowError::PersistenceError`] if `type` or `status` holds
/// an unknown value.
pub fn task_from_row(row: TaskRow) -> Result<Task, WorkflowError> {
    let (
        id,
        case_id,
        message_id,
        task_type,
        status,
        assignee_agent,
        input,
        output,
        confidence,
        created_at,
        updated_at,
    ) = row;
    Ok(Task {
        id: TaskId::from_uuid(id),
        case_id,
        message_id: message_id.map(MessageId::from_uuid),
        task_type: parse_column::<TaskType>(&task_type)?,
        status: parse_column::<TaskStatus>(&status)?,
        assignee_agent: parse_column::<AgentKind>(&assignee_agent)?,
        input,
        output,
        confidence,
        created_at,
        updated_at,
    })
}

/// Converts an `approvals` row.
///
/// # Errors
///
/// Returns [`WorkflowError::PersistenceError`] on an unknown status.
pub fn approval_from_row(row: ApprovalRow) -> Result<Approval, WorkflowError> {
    let (id, task_id, status, reviewer, comments, created_at) = row;
    Ok(Approval {
        id,
        task_id: TaskId::from_uuid(task_id),
        status: parse_column::<TaskStatus>(&status)?,
        reviewer,
        comments,
        created_at,
    })
}

/// Converts an `audit_logs` row.
///
/// # Errors
///
/// Returns [`WorkflowError::PersistenceError`] on an unknown subject type.
pub fn audit_from_row(row: AuditRow) -> Result<AuditEntry, WorkflowError> {
    let (id, subject_type, subject_id, action, payload, created_at) = row;
    Ok(AuditEntry {
        id,
        subject_type: parse_column::<SubjectType>(&subject_type)?,
        subject_id,
        action,
        payload,
        created_at,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn task_row(task_type: &str, status: &str) -> TaskRow {
        (
            Uuid::new_v4(),
            "case-1".to_string(),
            None,
            task_type.to_string(),
            status.to_string(),
            "evidence_sorter".to_string(),
            serde_json::json!({}),
            None,
            Some(0.5),
            Utc::now(),
            Utc::now(),
        )
    }

    #[test]
    fn task_row_converts() {
        let Ok(task) = task_from_row(task_row("evidence_sort", "proposed")) else {
            panic!("row should convert");
        };
        assert_eq!(task.task_type, TaskType::EvidenceSort);
        assert_eq!(task.status, TaskStatus::Proposed);
        assert_eq!(task.assignee_agent, AgentKind::EvidenceSorter);
    }

    #[test]
    fn unknown_status_is_a_persistence_error() {
        let result = task_from_row(task_row("evidence_sort", "archived"));
        assert!(matches!(result, Err(WorkflowError::PersistenceError(_))));
    }

    #[test]
    fn audit_row_converts() {
        let row: AuditRow = (
            7,
            "system".to_string(),
            "loop".to_string(),
            "loop_tick".to_string(),
            serde_json::json!({ "classifiedMessageIds": [] }),
            Utc::now(),
        );
        let Ok(entry) = audit_from_row(row) else {
            panic!("row should convert");
        };
        assert_eq!(entry.subject_type, SubjectType::System);
        assert_eq!(entry.id, 7);
    }
}
