//! Plain persisted rows: messages, artifacts, approvals and audit entries.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MessageId, TaskId, TaskStatus};

/// An ingested client message.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Row identifier.
    pub id: MessageId,
    /// Case the message belongs to.
    pub case_id: String,
    /// Where the message came from (e.g. `"upload"`).
    pub source: String,
    /// Message body.
    pub raw_text: String,
    /// Ingestion timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a message row.
#[derive(Debug, Clone)]
pub struct NewMessage {
    /// Case the message belongs to.
    pub case_id: String,
    /// Where the message came from.
    pub source: String,
    /// Message body.
    pub raw_text: String,
}

/// A document attached to a case, with any text already extracted from it.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Case the artifact belongs to.
    pub case_id: String,
    /// Original file name.
    pub filename: Option<String>,
    /// Extracted text, if any.
    pub ocr_text: Option<String>,
    /// Upload timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an artifact row.
#[derive(Debug, Clone, Default)]
pub struct NewArtifact {
    /// Case the artifact belongs to.
    pub case_id: String,
    /// Original file name.
    pub filename: Option<String>,
    /// Extracted text, if any.
    pub ocr_text: Option<String>,
}

/// A reviewer decision on a task.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    /// Row identifier.
    pub id: uuid::Uuid,
    /// Task the decision applies to.
    pub task_id: TaskId,
    /// `approved` or `rejected`.
    pub status: TaskStatus,
    /// Who decided.
    pub reviewer: String,
    /// Optional reviewer notes.
    pub comments: Option<String>,
    /// Decision timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an approval row.
#[derive(Debug, Clone)]
pub struct NewApproval {
    /// Task the decision applies to.
    pub task_id: TaskId,
    /// `approved` or `rejected`.
    pub status: TaskStatus,
    /// Who decided.
    pub reviewer: String,
    /// Optional reviewer notes.
    pub comments: Option<String>,
}

/// What an audit row is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectType {
    /// `subject_id` is a task id.
    Task,
    /// `subject_id` is a case id.
    Case,
    /// `subject_id` names a system component (e.g. `"loop"`).
    System,
}

impl SubjectType {
    /// Wire/database string for this subject type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Case => "case",
            Self::System => "system",
        }
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task" => Ok(Self::Task),
            "case" => Ok(Self::Case),
            "system" => Ok(Self::System),
            other => Err(format!("unknown subject type: {other}")),
        }
    }
}

/// A persisted audit log row.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Auto-increment row ID.
    pub id: i64,
    /// What the row is about.
    pub subject_type: SubjectType,
    /// Identifier of the subject.
    pub subject_id: String,
    /// Action discriminator (e.g. `"draft_message_sent"`).
    pub action: String,
    /// Action-specific payload.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    /// What the row is about.
    pub subject_type: SubjectType,
    /// Identifier of the subject.
    pub subject_id: String,
    /// Action discriminator.
    pub action: String,
    /// Action-specific payload.
    pub payload: serde_json::Value,
}

impl NewAuditEntry {
    /// Audit row about a task.
    #[must_use]
    pub fn task(task_id: TaskId, action: &str, payload: serde_json::Value) -> Self {
        Self {
            subject_type: SubjectType::Task,
            subject_id: task_id.to_string(),
            action: action.to_string(),
            payload,
        }
    }

    /// Audit row about a case.
    #[must_use]
    pub fn case(case_id: &str, action: &str, payload: serde_json::Value) -> Self {
        Self {
            subject_type: SubjectType::Case,
            subject_id: case_id.to_string(),
            action: action.to_string(),
            payload,
        }
    }

    /// Audit row about a system component.
    #[must_use]
    pub fn system(component: &str, action: &str, payload: serde_json::Value) -> Self {
        Self {
            subject_type: SubjectType::System,
            subject_id: component.to_string(),
            action: action.to_string(),
            payload,
        }
    }
}
