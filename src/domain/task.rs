//! Tasks: one unit of proposed work routed to a specialist agent.
//!
//! The status vocabulary is `pending → proposed → approved | rejected →
//! executed`. Transitions are plain column writes; nothing here refuses an
//! out-of-order transition.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MessageId, TaskId};

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Sort bills, receipts and records into an evidence table.
    EvidenceSort,
    /// Draft a status update for the client.
    ClientUpdate,
}

impl TaskType {
    /// Wire/database string for this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EvidenceSort => "evidence_sort",
            Self::ClientUpdate => "client_update",
        }
    }

    /// Specialist agent responsible for this task type.
    #[must_use]
    pub const fn assignee(&self) -> AgentKind {
        match self {
            Self::EvidenceSort => AgentKind::EvidenceSorter,
            Self::ClientUpdate => AgentKind::ClientComms,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evidence_sort" => Ok(Self::EvidenceSort),
            "client_update" => Ok(Self::ClientUpdate),
            other => Err(format!("unknown task type: {other}")),
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created by classification, waiting for a specialist.
    Pending,
    /// A specialist attached a proposal; waiting for a human.
    Proposed,
    /// A reviewer approved the proposal.
    Approved,
    /// A reviewer rejected the proposal.
    Rejected,
    /// Approved actions were executed.
    Executed,
}

impl TaskStatus {
    /// Wire/database string for this status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Proposed => "proposed",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Executed => "executed",
        }
    }

    /// Status written for a reviewer decision.
    #[must_use]
    pub const fn from_decision(approve: bool) -> Self {
        if approve {
            Self::Approved
        } else {
            Self::Rejected
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "proposed" => Ok(Self::Proposed),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "executed" => Ok(Self::Executed),
            other => Err(format!("unknown task status: {other}")),
        }
    }
}

/// Specialist agent that turns a pending task into a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Extracts evidence tables from artifact OCR text.
    EvidenceSorter,
    /// Drafts client-facing messages.
    ClientComms,
}

impl AgentKind {
    /// Wire/database string for this agent.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EvidenceSorter => "evidence_sorter",
            Self::ClientComms => "client_comms",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    /// Anything other than `evidence_sorter` routes to client comms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s == "evidence_sorter" {
            Self::EvidenceSorter
        } else {
            Self::ClientComms
        })
    }
}

/// A persisted task row.
#[derive(Debug, Clone, Serialize)]
pub struct Task {
    /// Row identifier.
    pub id: TaskId,
    /// Case the task belongs to.
    pub case_id: String,
    /// Message the task was classified from, if any.
    pub message_id: Option<MessageId>,
    /// Kind of work.
    pub task_type: TaskType,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Agent the task is routed to.
    pub assignee_agent: AgentKind,
    /// Classifier context (`messageId`, `rationale`, `required_fields`).
    pub input: serde_json::Value,
    /// Specialist proposal, once one exists.
    pub output: Option<serde_json::Value>,
    /// Classifier confidence in `[0, 1]`.
    pub confidence: Option<f64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a task row.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Case the task belongs to.
    pub case_id: String,
    /// Source message.
    pub message_id: Option<MessageId>,
    /// Kind of work.
    pub task_type: TaskType,
    /// Initial status.
    pub status: TaskStatus,
    /// Agent the task is routed to.
    pub assignee_agent: AgentKind,
    /// Classifier context.
    pub input: serde_json::Value,
    /// Classifier confidence.
    pub confidence: Option<f64>,
}

impl NewTask {
    /// Builds a `pending` task from a classifier candidate.
    #[must_use]
    pub fn from_candidate(case_id: &str, message_id: MessageId, candidate: &TaskCandidate) -> Self {
        Self {
            case_id: case_id.to_string(),
            message_id: Some(message_id),
            task_type: candidate.task_type,
            status: TaskStatus::Pending,
            assignee_agent: candidate.task_type.assignee(),
            input: serde_json::json!({
                "messageId": message_id,
                "rationale": candidate.rationale,
                "required_fields": candidate.required_fields,
            }),
            confidence: candidate.confidence,
        }
    }
}

/// One task proposed by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCandidate {
    /// Proposed task type.
    #[serde(rename = "type")]
    pub task_type: TaskType,
    /// Why the classifier proposed it.
    #[serde(default)]
    pub rationale: String,
    /// Fields the specialist will need.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Classifier confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: Option<f64>,
}
