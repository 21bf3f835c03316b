//! Persistence layer: the workflow tables behind one trait.
//!
//! [`WorkflowStore`] covers every read and write the workflow performs.
//! [`PostgresStore`] is the durable implementation over `sqlx::PgPool`;
//! [`MemoryStore`] keeps the same tables in process for tests and for
//! running without a database.

pub mod memory;
pub mod models;
pub mod postgres;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::domain::{
    Approval, Artifact, AuditEntry, Message, MessageId, NewApproval, NewArtifact, NewAuditEntry,
    NewMessage, NewTask, Task, TaskId, TaskStatus, TaskType,
};
use crate::error::WorkflowError;

/// Default row limit for list queries.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Hard cap for list queries.
pub const MAX_LIST_LIMIT: u32 = 200;

/// Clamps a requested list limit into `1..=MAX_LIST_LIMIT`.
#[must_use]
pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// Filter for message listings (newest first).
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    /// Only messages of this case.
    pub case_id: Option<String>,
    /// Only messages created at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    pub limit: u32,
}

/// Filter for task listings (newest first).
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Only tasks of this case.
    pub case_id: Option<String>,
    /// Maximum rows returned.
    pub limit: u32,
}

/// Filter for audit log listings (newest first).
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Only rows with this action.
    pub action: Option<String>,
    /// Maximum rows returned.
    pub limit: u32,
}

/// Storage operations used by the workflow.
///
/// Status changes are unconditional writes; implementations do not check
/// the previous status.
#[async_trait]
pub trait WorkflowStore: Send + Sync + fmt::Debug {
    /// Inserts a message and returns the stored row.
    async fn insert_message(&self, message: NewMessage) -> Result<Message, WorkflowError>;

    /// Fetches a message by id.
    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, WorkflowError>;

    /// Lists messages, newest first.
    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, WorkflowError>;

    /// Inserts an artifact and returns the stored row.
    async fn insert_artifact(&self, artifact: NewArtifact) -> Result<Artifact, WorkflowError>;

    /// All artifacts of a case, oldest first.
    async fn artifacts_for_case(&self, case_id: &str) -> Result<Vec<Artifact>, WorkflowError>;

    /// Inserts tasks and returns the stored rows in input order.
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>, WorkflowError>;

    /// Fetches a task by id.
    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, WorkflowError>;

    /// Lists tasks, newest first.
    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, WorkflowError>;

    /// Up to `limit` pending tasks, oldest first.
    async fn pending_tasks(&self, limit: u32) -> Result<Vec<Task>, WorkflowError>;

    /// Most recently updated task of a case with the given type and one of
    /// the given statuses.
    async fn latest_case_task(
        &self,
        case_id: &str,
        task_type: TaskType,
        statuses: &[TaskStatus],
    ) -> Result<Option<Task>, WorkflowError>;

    /// Every message created at or after `since` that has no task under
    /// its own case yet, newest first. Not capped by a list limit.
    async fn untasked_messages_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, WorkflowError>;

    /// Stores a proposal as the task output and marks the task `proposed`.
    async fn set_task_proposal(
        &self,
        id: TaskId,
        proposal: &serde_json::Value,
    ) -> Result<(), WorkflowError>;

    /// Overwrites the task status.
    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<(), WorkflowError>;

    /// Records a reviewer decision.
    async fn insert_approval(&self, approval: NewApproval) -> Result<Approval, WorkflowError>;

    /// Appends audit rows and returns them with ids and timestamps.
    async fn insert_audit(
        &self,
        entries: Vec<NewAuditEntry>,
    ) -> Result<Vec<AuditEntry>, WorkflowError>;

    /// Lists audit rows, newest first.
    async fn list_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, WorkflowError>;

    /// Number of tasks per status string.
    async fn task_status_counts(&self) -> Result<BTreeMap<String, u64>, WorkflowError>;

    /// Number of audit rows with the given action.
    async fn count_audit_action(&self, action: &str) -> Result<u64, WorkflowError>;

    /// Timestamp of the newest audit row with the given action.
    async fn latest_audit_at(&self, action: &str)
    -> Result<Option<DateTime<Utc>>, WorkflowError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_limit_applies_default_and_bounds() {
        assert_eq!(clamp_limit(None), DEFAULT_LIST_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(10_000)), MAX_LIST_LIMIT);
        assert_eq!(clamp_limit(Some(7)), 7);
    }
}
