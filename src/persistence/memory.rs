//! In-process store holding the workflow tables behind one lock.
//!
//! Rows live in insertion-ordered vectors, so "newest first" is reverse
//! iteration and ties on timestamps resolve to the later insert.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{AuditFilter, MessageFilter, TaskFilter, WorkflowStore};
use crate::domain::{
    Approval, Artifact, AuditEntry, Message, MessageId, NewApproval, NewArtifact, NewAuditEntry,
    NewMessage, NewTask, Task, TaskId, TaskStatus, TaskType,
};
use crate::error::WorkflowError;

#[derive(Debug, Default)]
struct Tables {
    messages: Vec<Message>,
    artifacts: Vec<Artifact>,
    tasks: Vec<Task>,
    approvals: Vec<Approval>,
    audit: Vec<AuditEntry>,
    next_audit_id: i64,
}

impl Tables {
    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task, WorkflowError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(WorkflowError::TaskNotFound(*id.as_uuid()))
    }
}

/// Volatile [`WorkflowStore`] used by tests and database-less runs.
///
/// # Concurrency
///
/// A single `RwLock` guards all tables; reads run concurrently and every
/// write is serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn take<T: Clone>(rows: impl Iterator<Item = T>, limit: u32) -> Vec<T> {
    rows.take(usize::try_from(limit).unwrap_or(usize::MAX))
        .collect()
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn insert_message(&self, message: NewMessage) -> Result<Message, WorkflowError> {
        let row = Message {
            id: MessageId::new(),
            case_id: message.case_id,
            source: message.source,
            raw_text: message.raw_text,
            created_at: Utc::now(),
        };
        self.tables.write().await.messages.push(row.clone());
        Ok(row)
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables.messages.iter().find(|m| m.id == id).cloned())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, WorkflowError> {
        let tables = self.tables.read().await;
        let rows = tables
            .messages
            .iter()
            .rev()
            .filter(|m| filter.case_id.as_ref().is_none_or(|c| &m.case_id == c))
            .filter(|m| filter.since.is_none_or(|s| m.created_at >= s))
            .cloned();
        Ok(take(rows, filter.limit))
    }

    async fn insert_artifact(&self, artifact: NewArtifact) -> Result<Artifact, WorkflowError> {
        let row = Artifact {
            id: uuid::Uuid::new_v4(),
            case_id: artifact.case_id,
            filename: artifact.filename,
            ocr_text: artifact.ocr_text,
            created_at: Utc::now(),
        };
        self.tables.write().await.artifacts.push(row.clone());
        Ok(row)
    }

    async fn artifacts_for_case(&self, case_id: &str) -> Result<Vec<Artifact>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .artifacts
            .iter()
            .filter(|a| a.case_id == case_id)
            .cloned()
            .collect())
    }

    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>, WorkflowError> {
        let now = Utc::now();
        let rows: Vec<Task> = tasks
            .into_iter()
            .map(|t| Task {
                id: TaskId::new(),
                case_id: t.case_id,
                message_id: t.message_id,
                task_type: t.task_type,
                status: t.status,
                assignee_agent: t.assignee_agent,
                input: t.input,
                output: None,
                confidence: t.confidence,
                created_at: now,
                updated_at: now,
            })
            .collect();
        self.tables.write().await.tasks.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, WorkflowError> {
        let tables = self.tables.read().await;
        let rows = tables
            .tasks
            .iter()
            .rev()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.case_id.as_ref().is_none_or(|c| &t.case_id == c))
            .cloned();
        Ok(take(rows, filter.limit))
    }

    async fn pending_tasks(&self, limit: u32) -> Result<Vec<Task>, WorkflowError> {
        let tables = self.tables.read().await;
        let rows = tables
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned();
        Ok(take(rows, limit))
    }

    async fn latest_case_task(
        &self,
        case_id: &str,
        task_type: TaskType,
        statuses: &[TaskStatus],
    ) -> Result<Option<Task>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| {
                t.case_id == case_id && t.task_type == task_type && statuses.contains(&t.status)
            })
            .max_by_key(|t| t.updated_at)
            .cloned())
    }

    async fn untasked_messages_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .messages
            .iter()
            .rev()
            .filter(|m| m.created_at >= since)
            .filter(|m| {
                !tables
                    .tasks
                    .iter()
                    .any(|t| t.case_id == m.case_id && t.message_id == Some(m.id))
            })
            .cloned()
            .collect())
    }

    async fn set_task_proposal(
        &self,
        id: TaskId,
        proposal: &serde_json::Value,
    ) -> Result<(), WorkflowError> {
        let mut tables = self.tables.write().await;
        let task = tables.task_mut(id)?;
        task.output = Some(proposal.clone());
        task.status = TaskStatus::Proposed;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<(), WorkflowError> {
        let mut tables = self.tables.write().await;
        let task = tables.task_mut(id)?;
        task.status = status;
        task.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_approval(&self, approval: NewApproval) -> Result<Approval, WorkflowError> {
        let row = Approval {
            id: uuid::Uuid::new_v4(),
            task_id: approval.task_id,
            status: approval.status,
            reviewer: approval.reviewer,
            comments: approval.comments,
            created_at: Utc::now(),
        };
        self.tables.write().await.approvals.push(row.clone());
        Ok(row)
    }

    async fn insert_audit(
        &self,
        entries: Vec<NewAuditEntry>,
    ) -> Result<Vec<AuditEntry>, WorkflowError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            tables.next_audit_id = tables.next_audit_id.saturating_add(1);
            let row = AuditEntry {
                id: tables.next_audit_id,
                subject_type: entry.subject_type,
                subject_id: entry.subject_id,
                action: entry.action,
                payload: entry.payload,
                created_at: now,
            };
            tables.audit.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }

    async fn list_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, WorkflowError> {
        let tables = self.tables.read().await;
        let rows = tables
            .audit
            .iter()
            .rev()
            .filter(|e| filter.action.as_ref().is_none_or(|a| &e.action == a))
            .cloned();
        Ok(take(rows, filter.limit))
    }

    async fn task_status_counts(&self) -> Result<BTreeMap<String, u64>, WorkflowError> {
        let tables = self.tables.read().await;
        let mut counts = BTreeMap::new();
        for task in &tables.tasks {
            let count = counts.entry(task.status.as_str().to_string()).or_insert(0u64);
            *count = count.saturating_add(1);
        }
        Ok(counts)
    }

    async fn count_audit_action(&self, action: &str) -> Result<u64, WorkflowError> {
        let tables = self.tables.read().await;
        let count = tables.audit.iter().filter(|e| e.action == action).count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn latest_audit_at(
        &self,
        action: &str,
    ) -> Result<Option<DateTime<Utc>>, WorkflowError> {
        let tables = self.tables.read().await;
        Ok(tables
            .audit
            .iter()
            .filter(|e| e.action == action)
            .map(|e| e.created_at)
            .max())
    }
}
