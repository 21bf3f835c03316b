//! PostgreSQL implementation of the persistence layer.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{
    AUDIT_COLUMNS, ApprovalRow, ArtifactRow, AuditRow, MESSAGE_COLUMNS, MessageRow, TASK_COLUMNS,
    TaskRow, approval_from_row, artifact_from_row, audit_from_row, message_from_row,
    task_from_row,
};
use super::{AuditFilter, MessageFilter, TaskFilter, WorkflowStore};
use crate::domain::{
    Approval, Artifact, AuditEntry, Message, MessageId, NewApproval, NewArtifact, NewAuditEntry,
    NewMessage, NewTask, Task, TaskId, TaskStatus, TaskType,
};
use crate::error::WorkflowError;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), WorkflowError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| WorkflowError::PersistenceError(e.to_string()))
    }
}

#[async_trait]
impl WorkflowStore for PostgresStore {
    async fn insert_message(&self, message: NewMessage) -> Result<Message, WorkflowError> {
        let sql = format!(
            "INSERT INTO messages (id, case_id, source, raw_text) VALUES ($1, $2, $3, $4) \
             RETURNING {MESSAGE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(&message.case_id)
            .bind(&message.source)
            .bind(&message.raw_text)
            .fetch_one(&self.pool)
            .await?;
        Ok(message_from_row(row))
    }

    async fn get_message(&self, id: MessageId) -> Result<Option<Message>, WorkflowError> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1");
        let row = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(message_from_row))
    }

    async fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, WorkflowError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages \
             WHERE ($1::text IS NULL OR case_id = $1) \
               AND ($2::timestamptz IS NULL OR created_at >= $2) \
             ORDER BY created_at DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(filter.case_id.as_deref())
            .bind(filter.since)
            .bind(i64::from(filter.limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }

    async fn insert_artifact(&self, artifact: NewArtifact) -> Result<Artifact, WorkflowError> {
        let row = sqlx::query_as::<_, ArtifactRow>(
            "INSERT INTO artifacts (id, case_id, filename, ocr_text) VALUES ($1, $2, $3, $4) \
             RETURNING id, case_id, filename, ocr_text, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&artifact.case_id)
        .bind(artifact.filename.as_deref())
        .bind(artifact.ocr_text.as_deref())
        .fetch_one(&self.pool)
        .await?;
        Ok(artifact_from_row(row))
    }

    async fn artifacts_for_case(&self, case_id: &str) -> Result<Vec<Artifact>, WorkflowError> {
        let rows = sqlx::query_as::<_, ArtifactRow>(
            "SELECT id, case_id, filename, ocr_text, created_at FROM artifacts \
             WHERE case_id = $1 ORDER BY created_at ASC",
        )
        .bind(case_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(artifact_from_row).collect())
    }

    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> Result<Vec<Task>, WorkflowError> {
        let sql = format!(
            "INSERT INTO tasks (id, case_id, message_id, type, status, assignee_agent, input, confidence) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {TASK_COLUMNS}"
        );
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(tasks.len());
        for task in tasks {
            let row = sqlx::query_as::<_, TaskRow>(&sql)
                .bind(Uuid::new_v4())
                .bind(&task.case_id)
                .bind(task.message_id.map(Uuid::from))
                .bind(task.task_type.as_str())
                .bind(task.status.as_str())
                .bind(task.assignee_agent.as_str())
                .bind(&task.input)
                .bind(task.confidence)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(task_from_row(row)?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn get_task(&self, id: TaskId) -> Result<Option<Task>, WorkflowError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await?
            .map(task_from_row)
            .transpose()
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, WorkflowError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::text IS NULL OR case_id = $2) \
             ORDER BY created_at DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.case_id.as_deref())
            .bind(i64::from(filter.limit))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(task_from_row).collect()
    }

    async fn pending_tasks(&self, limit: u32) -> Result<Vec<Task>, WorkflowError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE status = $1 ORDER BY created_at ASC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(TaskStatus::Pending.as_str())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(task_from_row).collect()
    }

    async fn latest_case_task(
        &self,
        case_id: &str,
        task_type: TaskType,
        statuses: &[TaskStatus],
    ) -> Result<Option<Task>, WorkflowError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE case_id = $1 AND type = $2 AND status = ANY($3) \
             ORDER BY updated_at DESC LIMIT 1"
        );
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        sqlx::query_as::<_, TaskRow>(&sql)
            .bind(case_id)
            .bind(task_type.as_str())
            .bind(statuses)
            .fetch_optional(&self.pool)
            .await?
            .map(task_from_row)
            .transpose()
    }

    async fn untasked_messages_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<Message>, WorkflowError> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages m \
             WHERE m.created_at >= $1 \
               AND NOT EXISTS ( \
                 SELECT 1 FROM tasks t WHERE t.case_id = m.case_id AND t.message_id = m.id \
               ) \
             ORDER BY m.created_at DESC"
        );
        let rows = sqlx::query_as::<_, MessageRow>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(message_from_row).collect())
    }

    async fn set_task_proposal(
        &self,
        id: TaskId,
        proposal: &serde_json::Value,
    ) -> Result<(), WorkflowError> {
        sqlx::query("UPDATE tasks SET output = $2, status = $3, updated_at = now() WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(proposal)
            .bind(TaskStatus::Proposed.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<(), WorkflowError> {
        sqlx::query("UPDATE tasks SET status = $2, updated_at = now() WHERE id = $1")
            .bind(Uuid::from(id))
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_approval(&self, approval: NewApproval) -> Result<Approval, WorkflowError> {
        let row = sqlx::query_as::<_, ApprovalRow>(
            "INSERT INTO approvals (id, task_id, status, reviewer, comments) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, task_id, status, reviewer, comments, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(Uuid::from(approval.task_id))
        .bind(approval.status.as_str())
        .bind(&approval.reviewer)
        .bind(approval.comments.as_deref())
        .fetch_one(&self.pool)
        .await?;
        approval_from_row(row)
    }

    async fn insert_audit(
        &self,
        entries: Vec<NewAuditEntry>,
    ) -> Result<Vec<AuditEntry>, WorkflowError> {
        let sql = format!(
            "INSERT INTO audit_logs (subject_type, subject_id, action, payload) \
             VALUES ($1, $2, $3, $4) RETURNING {AUDIT_COLUMNS}"
        );
        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            let row = sqlx::query_as::<_, AuditRow>(&sql)
                .bind(entry.subject_type.as_str())
                .bind(&entry.subject_id)
                .bind(&entry.action)
                .bind(&entry.payload)
                .fetch_one(&mut *tx)
                .await?;
            stored.push(audit_from_row(row)?);
        }
        tx.commit().await?;
        Ok(stored)
    }

    async fn list_audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, WorkflowError> {
        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_logs \
             WHERE ($1::text IS NULL OR action = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, AuditRow>(&sql)
            .bind(filter.action.as_deref())
            .bind(i64::from(filter.limit))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(audit_from_row).collect()
    }

    async fn task_status_counts(&self) -> Result<BTreeMap<String, u64>, WorkflowError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM tasks GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| (status, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    async fn count_audit_action(&self, action: &str) -> Result<u64, WorkflowError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs WHERE action = $1")
                .bind(action)
                .fetch_one(&self.pool)
                .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn latest_audit_at(
        &self,
        action: &str,
    ) -> Result<Option<DateTime<Utc>>, WorkflowError> {
        let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(created_at) FROM audit_logs WHERE action = $1",
        )
        .bind(action)
        .fetch_one(&self.pool)
        .await?;
        Ok(latest)
    }
}
