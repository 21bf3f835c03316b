//! Shared DTO types used across multiple endpoints.

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::TaskId;

/// Request body naming a single task.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRef {
    /// Task identifier.
    pub task_id: Uuid,
}

impl TaskRef {
    /// The referenced task id.
    #[must_use]
    pub fn id(&self) -> TaskId {
        TaskId::from_uuid(self.task_id)
    }
}
