//! Live events mirrored from the audit log.
//!
//! Every audit row the service writes is also published as a
//! [`WorkflowEvent`] through the [`super::EventBus`], tagged with the case it
//! belongs to so WebSocket clients can filter server-side.

use serde::Serialize;

use super::AuditEntry;

/// An audit row plus the case it concerns.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowEvent {
    /// Case the row concerns. `None` for system-level rows such as loop ticks.
    pub case_id: Option<String>,
    /// The persisted audit row.
    pub entry: AuditEntry,
}

impl WorkflowEvent {
    /// Returns the audit action name (e.g. `"dispatched"`).
    #[must_use]
    pub fn action(&self) -> &str {
        &self.entry.action
    }
}
