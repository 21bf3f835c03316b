//! Simulated execution of approved actions.
//!
//! Nothing leaves the service: each action becomes exactly one audit row
//! describing what would have happened.

use super::{Action, ActionKind, NewAuditEntry, TaskId};

/// Maximum number of body characters copied into a `draft_message_sent` row.
pub const PREVIEW_CHARS: usize = 160;

/// Portal page the simulated form filler points at.
pub const MOCK_PORTAL_URL: &str = "/mock-portal";

/// Audit action names written during execution.
pub mod audit_actions {
    /// A drafted message was "sent".
    pub const DRAFT_MESSAGE_SENT: &str = "draft_message_sent";
    /// An evidence table was "saved".
    pub const EVIDENCE_TABLE_SAVED: &str = "evidence_table_saved";
    /// A simulated UI automation step.
    pub const COMPUTER_USE_STEP: &str = "computer_use_step";
    /// The action kind was not recognised.
    pub const EXECUTION_SKIPPED: &str = "execution_skipped";
}

/// Returns the audit row recording the simulated execution of `action`.
#[must_use]
pub fn audit_for_action(task_id: TaskId, action: &Action) -> NewAuditEntry {
    let data = &action.data;
    match &action.kind {
        ActionKind::DraftMessage => {
            let preview: String = data
                .get("body")
                .and_then(|v| v.as_str())
                .map(|body| body.chars().take(PREVIEW_CHARS).collect())
                .unwrap_or_default();
            NewAuditEntry::task(
                task_id,
                audit_actions::DRAFT_MESSAGE_SENT,
                serde_json::json!({
                    "to": data.get("to"),
                    "subject": data.get("subject"),
                    "preview": preview,
                }),
            )
        }
        ActionKind::ExtractTable => {
            let rows = data.get("rows").and_then(|v| v.as_array());
            NewAuditEntry::task(
                task_id,
                audit_actions::EVIDENCE_TABLE_SAVED,
                serde_json::json!({
                    "rowsCount": rows.map_or(0, Vec::len),
                    "sample": rows.and_then(|r| r.first()),
                }),
            )
        }
        ActionKind::FillForm => {
            let fields = if data.is_null() {
                serde_json::json!({})
            } else {
                data.clone()
            };
            NewAuditEntry::task(
                task_id,
                audit_actions::COMPUTER_USE_STEP,
                serde_json::json!({
                    "url": MOCK_PORTAL_URL,
                    "fields": fields,
                    "note": "Simulated UI automation step; see mock-portal",
                }),
            )
        }
        ActionKind::Other(kind) => NewAuditEntry::task(
            task_id,
            audit_actions::EXECUTION_SKIPPED,
            serde_json::json!({ "reason": format!("Unknown action kind: {kind}") }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SubjectType;
    use serde_json::json;

    fn action(value: serde_json::Value) -> Action {
        Action::from_value(&value)
    }

    #[test]
    fn draft_message_preview_is_truncated_to_160_chars() {
        let body = "é".repeat(200);
        let id = TaskId::new();
        let entry = audit_for_action(
            id,
            &action(json!({
                "kind": "draft_message",
                "data": { "to": "client", "subject": "Case Update", "body": body }
            })),
        );

        assert_eq!(entry.action, "draft_message_sent");
        assert_eq!(entry.subject_type, SubjectType::Task);
        assert_eq!(entry.subject_id, id.to_string());
        let preview = entry
            .payload
            .get("preview")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
        assert_eq!(
            entry.payload.get("to").and_then(|v| v.as_str()),
            Some("client")
        );
    }

    #[test]
    fn draft_message_without_body_has_empty_preview() {
        let entry = audit_for_action(
            TaskId::new(),
            &action(json!({ "kind": "draft_message", "data": { "to": "client" } })),
        );
        assert_eq!(entry.payload.get("preview"), Some(&json!("")));
        assert_eq!(entry.payload.get("subject"), Some(&json!(null)));
    }

    #[test]
    fn extract_table_counts_rows_and_samples_first() {
        let entry = audit_for_action(
            TaskId::new(),
            &action(json!({
                "kind": "extract_table",
                "data": { "rows": [ { "provider": "A" }, { "provider": "B" } ] }
            })),
        );
        assert_eq!(entry.action, "evidence_table_saved");
        assert_eq!(entry.payload.get("rowsCount"), Some(&json!(2)));
        assert_eq!(
            entry.payload.pointer("/sample/provider"),
            Some(&json!("A"))
        );
    }

    #[test]
    fn extract_table_without_rows_has_null_sample() {
        let entry = audit_for_action(TaskId::new(), &action(json!({ "kind": "extract_table" })));
        assert_eq!(entry.payload.get("rowsCount"), Some(&json!(0)));
        assert_eq!(entry.payload.get("sample"), Some(&json!(null)));
    }

    #[test]
    fn fill_form_points_at_mock_portal() {
        let entry = audit_for_action(TaskId::new(), &action(json!({ "kind": "fill_form" })));
        assert_eq!(entry.action, "computer_use_step");
        assert_eq!(entry.payload.get("url"), Some(&json!("/mock-portal")));
        assert_eq!(entry.payload.get("fields"), Some(&json!({})));
    }

    #[test]
    fn unknown_kind_is_skipped_with_reason() {
        let entry = audit_for_action(TaskId::new(), &action(json!({ "kind": "send_fax" })));
        assert_eq!(entry.action, "execution_skipped");
        assert_eq!(
            entry.payload.get("reason"),
            Some(&json!("Unknown action kind: send_fax"))
        );
    }
}
