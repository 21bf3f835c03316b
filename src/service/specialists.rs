//! Specialist agents: evidence sorter and client communications.
//!
//! Each specialist gathers its context from the store, asks the model for a
//! [`SpecialistProposal`], and falls back to a canned proposal when the
//! model fails or answers without a `task_type`.

use crate::domain::{
    Action, ActionKind, DraftMessage, EvidenceRow, MessageId, MessageStyle, SpecialistProposal,
    Task, TaskStatus, TaskType, actions_of,
};
use crate::error::WorkflowError;
use crate::llm::prompts::{CLIENT_COMMS_PROMPT, EVIDENCE_SORTER_PROMPT};
use crate::llm::{LlmError, LlmGateway};
use crate::persistence::WorkflowStore;

/// Separator placed between artifact texts sent to the evidence sorter.
pub const OCR_SEPARATOR: &str = "\n---\n";

/// Input sent to the evidence sorter when a case has no extracted text.
pub const NO_OCR: &str = "NO_OCR";

/// Number of evidence rows quoted in a client update.
const HANDOFF_ROWS: usize = 2;

/// Result of one specialist run.
#[derive(Debug, Clone)]
pub struct SpecialistOutcome {
    /// Proposal to store on the task.
    pub proposal: serde_json::Value,
    /// Whether the canned proposal was used.
    pub used_fallback: bool,
    /// Evidence summary handed over from the evidence sorter, if any.
    pub evidence_summary: Option<String>,
}

/// Canned evidence-sorter proposal.
#[must_use]
pub fn mock_evidence_proposal() -> SpecialistProposal {
    let rows = [
        EvidenceRow {
            artifact_id: "A1".to_string(),
            provider: Some("Orlando Ortho".to_string()),
            date_of_service: Some("2025-01-18".to_string()),
            amount: Some(642.5),
            notes: Some("Initial consult".to_string()),
        },
        EvidenceRow {
            artifact_id: "A2".to_string(),
            provider: Some("Central Imaging".to_string()),
            date_of_service: Some("2025-01-25".to_string()),
            amount: Some(380.0),
            notes: Some("MRI shoulder".to_string()),
        },
    ];
    SpecialistProposal {
        task_type: TaskType::EvidenceSort,
        summary: "Parsed 2 bills and 1 receipt. Extracted amounts and dates.".to_string(),
        actions: vec![Action::extract_table(&rows)],
        citations: None,
        risks: None,
        confidence: 0.83,
    }
}

/// Canned client-update proposal, mentioning the evidence summary when one
/// is available.
#[must_use]
pub fn mock_client_update(evidence_summary: Option<&str>) -> SpecialistProposal {
    const NEXT_STEPS: &str = "Here is what we are doing next: (1) compile medical records, \
                              (2) confirm billing totals, and (3) schedule a check-in. \
                              If you notice any missing items, reply here. We will keep you posted.";

    let (summary, body) = match evidence_summary {
        Some(evidence) => (
            format!("Explains next steps and references evidence: {evidence}"),
            format!(
                "Hi — thanks for sending those documents. We have reviewed the evidence: \
                 {evidence}. {NEXT_STEPS}"
            ),
        ),
        None => (
            "Explains next steps and requests missing info politely.".to_string(),
            format!("Hi — thanks for sending those documents. {NEXT_STEPS}"),
        ),
    };

    SpecialistProposal {
        task_type: TaskType::ClientUpdate,
        summary,
        actions: vec![Action::draft_message(&DraftMessage {
            to: "client".to_string(),
            subject: Some("Case Update".to_string()),
            body,
            style: MessageStyle::Empathetic,
        })],
        citations: None,
        risks: None,
        confidence: 0.82,
    }
}

/// Keeps a model answer that names a `task_type`; otherwise the fallback.
fn accept_or_fallback(
    answer: Result<serde_json::Value, LlmError>,
    fallback: &SpecialistProposal,
) -> (serde_json::Value, bool) {
    match answer {
        Ok(value) if has_task_type(&value) => (value, false),
        Ok(_) => {
            tracing::warn!("specialist answer lacks task_type; using fallback proposal");
            (fallback.to_value(), true)
        }
        Err(err) => {
            tracing::warn!(error = %err, "specialist llm call failed; using fallback proposal");
            (fallback.to_value(), true)
        }
    }
}

fn has_task_type(value: &serde_json::Value) -> bool {
    value
        .get("task_type")
        .and_then(|v| v.as_str())
        .is_some_and(|s| !s.is_empty())
}

/// Joins the extracted text of all artifacts, or [`NO_OCR`] when none has any.
#[must_use]
pub fn join_ocr_text<'a>(texts: impl Iterator<Item = Option<&'a str>>) -> String {
    let joined = texts
        .flatten()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(OCR_SEPARATOR);
    if joined.is_empty() {
        NO_OCR.to_string()
    } else {
        joined
    }
}

/// Summarises the first evidence rows of a stored evidence proposal as
/// `"{provider} ({date}): ${amount}"` joined by `"; "`.
#[must_use]
pub fn summarize_evidence(output: &serde_json::Value) -> Option<String> {
    let table = actions_of(Some(output))
        .into_iter()
        .find(|a| a.kind == ActionKind::ExtractTable)?;
    let rows = table.data.get("rows").and_then(|r| r.as_array())?;
    let parts: Vec<String> = rows
        .iter()
        .take(HANDOFF_ROWS)
        .map(|row| {
            let provider = text_field(row, &["provider"]);
            let date = text_field(row, &["date_of_service", "date"]);
            let amount = row.get("amount").map(format_amount).unwrap_or_default();
            format!("{provider} ({date}): ${amount}")
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

fn text_field(row: &serde_json::Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| row.get(*k).and_then(|v| v.as_str()))
        .unwrap_or("n/a")
        .to_string()
}

/// Renders an amount without a trailing `.0` for whole numbers.
fn format_amount(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
            _ => n.to_string(),
        },
        serde_json::Value::String(s) => s.clone(),
        _ => "n/a".to_string(),
    }
}

/// Runs the evidence sorter over every artifact of the task's case.
///
/// # Errors
///
/// Returns a [`WorkflowError`] if the artifacts cannot be loaded.
pub async fn evidence_sorter(
    store: &dyn WorkflowStore,
    llm: &LlmGateway,
    task: &Task,
) -> Result<SpecialistOutcome, WorkflowError> {
    let artifacts = store.artifacts_for_case(&task.case_id).await?;
    let input = join_ocr_text(artifacts.iter().map(|a| a.ocr_text.as_deref()));

    let fallback = mock_evidence_proposal();
    let answer = llm
        .call_json(EVIDENCE_SORTER_PROMPT, &input, Some(fallback.to_value()))
        .await;
    let (proposal, used_fallback) = accept_or_fallback(answer, &fallback);

    tracing::debug!(task_id = %task.id, artifacts = artifacts.len(), used_fallback, "evidence sorter ran");
    Ok(SpecialistOutcome {
        proposal,
        used_fallback,
        evidence_summary: None,
    })
}

/// Drafts a client update, quoting the latest evidence table of the case
/// when the evidence sorter already produced one.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidRequest`] if the task names no source
/// message, or [`WorkflowError::MessageNotFound`] if that message does not
/// exist.
pub async fn client_comms(
    store: &dyn WorkflowStore,
    llm: &LlmGateway,
    task: &Task,
) -> Result<SpecialistOutcome, WorkflowError> {
    let message_id = source_message_id(task).ok_or_else(|| {
        WorkflowError::InvalidRequest(format!("task {} has no source message", task.id))
    })?;
    let message = store
        .get_message(message_id)
        .await?
        .ok_or(WorkflowError::MessageNotFound(*message_id.as_uuid()))?;

    let evidence_task = store
        .latest_case_task(
            &task.case_id,
            TaskType::EvidenceSort,
            &[
                TaskStatus::Proposed,
                TaskStatus::Approved,
                TaskStatus::Executed,
            ],
        )
        .await?;
    let evidence_summary = evidence_task
        .as_ref()
        .and_then(|t| t.output.as_ref())
        .and_then(summarize_evidence);

    let fallback = mock_client_update(evidence_summary.as_deref());
    let answer = llm
        .call_json(CLIENT_COMMS_PROMPT, &message.raw_text, Some(fallback.to_value()))
        .await;
    let (proposal, used_fallback) = accept_or_fallback(answer, &fallback);

    tracing::debug!(
        task_id = %task.id,
        handoff = evidence_summary.is_some(),
        used_fallback,
        "client comms ran"
    );
    Ok(SpecialistOutcome {
        proposal,
        used_fallback,
        evidence_summary,
    })
}

/// The message a task was classified from: the column, or the
/// `input.messageId` recorded by older rows.
fn source_message_id(task: &Task) -> Option<MessageId> {
    task.message_id.or_else(|| {
        task.input
            .get("messageId")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse::<uuid::Uuid>().ok())
            .map(MessageId::from_uuid)
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ocr_texts_are_joined_with_separator() {
        let texts = [Some("bill one"), None, Some(""), Some("receipt")];
        assert_eq!(
            join_ocr_text(texts.into_iter()),
            "bill one\n---\nreceipt"
        );
    }

    #[test]
    fn no_ocr_text_yields_marker() {
        assert_eq!(join_ocr_text(std::iter::empty()), NO_OCR);
        assert_eq!(join_ocr_text([None, Some("")].into_iter()), NO_OCR);
    }

    #[test]
    fn mock_evidence_summary_quotes_first_two_rows() {
        let proposal = mock_evidence_proposal().to_value();
        assert_eq!(
            summarize_evidence(&proposal).as_deref(),
            Some("Orlando Ortho (2025-01-18): $642.5; Central Imaging (2025-01-25): $380")
        );
    }

    #[test]
    fn summary_needs_an_extract_table_with_rows() {
        assert_eq!(summarize_evidence(&json!({ "actions": [] })), None);
        assert_eq!(
            summarize_evidence(&json!({ "actions": [ { "kind": "table_insert", "data": { "rows": [ {} ] } } ] })),
            None
        );
        assert_eq!(
            summarize_evidence(&json!({ "actions": [ { "kind": "extract_table", "data": { "rows": [] } } ] })),
            None
        );
    }

    #[test]
    fn client_update_mentions_evidence_when_present() {
        let with = mock_client_update(Some("X (2025-01-01): $1"));
        assert!(with.summary.contains("references evidence: X (2025-01-01): $1"));
        let body = with
            .actions
            .first()
            .and_then(|a| a.data.get("body"))
            .and_then(|b| b.as_str())
            .unwrap_or_default();
        assert!(body.starts_with("Hi — thanks for sending those documents."));
        assert!(body.contains("We have reviewed the evidence: X (2025-01-01): $1."));

        let without = mock_client_update(None);
        assert_eq!(
            without.summary,
            "Explains next steps and requests missing info politely."
        );
        assert_eq!(
            without.actions.first().map(|a| a.kind.clone()),
            Some(ActionKind::DraftMessage)
        );
    }

    #[test]
    fn answers_without_task_type_fall_back() {
        let fallback = mock_evidence_proposal();
        let (value, used) = accept_or_fallback(Ok(json!({ "task_type": "" })), &fallback);
        assert!(used);
        assert_eq!(value, fallback.to_value());

        let (value, used) =
            accept_or_fallback(Ok(json!({ "task_type": "evidence_sort", "x": 1 })), &fallback);
        assert!(!used);
        assert_eq!(value.get("x"), Some(&json!(1)));
    }

    #[test]
    fn llm_errors_fall_back() {
        let fallback = mock_client_update(None);
        let (value, used) = accept_or_fallback(
            Err(LlmError::InvalidResponse("boom".to_string())),
            &fallback,
        );
        assert!(used);
        assert_eq!(value, fallback.to_value());
    }
}
