//! Classifier output handling: the mock candidate list and parsing of
//! whatever the model returned.

use crate::domain::TaskCandidate;
use crate::error::WorkflowError;

/// Canned classifier answer used in mock mode.
#[must_use]
pub fn mock_candidates() -> serde_json::Value {
    serde_json::json!([
        {
            "type": "evidence_sort",
            "rationale": "Attached bills detected",
            "required_fields": ["provider", "amount"],
            "confidence": 0.86
        },
        {
            "type": "client_update",
            "rationale": "Client asked for next steps",
            "required_fields": [],
            "confidence": 0.79
        }
    ])
}

/// Reads task candidates from a classifier answer.
///
/// Accepts a bare array or an object carrying a `task_candidates` array.
/// Items that do not describe a known task type are skipped.
///
/// # Errors
///
/// Returns [`WorkflowError::UnexpectedLlmOutput`] when no candidate array
/// can be found.
pub fn parse_candidates(answer: &serde_json::Value) -> Result<Vec<TaskCandidate>, WorkflowError> {
    let items = answer
        .as_array()
        .or_else(|| answer.get("task_candidates").and_then(|v| v.as_array()))
        .ok_or_else(|| {
            WorkflowError::UnexpectedLlmOutput("classifier did not return a candidate array".into())
        })?;

    Ok(items
        .iter()
        .filter_map(
            |item| match serde_json::from_value::<TaskCandidate>(item.clone()) {
                Ok(candidate) => Some(candidate),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unusable task candidate");
                    None
                }
            },
        )
        .collect())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::TaskType;
    use serde_json::json;

    #[test]
    fn mock_parses_into_two_candidates() {
        let Ok(candidates) = parse_candidates(&mock_candidates()) else {
            panic!("mock should parse");
        };
        let types: Vec<TaskType> = candidates.iter().map(|c| c.task_type).collect();
        assert_eq!(types, vec![TaskType::EvidenceSort, TaskType::ClientUpdate]);
        assert_eq!(candidates.first().and_then(|c| c.confidence), Some(0.86));
    }

    #[test]
    fn wrapped_candidate_array_is_accepted() {
        let answer = json!({ "task_candidates": [ { "type": "client_update" } ] });
        let Ok(candidates) = parse_candidates(&answer) else {
            panic!("wrapped array should parse");
        };
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn unknown_types_are_skipped() {
        let answer = json!([ { "type": "tax_filing" }, { "type": "evidence_sort" } ]);
        let Ok(candidates) = parse_candidates(&answer) else {
            panic!("array should parse");
        };
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn non_array_answer_is_rejected() {
        let result = parse_candidates(&json!({ "_raw": "sorry" }));
        assert!(matches!(result, Err(WorkflowError::UnexpectedLlmOutput(_))));
    }
}
