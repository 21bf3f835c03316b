//! DTOs for message intake and classification.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::MessageId;
use crate::service::{AttachmentInput, IngestInput};

/// JSON body for `POST /api/ingest`.
///
/// Every field is optional at the wire level; presence is checked by the
/// service so the error matches the multipart path. Bodies are read with
/// [`IngestRequest::from_json`], so one badly typed field does not discard
/// the others.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct IngestRequest {
    /// Case the message belongs to. Numbers are accepted and stringified.
    pub case_id: String,
    /// Message body.
    pub text: String,
    /// Documents with pre-extracted text.
    pub attachments: Vec<AttachmentDto>,
}

impl IngestRequest {
    /// Reads an ingest body field by field.
    ///
    /// `caseId` and `text` take strings, numbers and booleans as text;
    /// anything else counts as missing. Attachment entries that are not
    /// valid [`AttachmentDto`] objects are dropped one by one.
    #[must_use]
    pub fn from_json(body: &serde_json::Value) -> Self {
        let attachments = body
            .get("attachments")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        serde_json::from_value::<AttachmentDto>(item.clone())
                            .inspect_err(|e| tracing::debug!(error = %e, "skipping attachment"))
                            .ok()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            case_id: scalar_text(body.get("caseId")),
            text: scalar_text(body.get("text")),
            attachments,
        }
    }
}

fn scalar_text(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        Some(serde_json::Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// One attachment in an [`IngestRequest`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachmentDto {
    /// Original file name.
    pub filename: Option<String>,
    /// Text extracted from the document.
    pub ocr_text: Option<String>,
}

impl From<IngestRequest> for IngestInput {
    fn from(req: IngestRequest) -> Self {
        Self {
            case_id: req.case_id,
            text: req.text,
            attachments: req
                .attachments
                .into_iter()
                .map(|a| AttachmentInput {
                    filename: a.filename,
                    ocr_text: a.ocr_text,
                })
                .collect(),
        }
    }
}

/// Response body for `POST /api/ingest`.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Identifier of the stored message.
    #[schema(value_type = Uuid)]
    pub message_id: MessageId,
}

/// Request body for `POST /api/classify`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    /// Case for the new tasks; defaults to the message's case.
    #[serde(default)]
    pub case_id: Option<String>,
    /// Message to classify.
    pub message_id: Uuid,
}

/// Response body for `POST /api/classify`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClassifyResponse {
    /// Always `true` on success.
    pub ok: bool,
    /// Number of tasks created.
    pub created: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    #[test]
    fn ingest_request_tolerates_missing_fields() {
        let req = IngestRequest::from_json(&json!({ "caseId": "c-1" }));
        assert_eq!(req.case_id, "c-1");
        assert!(req.text.is_empty());
        assert!(req.attachments.is_empty());
    }

    #[test]
    fn null_attachments_keep_the_message() {
        let req = IngestRequest::from_json(&json!({
            "caseId": "c-1",
            "text": "hi",
            "attachments": null,
        }));
        assert_eq!(req.case_id, "c-1");
        assert_eq!(req.text, "hi");
        assert!(req.attachments.is_empty());
    }

    #[test]
    fn malformed_attachment_is_dropped_alone() {
        let req = IngestRequest::from_json(&json!({
            "caseId": "c-1",
            "text": "hi",
            "attachments": [
                { "filename": 7 },
                "not an object",
                { "filename": "b.pdf", "ocrText": "Total $20" },
            ],
        }));
        assert_eq!(req.text, "hi");
        assert_eq!(req.attachments.len(), 1);
        assert_eq!(
            req.attachments.first().and_then(|a| a.filename.as_deref()),
            Some("b.pdf")
        );
    }

    #[test]
    fn numeric_case_id_is_stringified() {
        let req = IngestRequest::from_json(&json!({ "caseId": 42, "text": "hi" }));
        assert_eq!(req.case_id, "42");
        assert_eq!(req.text, "hi");
    }

    #[test]
    fn non_object_body_reads_as_empty() {
        let req = IngestRequest::from_json(&json!(["caseId", "text"]));
        assert!(req.case_id.is_empty());
        assert!(req.text.is_empty());
    }

    #[test]
    fn attachments_map_to_service_input() {
        let req = IngestRequest::from_json(&json!({
            "caseId": "c-1",
            "text": "hi",
            "attachments": [{ "filename": "a.pdf", "ocrText": "Total $12" }],
        }));
        let input = IngestInput::from(req);
        assert_eq!(input.attachments.len(), 1);
        assert_eq!(
            input.attachments.first().and_then(|a| a.ocr_text.as_deref()),
            Some("Total $12")
        );
    }
}
