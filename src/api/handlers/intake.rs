//! Intake handlers: message ingest and classification.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{ClassifyRequest, ClassifyResponse, IngestRequest, IngestResponse};
use crate::app_state::AppState;
use crate::domain::MessageId;
use crate::error::{ErrorResponse, WorkflowError};
use crate::service::{AttachmentInput, IngestInput};

/// `POST /api/ingest` — Store an incoming client message.
///
/// Accepts `multipart/form-data` (fields `caseId` and `text`, file parts
/// become artifacts) or a JSON body. JSON fields are read one by one; an
/// unparseable body is treated as empty and rejected by the field check.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidRequest`] when `caseId` or `text` is
/// missing or the multipart stream is malformed.
#[utoipa::path(
    post,
    path = "/api/ingest",
    tag = "Intake",
    summary = "Ingest a message",
    description = "Stores a client message (multipart form or JSON) and any attachments with pre-extracted text.",
    request_body = IngestRequest,
    responses(
        (status = 200, description = "Message stored", body = IngestResponse),
        (status = 400, description = "Missing caseId or text", body = ErrorResponse),
    )
)]
pub async fn ingest(
    State(state): State<AppState>,
    req: Request,
) -> Result<impl IntoResponse, WorkflowError> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let input = if is_multipart {
        let multipart = Multipart::from_request(req, &state)
            .await
            .map_err(|e| WorkflowError::InvalidRequest(e.body_text()))?;
        read_multipart(multipart).await?
    } else {
        let body = Bytes::from_request(req, &state)
            .await
            .map_err(|e| WorkflowError::InvalidRequest(e.body_text()))?;
        let json = serde_json::from_slice::<serde_json::Value>(&body)
            .unwrap_or(serde_json::Value::Null);
        IngestRequest::from_json(&json).into()
    };

    let message = state.service.ingest(input).await?;
    Ok(Json(IngestResponse {
        ok: true,
        message_id: message.id,
    }))
}

async fn read_multipart(mut multipart: Multipart) -> Result<IngestInput, WorkflowError> {
    let mut input = IngestInput::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| WorkflowError::InvalidRequest(e.body_text()))?
    {
        if let Some(filename) = field.file_name() {
            input.attachments.push(AttachmentInput {
                filename: Some(filename.to_string()),
                ocr_text: None,
            });
            continue;
        }
        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| WorkflowError::InvalidRequest(e.body_text()))?;
        match name.as_str() {
            "caseId" => input.case_id = value,
            "text" => input.text = value,
            _ => {}
        }
    }
    Ok(input)
}

/// `POST /api/classify` — Turn a message into pending tasks.
///
/// # Errors
///
/// Returns [`WorkflowError::MessageNotFound`] for an unknown message, an
/// LLM error (500) or [`WorkflowError::UnexpectedLlmOutput`] (502).
#[utoipa::path(
    post,
    path = "/api/classify",
    tag = "Intake",
    summary = "Classify a message",
    description = "Asks the classifier for task candidates and stores one pending task per candidate.",
    request_body = ClassifyRequest,
    responses(
        (status = 200, description = "Tasks created", body = ClassifyResponse),
        (status = 404, description = "Message not found", body = ErrorResponse),
        (status = 500, description = "LLM call failed", body = ErrorResponse),
        (status = 502, description = "Classifier returned no candidate list", body = ErrorResponse),
    )
)]
pub async fn classify(
    State(state): State<AppState>,
    Json(req): Json<ClassifyRequest>,
) -> Result<impl IntoResponse, WorkflowError> {
    let tasks = state
        .service
        .classify(req.case_id.as_deref(), MessageId::from_uuid(req.message_id))
        .await?;
    Ok(Json(ClassifyResponse {
        ok: true,
        created: tasks.len(),
    }))
}

/// Intake routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingest", post(ingest))
        .route("/classify", post(classify))
}
