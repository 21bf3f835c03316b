//! Google Gemini JSON-mode client.
//!
//! Sends a single user turn (`<prompt>\n\nINPUT:\n<input>`) with
//! `responseMimeType: application/json` and parses the first candidate's
//! text as JSON.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;

use super::{JsonModel, LlmError};

/// Gemini REST client bound to one model.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Creates a client for `{base_url}/models/{model}:generateContent`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{model}:generateContent",
                base_url.trim_end_matches('/')
            ),
            api_key: api_key.to_string(),
        })
    }

    /// Full `generateContent` URL (without the key).
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_url(&self) -> Result<Url, LlmError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| LlmError::InvalidResponse(format!("bad endpoint: {e}")))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl JsonModel for GeminiClient {
    async fn generate_json(
        &self,
        prompt: &str,
        input: &str,
    ) -> Result<serde_json::Value, LlmError> {
        let response = self
            .client
            .post(self.request_url()?)
            .json(&GenerateRequest::json_mode(prompt, input))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "gemini request failed");
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(parse_candidate_text(first_candidate_text(&envelope)))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

impl GenerateRequest {
    fn json_mode(prompt: &str, input: &str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: format!("{prompt}\n\nINPUT:\n{input}"),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }
}

/// Text of the first part of the first candidate, `"{}"` when absent.
fn first_candidate_text(envelope: &serde_json::Value) -> &str {
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|v| v.as_str())
        .unwrap_or("{}")
}

/// Parses model text as JSON, keeping unparseable text under `_raw`.
fn parse_candidate_text(text: &str) -> serde_json::Value {
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::json!({ "_raw": text }))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_uses_json_mode_and_input_marker() {
        let body = serde_json::to_value(GenerateRequest::json_mode("PROMPT", "hello"))
            .unwrap_or_default();
        assert_eq!(
            body.pointer("/generationConfig/responseMimeType"),
            Some(&json!("application/json"))
        );
        assert_eq!(body.pointer("/contents/0/role"), Some(&json!("user")));
        assert_eq!(
            body.pointer("/contents/0/parts/0/text"),
            Some(&json!("PROMPT\n\nINPUT:\nhello"))
        );
    }

    #[test]
    fn extracts_first_candidate_text() {
        let envelope = json!({
            "candidates": [
                { "content": { "parts": [ { "text": "[1,2]" }, { "text": "ignored" } ] } },
                { "content": { "parts": [ { "text": "other" } ] } }
            ]
        });
        assert_eq!(first_candidate_text(&envelope), "[1,2]");
    }

    #[test]
    fn empty_envelope_defaults_to_empty_object() {
        let binding = json!({});
        let text = first_candidate_text(&binding);
        assert_eq!(parse_candidate_text(text), json!({}));
    }

    #[test]
    fn unparseable_text_is_kept_raw() {
        assert_eq!(
            parse_candidate_text("not json"),
            json!({ "_raw": "not json" })
        );
    }

    #[test]
    fn endpoint_joins_base_and_model() {
        let Ok(client) = GeminiClient::new(
            "https://example.test/v1beta/",
            "gemini-2.5-pro",
            "k",
            Duration::from_secs(5),
        ) else {
            panic!("client construction failed");
        };
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
        let Ok(url) = client.request_url() else {
            panic!("url should parse");
        };
        assert_eq!(url.query(), Some("key=k"));
        assert!(!format!("{client:?}").contains("\"k\""));
    }
}
