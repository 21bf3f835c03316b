//! LLM access with a mock short-circuit.
//!
//! [`LlmGateway`] is the only way the workflow talks to a model. In mock
//! mode (the default) or without an API key, every call returns the
//! caller-supplied mock value and never touches the network.

pub mod gemini;
pub mod prompts;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

pub use gemini::GeminiClient;

use crate::config::RouterConfig;

/// Errors raised by a model call.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Gemini error: {status} {body}")]
    Upstream {
        /// HTTP status code.
        status: u16,
        /// Response body as text.
        body: String,
    },

    /// The provider answered with a body that is not the expected envelope.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// A model that answers a prompt with a JSON value.
#[async_trait]
pub trait JsonModel: Send + Sync + fmt::Debug {
    /// Sends `prompt` followed by `input` and returns the parsed answer.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] on transport or provider failure.
    async fn generate_json(&self, prompt: &str, input: &str)
    -> Result<serde_json::Value, LlmError>;
}

/// Mock-aware entry point for all model calls.
#[derive(Debug, Clone)]
pub struct LlmGateway {
    use_mocks: bool,
    model: Option<Arc<dyn JsonModel>>,
}

impl LlmGateway {
    /// Creates a gateway over an optional model.
    #[must_use]
    pub fn new(use_mocks: bool, model: Option<Arc<dyn JsonModel>>) -> Self {
        Self { use_mocks, model }
    }

    /// A gateway that always answers with mocks.
    #[must_use]
    pub fn mock() -> Self {
        Self::new(true, None)
    }

    /// Builds the gateway from configuration, creating a Gemini client when
    /// an API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &RouterConfig) -> Result<Self, LlmError> {
        let model: Option<Arc<dyn JsonModel>> = match &config.gemini_api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(
                &config.gemini_base_url,
                &config.gemini_model,
                key,
                config.llm_timeout(),
            )?)),
            None => None,
        };
        Ok(Self::new(config.use_mocks, model))
    }

    /// Returns `true` when calls are answered by mocks.
    #[must_use]
    pub fn is_mock(&self) -> bool {
        self.use_mocks || self.model.is_none()
    }

    /// Calls the model, or returns `mock` in mock mode.
    ///
    /// In mock mode without a mock value, returns a placeholder object so
    /// callers always get JSON back.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the live model call fails.
    pub async fn call_json(
        &self,
        prompt: &str,
        input: &str,
        mock: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, LlmError> {
        let model = match &self.model {
            Some(model) if !self.use_mocks => model,
            _ => {
                tracing::debug!("llm mock mode; returning canned response");
                return Ok(mock.unwrap_or_else(|| {
                    serde_json::json!({ "note": "mock enabled and no mock provided", "data": {} })
                }));
            }
        };
        model.generate_json(prompt, input).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct FixedModel(serde_json::Value);

    #[async_trait]
    impl JsonModel for FixedModel {
        async fn generate_json(
            &self,
            _prompt: &str,
            _input: &str,
        ) -> Result<serde_json::Value, LlmError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct FailingModel;

    #[async_trait]
    impl JsonModel for FailingModel {
        async fn generate_json(
            &self,
            _prompt: &str,
            _input: &str,
        ) -> Result<serde_json::Value, LlmError> {
            Err(LlmError::Upstream {
                status: 503,
                body: "overloaded".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn mock_mode_returns_mock() {
        let gateway = LlmGateway::new(true, Some(Arc::new(FixedModel(json!({ "live": true })))));
        let result = gateway.call_json("p", "i", Some(json!({ "mock": true }))).await;
        let Ok(value) = result else {
            panic!("mock call failed");
        };
        assert_eq!(value, json!({ "mock": true }));
    }

    #[tokio::test]
    async fn mock_mode_without_mock_returns_placeholder() {
        let gateway = LlmGateway::mock();
        let Ok(value) = gateway.call_json("p", "i", None).await else {
            panic!("mock call failed");
        };
        assert_eq!(
            value.get("note").and_then(|v| v.as_str()),
            Some("mock enabled and no mock provided")
        );
        assert_eq!(value.get("data"), Some(&json!({})));
    }

    #[tokio::test]
    async fn missing_model_forces_mock_mode() {
        let gateway = LlmGateway::new(false, None);
        assert!(gateway.is_mock());
        let Ok(value) = gateway.call_json("p", "i", Some(json!([1]))).await else {
            panic!("mock call failed");
        };
        assert_eq!(value, json!([1]));
    }

    #[tokio::test]
    async fn live_mode_uses_model() {
        let gateway = LlmGateway::new(false, Some(Arc::new(FixedModel(json!({ "live": true })))));
        assert!(!gateway.is_mock());
        let Ok(value) = gateway.call_json("p", "i", Some(json!({ "mock": true }))).await else {
            panic!("live call failed");
        };
        assert_eq!(value, json!({ "live": true }));
    }

    #[tokio::test]
    async fn live_mode_propagates_errors() {
        let gateway = LlmGateway::new(false, Some(Arc::new(FailingModel)));
        let Err(err) = gateway.call_json("p", "i", None).await else {
            panic!("expected failure");
        };
        assert_eq!(err.to_string(), "Gemini error: 503 overloaded");
    }
}
