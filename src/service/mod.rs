//! Service layer: business logic orchestration.
//!
//! [`WorkflowService`] coordinates the workflow steps, delegates model calls
//! to the [`crate::llm::LlmGateway`], and emits audit events through the
//! [`super::domain::EventBus`].

pub mod classifier;
pub mod scheduler;
pub mod specialists;
pub mod workflow_service;

pub use workflow_service::{
    AttachmentInput, DecisionOutcome, ExecutionReport, IngestInput, ReviewDecision, Telemetry,
    WorkflowService, WorkflowSettings,
};
