//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::WorkflowService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Workflow service for all business logic.
    pub service: Arc<WorkflowService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wraps a service, sharing its event bus with the WebSocket layer.
    #[must_use]
    pub fn new(service: Arc<WorkflowService>) -> Self {
        let event_bus = service.event_bus().clone();
        Self { service, event_bus }
    }
}
