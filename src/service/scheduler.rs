//! Background loop driving classification and dispatch on a fixed period.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::WorkflowService;

/// Spawns the periodic loop: every `period`, classify recent messages and
/// then dispatch pending tasks.
///
/// Errors are logged and the loop keeps running. The first run happens one
/// full period after start.
pub fn spawn_loop(service: Arc<WorkflowService>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(period);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tick.tick().await;
        loop {
            tick.tick().await;
            run_once(&service).await;
        }
    })
}

/// One scheduler step.
pub async fn run_once(service: &WorkflowService) {
    match service.loop_tick().await {
        Ok(classified) if !classified.is_empty() => {
            tracing::info!(classified = classified.len(), "scheduled loop tick");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(error = %err, "scheduled loop tick failed"),
    }
    match service.dispatch_pending().await {
        Ok(0) => {}
        Ok(dispatched) => tracing::info!(dispatched, "scheduled dispatch"),
        Err(err) => tracing::warn!(error = %err, "scheduled dispatch failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventBus, TaskStatus};
    use crate::llm::LlmGateway;
    use crate::persistence::{MemoryStore, TaskFilter};
    use crate::service::{IngestInput, WorkflowSettings};

    #[tokio::test]
    async fn run_once_classifies_and_dispatches() {
        let service = WorkflowService::new(
            Arc::new(MemoryStore::new()),
            LlmGateway::mock(),
            EventBus::new(64),
            WorkflowSettings::default(),
        );
        let ingested = service
            .ingest(IngestInput {
                case_id: "case-1".to_string(),
                text: "Please send an update".to_string(),
                attachments: Vec::new(),
            })
            .await;
        assert!(ingested.is_ok());

        run_once(&service).await;

        let proposed = service
            .tasks(&TaskFilter {
                status: Some(TaskStatus::Proposed),
                case_id: Some("case-1".to_string()),
                limit: 10,
            })
            .await
            .map(|tasks| tasks.len());
        assert!(matches!(proposed, Ok(2)));
    }
}
