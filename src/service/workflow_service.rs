//! Workflow service: ingest, classify, dispatch, review, execute.
//!
//! Every operation is a short sequence of store calls plus, where needed,
//! one model call. Audit rows go through [`WorkflowService::record`] so
//! they are persisted and broadcast together.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde_json::json;

use super::classifier::{mock_candidates, parse_candidates};
use super::specialists::{self, SpecialistOutcome};
use crate::domain::execution::audit_for_action;
use crate::domain::{
    AgentKind, AuditEntry, EventBus, Message, MessageId, NewApproval, NewArtifact, NewAuditEntry,
    NewMessage, NewTask, Task, TaskId, TaskStatus, WorkflowEvent, actions_of,
};
use crate::error::WorkflowError;
use crate::llm::LlmGateway;
use crate::llm::prompts::CLASSIFIER_PROMPT;
use crate::persistence::{AuditFilter, MessageFilter, TaskFilter, WorkflowStore};

/// Audit action names written by the service itself.
pub mod audit_actions {
    /// A message was stored.
    pub const MESSAGE_INGESTED: &str = "message_ingested";
    /// A message was turned into tasks.
    pub const CLASSIFIED: &str = "classified";
    /// A specialist proposal was stored on a task.
    pub const DISPATCHED: &str = "dispatched";
    /// A specialist failed during an orchestrator run.
    pub const DISPATCH_FAILED: &str = "dispatch_failed";
    /// One orchestrator run covering several tasks.
    pub const PARALLEL_DISPATCH: &str = "parallel_dispatch";
    /// Client comms reused the evidence sorter's table.
    pub const A2A_HANDOFF: &str = "a2a_handoff";
    /// Outcome of the execution triggered by an approval.
    pub const EXECUTION_RESULT: &str = "execution_result";
    /// The loop classified recent messages.
    pub const LOOP_TICK: &str = "loop_tick";
}

/// Source recorded for messages posted to the ingest endpoint.
pub const UPLOAD_SOURCE: &str = "upload";

/// Tunables for the service.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowSettings {
    /// Maximum number of pending tasks per orchestrator run.
    pub orchestrator_batch_size: u32,
    /// How far back the loop tick looks for messages.
    pub loop_lookback: chrono::Duration,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            orchestrator_batch_size: 5,
            loop_lookback: chrono::Duration::minutes(15),
        }
    }
}

/// A document attached to an ingested message.
#[derive(Debug, Clone, Default)]
pub struct AttachmentInput {
    /// Original file name.
    pub filename: Option<String>,
    /// Text already extracted from the document.
    pub ocr_text: Option<String>,
}

/// Everything the ingest step needs.
#[derive(Debug, Clone, Default)]
pub struct IngestInput {
    /// Case the message belongs to.
    pub case_id: String,
    /// Message body.
    pub text: String,
    /// Attached documents.
    pub attachments: Vec<AttachmentInput>,
}

/// A reviewer's verdict on a proposed task.
#[derive(Debug, Clone)]
pub struct ReviewDecision {
    /// Task under review.
    pub task_id: TaskId,
    /// `true` to approve, `false` to reject.
    pub approve: bool,
    /// Who decided.
    pub reviewer: String,
    /// Optional notes.
    pub comments: Option<String>,
}

/// What a review decision led to.
#[derive(Debug, Clone)]
pub struct DecisionOutcome {
    /// Task status after the decision (and execution, if any).
    pub status: TaskStatus,
    /// Execution result for approvals, `{ok, actionsProcessed}` or `{ok, error}`.
    pub execution: Option<serde_json::Value>,
}

/// Summary of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Number of actions interpreted.
    pub actions_processed: usize,
}

/// Counters shown on the telemetry view.
#[derive(Debug, Clone)]
pub struct Telemetry {
    /// Task counts keyed by status.
    pub tasks: BTreeMap<String, u64>,
    /// Number of orchestrator runs that dispatched tasks.
    pub parallel_dispatch: u64,
    /// Number of evidence handoffs into client updates.
    pub a2a_handoff: u64,
    /// When the loop last classified something.
    pub last_loop: Option<DateTime<Utc>>,
}

/// Coordinator for every workflow step.
///
/// Stateless apart from its collaborators: the store for rows, the LLM
/// gateway for model calls, and the event bus for live audit events.
#[derive(Debug, Clone)]
pub struct WorkflowService {
    store: Arc<dyn WorkflowStore>,
    llm: LlmGateway,
    event_bus: EventBus,
    settings: WorkflowSettings,
}

impl WorkflowService {
    /// Creates a new `WorkflowService`.
    #[must_use]
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        llm: LlmGateway,
        event_bus: EventBus,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            store,
            llm,
            event_bus,
            settings,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Whether model calls are answered by canned mock results.
    #[must_use]
    pub fn llm_is_mock(&self) -> bool {
        self.llm.is_mock()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /// Persists audit rows and publishes them on the event bus.
    async fn record(
        &self,
        case_id: Option<&str>,
        entries: Vec<NewAuditEntry>,
    ) -> Result<Vec<AuditEntry>, WorkflowError> {
        if entries.is_empty() {
            return Ok(Vec::new());
        }
        let stored = self.store.insert_audit(entries).await?;
        for entry in &stored {
            let _ = self.event_bus.publish(WorkflowEvent {
                case_id: case_id.map(str::to_string),
                entry: entry.clone(),
            });
        }
        Ok(stored)
    }

    /// Stores an incoming message and its attachments.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidRequest`] if the case id or text is
    /// empty, or a persistence error.
    pub async fn ingest(&self, input: IngestInput) -> Result<Message, WorkflowError> {
        if input.case_id.trim().is_empty() || input.text.trim().is_empty() {
            return Err(WorkflowError::InvalidRequest(
                "Missing caseId or text".to_string(),
            ));
        }

        let message = self
            .store
            .insert_message(NewMessage {
                case_id: input.case_id,
                source: UPLOAD_SOURCE.to_string(),
                raw_text: input.text,
            })
            .await?;

        let attachment_count = input.attachments.len();
        for attachment in input.attachments {
            self.store
                .insert_artifact(NewArtifact {
                    case_id: message.case_id.clone(),
                    filename: attachment.filename,
                    ocr_text: attachment.ocr_text,
                })
                .await?;
        }

        self.record(
            Some(&message.case_id),
            vec![NewAuditEntry::case(
                &message.case_id,
                audit_actions::MESSAGE_INGESTED,
                json!({ "messageId": message.id, "attachments": attachment_count }),
            )],
        )
        .await?;

        tracing::info!(message_id = %message.id, case_id = %message.case_id, attachment_count, "message ingested");
        Ok(message)
    }

    /// Classifies a message into `pending` tasks.
    ///
    /// `case_id` defaults to the message's own case when absent or empty.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MessageNotFound`] for an unknown message,
    /// [`WorkflowError::Llm`] if the model call fails, or
    /// [`WorkflowError::UnexpectedLlmOutput`] if it returns no candidates.
    pub async fn classify(
        &self,
        case_id: Option<&str>,
        message_id: MessageId,
    ) -> Result<Vec<Task>, WorkflowError> {
        let message = self
            .store
            .get_message(message_id)
            .await?
            .ok_or(WorkflowError::MessageNotFound(*message_id.as_uuid()))?;
        let case_id = case_id
            .filter(|c| !c.is_empty())
            .unwrap_or(message.case_id.as_str())
            .to_string();

        let answer = self
            .llm
            .call_json(CLASSIFIER_PROMPT, &message.raw_text, Some(mock_candidates()))
            .await?;
        let candidates = parse_candidates(&answer)?;

        let new_tasks: Vec<NewTask> = candidates
            .iter()
            .map(|c| NewTask::from_candidate(&case_id, message.id, c))
            .collect();
        let tasks = self.store.insert_tasks(new_tasks).await?;

        self.record(
            Some(&case_id),
            vec![NewAuditEntry::case(
                &case_id,
                audit_actions::CLASSIFIED,
                json!({
                    "messageId": message.id,
                    "taskIds": tasks.iter().map(|t| t.id).collect::<Vec<_>>(),
                }),
            )],
        )
        .await?;

        tracing::info!(%message_id, case_id, created = tasks.len(), "message classified");
        Ok(tasks)
    }

    /// Runs a specialist on the given task and stores its proposal.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] for an unknown task, or any
    /// error raised by the specialist.
    pub async fn run_specialist(
        &self,
        agent: AgentKind,
        task_id: TaskId,
    ) -> Result<serde_json::Value, WorkflowError> {
        let task = self.require_task(task_id).await?;
        self.propose(agent, &task).await
    }

    async fn propose(
        &self,
        agent: AgentKind,
        task: &Task,
    ) -> Result<serde_json::Value, WorkflowError> {
        let SpecialistOutcome {
            proposal,
            used_fallback,
            evidence_summary,
        } = match agent {
            AgentKind::EvidenceSorter => {
                specialists::evidence_sorter(self.store.as_ref(), &self.llm, task).await?
            }
            AgentKind::ClientComms => {
                specialists::client_comms(self.store.as_ref(), &self.llm, task).await?
            }
        };

        self.store.set_task_proposal(task.id, &proposal).await?;

        if evidence_summary.is_some() {
            self.record(
                Some(&task.case_id),
                vec![NewAuditEntry::case(
                    &task.case_id,
                    audit_actions::A2A_HANDOFF,
                    json!({
                        "from": AgentKind::EvidenceSorter,
                        "to": AgentKind::ClientComms,
                        "took": "summary_included",
                    }),
                )],
            )
            .await?;
        }

        tracing::info!(task_id = %task.id, %agent, used_fallback, "proposal stored");
        Ok(proposal)
    }

    /// Dispatches a batch of pending tasks to their specialists concurrently.
    ///
    /// A failing specialist is recorded as `dispatch_failed` and does not
    /// stop the others. Returns the number of tasks picked up.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if pending tasks cannot be loaded or the
    /// run cannot be recorded.
    pub async fn dispatch_pending(&self) -> Result<usize, WorkflowError> {
        let pending = self
            .store
            .pending_tasks(self.settings.orchestrator_batch_size)
            .await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let runs = pending.iter().map(|task| async move {
            let agent = task.assignee_agent;
            let entry = match self.propose(agent, task).await {
                Ok(_) => NewAuditEntry::task(
                    task.id,
                    audit_actions::DISPATCHED,
                    json!({ "agent": agent }),
                ),
                Err(err) => {
                    tracing::warn!(task_id = %task.id, %agent, error = %err, "dispatch failed");
                    NewAuditEntry::task(
                        task.id,
                        audit_actions::DISPATCH_FAILED,
                        json!({ "agent": agent, "error": err.to_string() }),
                    )
                }
            };
            self.record(Some(&task.case_id), vec![entry]).await
        });

        for result in join_all(runs).await {
            if let Err(err) = result {
                tracing::warn!(error = %err, "could not record dispatch");
            }
        }

        self.record(
            None,
            vec![NewAuditEntry::system(
                "orchestrator",
                audit_actions::PARALLEL_DISPATCH,
                json!({
                    "taskIds": pending.iter().map(|t| t.id).collect::<Vec<_>>(),
                    "count": pending.len(),
                }),
            )],
        )
        .await?;

        tracing::info!(dispatched = pending.len(), "orchestrator run complete");
        Ok(pending.len())
    }

    /// Records a reviewer decision; approvals are executed immediately.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] for an unknown task or a
    /// persistence error. Execution failures are reported in the outcome,
    /// not as an error.
    pub async fn decide(&self, decision: ReviewDecision) -> Result<DecisionOutcome, WorkflowError> {
        let task = self.require_task(decision.task_id).await?;
        let status = TaskStatus::from_decision(decision.approve);

        self.store
            .insert_approval(NewApproval {
                task_id: task.id,
                status,
                reviewer: decision.reviewer.clone(),
                comments: decision.comments,
            })
            .await?;
        self.store.set_task_status(task.id, status).await?;
        self.record(
            Some(&task.case_id),
            vec![NewAuditEntry::task(
                task.id,
                status.as_str(),
                json!({ "reviewer": decision.reviewer }),
            )],
        )
        .await?;

        tracing::info!(task_id = %task.id, %status, reviewer = %decision.reviewer, "review recorded");

        if !decision.approve {
            return Ok(DecisionOutcome {
                status,
                execution: None,
            });
        }

        let (final_status, result) = match self.execute(task.id).await {
            Ok(report) => (
                TaskStatus::Executed,
                json!({ "ok": true, "actionsProcessed": report.actions_processed }),
            ),
            Err(err) => {
                tracing::warn!(task_id = %task.id, error = %err, "execution after approval failed");
                (status, json!({ "ok": false, "error": err.to_string() }))
            }
        };
        self.record(
            Some(&task.case_id),
            vec![NewAuditEntry::task(
                task.id,
                audit_actions::EXECUTION_RESULT,
                result.clone(),
            )],
        )
        .await?;

        Ok(DecisionOutcome {
            status: final_status,
            execution: Some(result),
        })
    }

    /// Executes the actions of a task's proposal by writing one audit row
    /// per action, then marks the task `executed`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] for an unknown task or a
    /// persistence error.
    pub async fn execute(&self, task_id: TaskId) -> Result<ExecutionReport, WorkflowError> {
        let task = self.require_task(task_id).await?;
        let actions = actions_of(task.output.as_ref());
        let entries = actions
            .iter()
            .map(|action| audit_for_action(task.id, action))
            .collect();

        self.record(Some(&task.case_id), entries).await?;
        self.store
            .set_task_status(task.id, TaskStatus::Executed)
            .await?;

        tracing::info!(task_id = %task.id, actions = actions.len(), "task executed");
        Ok(ExecutionReport {
            actions_processed: actions.len(),
        })
    }

    /// Classifies every message inside the lookback window that has no
    /// tasks yet.
    ///
    /// Returns the ids of the messages classified in this tick.
    ///
    /// # Errors
    ///
    /// Returns a persistence error if recent messages cannot be loaded.
    /// Classification failures of single messages are logged and skipped.
    pub async fn loop_tick(&self) -> Result<Vec<MessageId>, WorkflowError> {
        let since = Utc::now() - self.settings.loop_lookback;
        let untasked = self.store.untasked_messages_since(since).await?;

        let mut classified = Vec::new();
        for message in untasked {
            match self.classify(Some(&message.case_id), message.id).await {
                Ok(_) => classified.push(message.id),
                Err(err) => {
                    tracing::warn!(message_id = %message.id, error = %err, "loop classification failed");
                }
            }
        }

        if !classified.is_empty() {
            self.record(
                None,
                vec![NewAuditEntry::system(
                    "loop",
                    audit_actions::LOOP_TICK,
                    json!({ "classifiedMessageIds": classified }),
                )],
            )
            .await?;
        }

        tracing::debug!(classified = classified.len(), "loop tick complete");
        Ok(classified)
    }

    /// Lists messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub async fn messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, WorkflowError> {
        self.store.list_messages(filter).await
    }

    /// Lists tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub async fn tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, WorkflowError> {
        self.store.list_tasks(filter).await
    }

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TaskNotFound`] for an unknown task.
    pub async fn require_task(&self, task_id: TaskId) -> Result<Task, WorkflowError> {
        self.store
            .get_task(task_id)
            .await?
            .ok_or(WorkflowError::TaskNotFound(*task_id.as_uuid()))
    }

    /// Lists audit rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub async fn audit(&self, filter: &AuditFilter) -> Result<Vec<AuditEntry>, WorkflowError> {
        self.store.list_audit(filter).await
    }

    /// Collects the telemetry counters.
    ///
    /// # Errors
    ///
    /// Returns a persistence error.
    pub async fn telemetry(&self) -> Result<Telemetry, WorkflowError> {
        let (tasks, parallel_dispatch, a2a_handoff, last_loop) = tokio::try_join!(
            self.store.task_status_counts(),
            self.store
                .count_audit_action(audit_actions::PARALLEL_DISPATCH),
            self.store.count_audit_action(audit_actions::A2A_HANDOFF),
            self.store.latest_audit_at(audit_actions::LOOP_TICK),
        )?;
        Ok(Telemetry {
            tasks,
            parallel_dispatch,
            a2a_handoff,
            last_loop,
        })
    }
}
