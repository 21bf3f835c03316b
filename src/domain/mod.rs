//! Domain layer: core types, execution rules, and the event system.
//!
//! This module holds the server-side model of the workflow: typed row
//! identifiers, the task lifecycle vocabulary, specialist proposals and
//! their actions, the simulated executor, and the event bus that mirrors
//! audit writes to live subscribers.

pub mod event_bus;
pub mod execution;
pub mod ids;
pub mod proposal;
pub mod records;
pub mod task;
pub mod workflow_event;

pub use event_bus::EventBus;
pub use ids::{MessageId, TaskId};
pub use proposal::{
    Action, ActionKind, Citation, DraftMessage, EvidenceRow, MessageStyle, SpecialistProposal,
    actions_of,
};
pub use records::{
    Approval, Artifact, AuditEntry, Message, NewApproval, NewArtifact, NewAuditEntry, NewMessage,
    SubjectType,
};
pub use task::{AgentKind, NewTask, Task, TaskCandidate, TaskStatus, TaskType};
pub use workflow_event::WorkflowEvent;
