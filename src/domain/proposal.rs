//! Specialist proposals and the actions they carry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::TaskType;

/// What a specialist proposes to do for a task.
///
/// Stored as the task's `output` column. LLM answers are stored verbatim
/// as JSON, so readers go through [`Action::from_value`] rather than
/// deserializing the whole proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistProposal {
    /// Task type the proposal answers.
    pub task_type: TaskType,
    /// One-line summary for the reviewer.
    pub summary: String,
    /// Actions to run once approved.
    pub actions: Vec<Action>,
    /// Source references backing the proposal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
    /// Risks the reviewer should weigh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risks: Option<Vec<String>>,
    /// Specialist confidence in `[0, 1]`.
    pub confidence: f64,
}

impl SpecialistProposal {
    /// Serializes the proposal for storage.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Reference to a source artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    /// Artifact or message the quote comes from.
    pub source_id: String,
    /// Quoted passage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// Action kind discriminator.
///
/// Unknown kinds are kept so execution can log them as skipped instead of
/// failing the whole task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Send a drafted message.
    DraftMessage,
    /// Save an extracted evidence table.
    ExtractTable,
    /// Fill a web form on the portal.
    FillForm,
    /// Anything else the model produced.
    Other(String),
}

impl ActionKind {
    /// Wire string for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::DraftMessage => "draft_message",
            Self::ExtractTable => "extract_table",
            Self::FillForm => "fill_form",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for ActionKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft_message" => Self::DraftMessage,
            "extract_table" => Self::ExtractTable,
            "fill_form" => Self::FillForm,
            _ => Self::Other(s),
        }
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action inside a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// What to do.
    pub kind: ActionKind,
    /// Kind-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Action {
    /// Placeholder kind for actions that carry no `kind` at all.
    pub const MISSING_KIND: &'static str = "<missing>";

    /// Reads an action from untrusted JSON without failing.
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        let kind = value
            .get("kind")
            .and_then(|v| v.as_str())
            .unwrap_or(Self::MISSING_KIND)
            .to_string();
        Self {
            kind: ActionKind::from(kind),
            data: value.get("data").cloned().unwrap_or_default(),
        }
    }

    /// Builds a `draft_message` action.
    #[must_use]
    pub fn draft_message(message: &DraftMessage) -> Self {
        Self {
            kind: ActionKind::DraftMessage,
            data: serde_json::to_value(message).unwrap_or_default(),
        }
    }

    /// Builds an `extract_table` action.
    #[must_use]
    pub fn extract_table(rows: &[EvidenceRow]) -> Self {
        Self {
            kind: ActionKind::ExtractTable,
            data: serde_json::json!({ "rows": rows }),
        }
    }
}

/// Reads every action of a stored proposal. A missing or malformed
/// `actions` field yields no actions.
#[must_use]
pub fn actions_of(output: Option<&serde_json::Value>) -> Vec<Action> {
    output
        .and_then(|o| o.get("actions"))
        .and_then(|a| a.as_array())
        .map(|items| items.iter().map(Action::from_value).collect())
        .unwrap_or_default()
}

/// Tone of a drafted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStyle {
    /// Warm, layperson tone.
    Empathetic,
    /// Formal tone.
    Professional,
}

/// Payload of a `draft_message` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftMessage {
    /// Recipient.
    pub to: String,
    /// Subject line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Message body.
    pub body: String,
    /// Tone.
    pub style: MessageStyle,
}

/// One row of an `extract_table` action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRow {
    /// Artifact the row was read from.
    pub artifact_id: String,
    /// Billing provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// ISO date of service.
    #[serde(
        default,
        rename = "date_of_service",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_service: Option<String>,
    /// Billed amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Free-form notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
