//! Enum types shared across the LEGION crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// MISSION STATE
// ============================================================================

/// Lifecycle state of a mission.
///
/// The state machine is deliberately lenient: any string the seven known
/// states do not cover is carried verbatim in `Custom`, and parsing never
/// fails. Transition rules live in `legion-missions`, not here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MissionState {
    Draft,
    Scanning,
    Engaging,
    Escalating,
    Paused,
    Complete,
    Aborted,
    /// Any unrecognized state string, stored verbatim.
    Custom(String),
}

// Serialized as a plain string (`from`/`into` String above), so the OpenAPI
// schema is a string rather than a variant list.
#[cfg(feature = "openapi")]
impl utoipa::PartialSchema for MissionState {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        <String as utoipa::PartialSchema>::schema()
    }
}

#[cfg(feature = "openapi")]
impl utoipa::ToSchema for MissionState {}

impl MissionState {
    pub fn as_str(&self) -> &str {
        match self {
            MissionState::Draft => "draft",
            MissionState::Scanning => "scanning",
            MissionState::Engaging => "engaging",
            MissionState::Escalating => "escalating",
            MissionState::Paused => "paused",
            MissionState::Complete => "complete",
            MissionState::Aborted => "aborted",
            MissionState::Custom(s) => s.as_str(),
        }
    }

    /// Terminal states never transition again except by explicit overwrite.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionState::Complete | MissionState::Aborted)
    }

    /// Active states are the ones a running mission cycles through.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            MissionState::Draft
                | MissionState::Scanning
                | MissionState::Engaging
                | MissionState::Escalating
        )
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, MissionState::Paused)
    }
}

impl From<String> for MissionState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => MissionState::Draft,
            "scanning" => MissionState::Scanning,
            "engaging" => MissionState::Engaging,
            "escalating" => MissionState::Escalating,
            "paused" => MissionState::Paused,
            "complete" => MissionState::Complete,
            "aborted" => MissionState::Aborted,
            _ => MissionState::Custom(s),
        }
    }
}

impl From<&str> for MissionState {
    fn from(s: &str) -> Self {
        MissionState::from(s.to_string())
    }
}

impl From<MissionState> for String {
    fn from(state: MissionState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MissionState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(MissionState::from(s))
    }
}

// ============================================================================
// WORKER IDENTITY AND STATUS
// ============================================================================

/// The three fixed workers whose indicators the status engine derives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum WorkerName {
    Coordinator,
    Crawler,
    Closer,
}

impl WorkerName {
    pub const ALL: [WorkerName; 3] = [
        WorkerName::Coordinator,
        WorkerName::Crawler,
        WorkerName::Closer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerName::Coordinator => "coordinator",
            WorkerName::Crawler => "crawler",
            WorkerName::Closer => "closer",
        }
    }
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown worker name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown worker name: {0}")]
pub struct ParseWorkerNameError(pub String);

impl FromStr for WorkerName {
    type Err = ParseWorkerNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coordinator" => Ok(WorkerName::Coordinator),
            "crawler" => Ok(WorkerName::Crawler),
            "closer" => Ok(WorkerName::Closer),
            other => Err(ParseWorkerNameError(other.to_string())),
        }
    }
}

/// Traffic-light indicator for a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum StatusLight {
    Green,
    Yellow,
    Red,
}

impl StatusLight {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLight::Green => "green",
            StatusLight::Yellow => "yellow",
            StatusLight::Red => "red",
        }
    }
}

impl fmt::Display for StatusLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// THREADS AND MESSAGES
// ============================================================================

/// Working stage of a conversation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ThreadStage {
    Brainstorm,
    Consolidate,
    Execute,
}

impl ThreadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreadStage::Brainstorm => "brainstorm",
            ThreadStage::Consolidate => "consolidate",
            ThreadStage::Execute => "execute",
        }
    }
}

impl Default for ThreadStage {
    fn default() -> Self {
        ThreadStage::Brainstorm
    }
}

impl fmt::Display for ThreadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown thread stage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown thread stage: {0}")]
pub struct ParseThreadStageError(pub String);

impl FromStr for ThreadStage {
    type Err = ParseThreadStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "brainstorm" => Ok(ThreadStage::Brainstorm),
            "consolidate" => Ok(ThreadStage::Consolidate),
            "execute" => Ok(ThreadStage::Execute),
            other => Err(ParseThreadStageError(other.to_string())),
        }
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Human,
    Assistant,
}

/// UI affordance attached to synthetic command acknowledgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    StartNow,
    EditDraft,
}

// ============================================================================
// HOT LEADS
// ============================================================================

/// Pipeline status of a hot lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HotLeadStatus {
    New,
    Approved,
    Contacted,
    Closed,
}

// ============================================================================
// TRANSITIONS AND ENTITY DISCRIMINATOR
// ============================================================================

/// Kind of mission lifecycle transition, used for audit signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Paused,
    Resumed,
    Aborted,
    Completed,
    Overwritten,
}

impl TransitionKind {
    /// Audit event name emitted for this transition.
    pub fn event_name(&self) -> &'static str {
        match self {
            TransitionKind::Paused => "mission_paused",
            TransitionKind::Resumed => "mission_resumed",
            TransitionKind::Aborted => "mission_aborted",
            TransitionKind::Completed => "mission_completed",
            TransitionKind::Overwritten => "mission_state_changed",
        }
    }
}

/// Entity type discriminator for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Mission,
    AgentStatus,
    Thread,
    Message,
    HotLead,
    Guardrail,
    Event,
}

// ============================================================================
// TESTS
// ============================================================================
