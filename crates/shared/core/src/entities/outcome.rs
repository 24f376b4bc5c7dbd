use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::Instruction;

/// Terminal status of one (instruction-or-query, target) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeStatus {
    Success,
    Failure,
    /// Target not invoked (no credentials)
    Skipped,
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "SUCCESS",
            OutcomeStatus::Failure => "FAILURE",
            OutcomeStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle of one dispatched unit.
///
/// `Pending -> InFlight -> {Success | Failure | Skipped}`. Retries stay
/// inside `InFlight`; a terminal state is never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    Pending,
    InFlight,
    Success,
    Failure,
    Skipped,
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnitState::Success | UnitState::Failure | UnitState::Skipped
        )
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: UnitState) -> bool {
        match (self, next) {
            (UnitState::Pending, UnitState::InFlight) => true,
            // Skips and batch timeouts resolve straight from Pending
            (UnitState::Pending, UnitState::Skipped | UnitState::Failure) => true,
            (UnitState::InFlight, s) => s.is_terminal(),
            _ => false,
        }
    }
}

impl From<OutcomeStatus> for UnitState {
    fn from(status: OutcomeStatus) -> Self {
        match status {
            OutcomeStatus::Success => UnitState::Success,
            OutcomeStatus::Failure => UnitState::Failure,
            OutcomeStatus::Skipped => UnitState::Skipped,
        }
    }
}

/// Terminal result of dispatching one instruction (or query) to one target.
///
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub target_name: String,
    /// `None` for queries
    pub instruction: Option<Instruction>,
    pub status: OutcomeStatus,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_payload: Option<Value>,
    /// Adapter calls made, retries included (0 when never invoked)
    pub attempts: u32,
}

impl Outcome {
    pub fn success(
        target_name: impl Into<String>,
        instruction: Option<Instruction>,
        detail: impl Into<String>,
        raw_payload: Option<Value>,
        attempts: u32,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            instruction,
            status: OutcomeStatus::Success,
            detail: detail.into(),
            raw_payload,
            attempts,
        }
    }

    pub fn failure(
        target_name: impl Into<String>,
        instruction: Option<Instruction>,
        detail: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            instruction,
            status: OutcomeStatus::Failure,
            detail: detail.into(),
            raw_payload: None,
            attempts,
        }
    }

    pub fn skipped(
        target_name: impl Into<String>,
        instruction: Option<Instruction>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            target_name: target_name.into(),
            instruction,
            status: OutcomeStatus::Skipped,
            detail: detail.into(),
            raw_payload: None,
            attempts: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    pub fn is_failure(&self) -> bool {
        self.status == OutcomeStatus::Failure
    }

    pub fn is_skipped(&self) -> bool {
        self.status == OutcomeStatus::Skipped
    }
}

/// `<status> <target>: <detail>`
impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.target_name, self.detail)
    }
}
