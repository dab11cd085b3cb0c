use serde::{Deserialize, Serialize};

/// The (state, status-reason) pair applied to every record of a batch.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TargetTransition {
    pub state: u32,
    pub status: u32,
}

impl TargetTransition {
    pub fn new(state: u32, status: u32) -> Self {
        Self { state, status }
    }

    /// Both halves must be chosen; there is no default for either.
    pub fn from_parts(state: Option<u32>, status: Option<u32>) -> Option<Self> {
        match (state, status) {
            (Some(state), Some(status)) => Some(Self { state, status }),
            _ => None,
        }
    }
}

/// Which tokens count as syntactically valid record identifiers.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierSyntax {
    /// Hyphenated, simple, braced or urn UUID forms.
    #[default]
    Uuid,
    /// Any non-blank token; the gateway decides.
    Opaque,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Validating,
    Running,
    Completed,
}

impl RunPhase {
    /// Legal edges: Idle -> Validating -> (Idle | Running), Running -> Completed.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (RunPhase::Idle, RunPhase::Validating)
                | (RunPhase::Validating, RunPhase::Idle)
                | (RunPhase::Validating, RunPhase::Running)
                | (RunPhase::Running, RunPhase::Completed)
        )
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Classification {
    AllSucceeded,
    PartialSuccess,
    AllFailed,
}
