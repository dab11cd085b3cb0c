use thiserror::Error;

use crate::model::BatchRun;

/// Precondition failures. Raised before any remote call; nothing has run.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no entity logical name selected")]
    MissingEntity,
    #[error("state and status must both be selected")]
    MissingTransition,
    #[error("no records selected")]
    EmptySelection,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("malformed identifier {raw:?}: {reason}")]
pub struct MalformedIdentifier {
    pub raw: String,
    pub reason: String,
}

/// Failure reported by a gateway for one record. The text is opaque to the engine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("{0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The only error that stops a run in flight. `partial` holds every outcome recorded so far.
    #[error("batch engine invariant violated: {detail}")]
    InvariantViolated { detail: String, partial: Box<BatchRun> },
}
