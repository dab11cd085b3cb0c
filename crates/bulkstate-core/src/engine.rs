use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use crate::errors::EngineError;
use crate::gateway::TransitionGateway;
use crate::ids::RecordId;
use crate::model::{BatchRun, TransitionRequest};
use crate::outcomes::Outcome;
use crate::progress::ProgressObserver;
use crate::time::{now_unix, EpochSecs};
use crate::types::{IdentifierSyntax, RunPhase, TargetTransition};
use crate::validate::{validate, BatchPlan};

pub const DEFAULT_CHUNK_SIZE: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    /// Progress checkpoint granularity. Has no effect on outcomes; 0 acts as 1.
    pub chunk_size: usize,
    pub identifier_syntax: IdentifierSyntax,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            identifier_syntax: IdentifierSyntax::Uuid,
        }
    }
}

/// Extra per-record check layered over the run's own counter invariants.
pub type RunCheck = fn(&BatchRun) -> Result<(), String>;

/// Applies one target transition to an ordered list of identifiers, one
/// record at a time. A record's failure is logged and the batch moves on.
pub struct BatchEngine {
    options: EngineOptions,
    clock: fn() -> EpochSecs,
    extra_check: Option<RunCheck>,
}

impl BatchEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options, clock: now_unix, extra_check: None }
    }

    pub fn with_clock(mut self, clock: fn() -> EpochSecs) -> Self {
        self.clock = clock;
        self
    }

    /// A failing check stops the run like a broken counter invariant does.
    pub fn with_check(mut self, check: RunCheck) -> Self {
        self.extra_check = Some(check);
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Validate, then run. On a validation failure the engine returns to idle
    /// without touching the gateway.
    pub fn submit(
        &self,
        gateway: &dyn TransitionGateway,
        entity: Option<&str>,
        transition: Option<TargetTransition>,
        identifiers: &[String],
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchRun, EngineError> {
        observer.on_phase(RunPhase::Validating);
        let plan = match validate(entity, transition, identifiers) {
            Ok(plan) => plan,
            Err(e) => {
                observer.on_phase(RunPhase::Idle);
                info!(error = %e, "batch rejected by validation");
                return Err(e.into());
            }
        };
        self.run(gateway, &plan, observer)
    }

    pub fn run(
        &self,
        gateway: &dyn TransitionGateway,
        plan: &BatchPlan,
        observer: &mut dyn ProgressObserver,
    ) -> Result<BatchRun, EngineError> {
        let total = plan.identifiers().len();
        let chunk_size = self.options.chunk_size.max(1);
        let mut run = BatchRun::start(plan.entity(), plan.transition(), total, (self.clock)());
        observer.on_phase(RunPhase::Running);
        info!(
            run_id = run.run_id().as_str(),
            entity = plan.entity(),
            state = plan.transition().state,
            status = plan.transition().status,
            total,
            "batch run started"
        );

        for (chunk_index, chunk) in plan.identifiers().chunks(chunk_size).enumerate() {
            for raw in chunk {
                let outcome = self.apply_one(gateway, plan, raw);
                match &outcome {
                    Outcome::Succeeded { id } => debug!(record = %id, "transition applied"),
                    Outcome::Failed { id, reason } => warn!(record = %id, %reason, "transition failed"),
                }
                run.record(outcome, (self.clock)());
                if let Err(detail) = self.check(&run) {
                    error!(run_id = run.run_id().as_str(), %detail, "aborting batch run");
                    return Err(EngineError::InvariantViolated { detail, partial: Box::new(run) });
                }
                observer.on_progress(run.processed_count(), total);
            }
            debug!(chunk_index, processed = run.processed_count(), total, "chunk checkpoint");
            observer.on_checkpoint(chunk_index, run.processed_count(), total);
        }

        if let Err(detail) = run.complete((self.clock)()) {
            error!(run_id = run.run_id().as_str(), %detail, "aborting batch run");
            return Err(EngineError::InvariantViolated { detail, partial: Box::new(run) });
        }
        observer.on_phase(RunPhase::Completed);
        info!(
            run_id = run.run_id().as_str(),
            succeeded = run.success_count(),
            failed = run.error_count(),
            classification = ?run.classification(),
            "batch run completed"
        );
        Ok(run)
    }

    fn check(&self, run: &BatchRun) -> Result<(), String> {
        run.check_invariants()?;
        match self.extra_check {
            Some(check) => check(run),
            None => Ok(()),
        }
    }

    fn apply_one(&self, gateway: &dyn TransitionGateway, plan: &BatchPlan, raw: &str) -> Outcome {
        let record_id = match RecordId::parse(raw, self.options.identifier_syntax) {
            Ok(id) => id,
            Err(e) => {
                return Outcome::Failed {
                    id: raw.to_string(),
                    reason: e.to_string(),
                }
            }
        };
        let request = TransitionRequest::new(plan.entity(), record_id, plan.transition());
        match panic::catch_unwind(AssertUnwindSafe(|| gateway.apply_transition(&request))) {
            Ok(Ok(())) => Outcome::Succeeded { id: raw.to_string() },
            Ok(Err(e)) => Outcome::Failed {
                id: raw.to_string(),
                reason: e.to_string(),
            },
            Err(payload) => Outcome::Failed {
                id: raw.to_string(),
                reason: format!("gateway panicked: {}", panic_message(payload.as_ref())),
            },
        }
    }
}

impl Default for BatchEngine {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
