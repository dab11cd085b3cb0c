use serde::{Deserialize, Serialize};

use crate::ids::{RecordId, RunId};
use crate::outcomes::{ErrorEntry, ErrorLog, Outcome};
use crate::time::EpochSecs;
use crate::types::{Classification, RunPhase, TargetTransition};

/// One unit of work handed to the gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRequest {
    entity: String,
    record_id: RecordId,
    transition: TargetTransition,
}

impl TransitionRequest {
    pub fn new(entity: impl Into<String>, record_id: RecordId, transition: TargetTransition) -> Self {
        Self {
            entity: entity.into(),
            record_id,
            transition,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    pub fn transition(&self) -> TargetTransition {
        self.transition
    }
}

/// One execution of the engine over one identifier list.
///
/// Counters and output lists only change through the engine; callers get
/// read-only access once a run is handed back.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchRun {
    run_id: RunId,
    entity: String,
    transition: TargetTransition,
    total: usize,
    phase: RunPhase,
    processed_count: usize,
    success_count: usize,
    error_count: usize,
    success_ids: Vec<String>,
    error_log: ErrorLog,
    started_at_unix: EpochSecs,
    finished_at_unix: Option<EpochSecs>,
}

impl BatchRun {
    pub(crate) fn start(entity: &str, transition: TargetTransition, total: usize, now: EpochSecs) -> Self {
        Self {
            run_id: RunId::new(),
            entity: entity.to_string(),
            transition,
            total,
            phase: RunPhase::Running,
            processed_count: 0,
            success_count: 0,
            error_count: 0,
            success_ids: Vec::new(),
            error_log: ErrorLog::default(),
            started_at_unix: now,
            finished_at_unix: None,
        }
    }

    pub(crate) fn record(&mut self, outcome: Outcome, now: EpochSecs) {
        match outcome {
            Outcome::Succeeded { id } => {
                self.success_ids.push(id);
                self.success_count += 1;
            }
            Outcome::Failed { id, reason } => {
                self.error_log.push(ErrorEntry::new(id, &reason, now));
                self.error_count += 1;
            }
        }
        self.processed_count += 1;
    }

    pub(crate) fn complete(&mut self, now: EpochSecs) -> Result<(), String> {
        if self.processed_count != self.total {
            return Err(format!(
                "cannot complete with {} of {} records processed",
                self.processed_count, self.total
            ));
        }
        self.advance(RunPhase::Completed)?;
        self.finished_at_unix = Some(now);
        Ok(())
    }

    fn advance(&mut self, next: RunPhase) -> Result<(), String> {
        if !self.phase.can_advance_to(next) {
            return Err(format!("illegal phase change {:?} -> {:?}", self.phase, next));
        }
        self.phase = next;
        Ok(())
    }

    pub fn check_invariants(&self) -> Result<(), String> {
        if self.processed_count != self.success_count + self.error_count {
            return Err(format!(
                "processed={} but success={} error={}",
                self.processed_count, self.success_count, self.error_count
            ));
        }
        if self.processed_count > self.total {
            return Err(format!("processed={} exceeds total={}", self.processed_count, self.total));
        }
        if self.success_ids.len() != self.success_count {
            return Err(format!(
                "success list has {} entries, counter says {}",
                self.success_ids.len(),
                self.success_count
            ));
        }
        if self.error_log.len() != self.error_count {
            return Err(format!(
                "error log has {} entries, counter says {}",
                self.error_log.len(),
                self.error_count
            ));
        }
        Ok(())
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn transition(&self) -> TargetTransition {
        self.transition
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_completed(&self) -> bool {
        self.phase == RunPhase::Completed
    }

    pub fn processed_count(&self) -> usize {
        self.processed_count
    }

    pub fn success_count(&self) -> usize {
        self.success_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn success_ids(&self) -> &[String] {
        &self.success_ids
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.error_log
    }

    pub fn started_at_unix(&self) -> EpochSecs {
        self.started_at_unix
    }

    pub fn finished_at_unix(&self) -> Option<EpochSecs> {
        self.finished_at_unix
    }

    /// Derived from the final counters; `None` until the run completes.
    pub fn classification(&self) -> Option<Classification> {
        if !self.is_completed() {
            return None;
        }
        Classification::from_counts(self.success_count, self.error_count)
    }
}
