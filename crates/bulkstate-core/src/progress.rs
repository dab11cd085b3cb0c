use crate::types::RunPhase;

/// Receives progress from a running batch. Notifications arrive in input
/// order, at most once per record, after that record's outcome is final.
pub trait ProgressObserver {
    fn on_progress(&mut self, processed: usize, total: usize);

    /// Called on every lifecycle change, including the pre-run
    /// Validating and back-to-Idle steps that never produce a run.
    fn on_phase(&mut self, _phase: RunPhase) {}

    /// Called after each chunk of records. Chunks are reporting checkpoints only.
    fn on_checkpoint(&mut self, _chunk_index: usize, _processed: usize, _total: usize) {}
}

/// Discards all notifications.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _processed: usize, _total: usize) {}
}

/// Keeps every notification, for tests and post-run inspection.
#[derive(Clone, Debug, Default)]
pub struct RecordingProgress {
    pub events: Vec<(usize, usize)>,
    pub checkpoints: Vec<(usize, usize)>,
    pub phases: Vec<RunPhase>,
}

impl ProgressObserver for RecordingProgress {
    fn on_progress(&mut self, processed: usize, total: usize) {
        self.events.push((processed, total));
    }

    fn on_checkpoint(&mut self, chunk_index: usize, processed: usize, _total: usize) {
        self.checkpoints.push((chunk_index, processed));
    }

    fn on_phase(&mut self, phase: RunPhase) {
        self.phases.push(phase);
    }
}
