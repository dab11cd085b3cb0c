use bulkstate_core::{ProgressObserver, RunPhase};
use tracing::{debug, info};

/// Progress observer that writes to the tracing subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn on_progress(&mut self, processed: usize, total: usize) {
        debug!("{}/{}", processed, total);
    }

    fn on_checkpoint(&mut self, chunk_index: usize, processed: usize, total: usize) {
        info!(chunk = chunk_index, "progress {}/{}", processed, total);
    }

    fn on_phase(&mut self, phase: RunPhase) {
        debug!(?phase, "run phase");
    }
}
