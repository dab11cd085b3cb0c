use bulkstate_core::{BatchRun, Classification, EpochSecs};
use serde::{Deserialize, Serialize};

/// Summary written next to the exported files.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    pub entity: String,
    pub state: u32,
    pub status: u32,
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub classification: Option<Classification>,
    pub started_at_unix: EpochSecs,
    pub finished_at_unix: Option<EpochSecs>,

    #[serde(default)]
    pub files: Vec<String>,
}

impl RunReport {
    pub fn from_run(run: &BatchRun) -> Self {
        let t = run.transition();
        Self {
            run_id: run.run_id().as_str().to_string(),
            entity: run.entity().to_string(),
            state: t.state,
            status: t.status,
            total: run.total(),
            success_count: run.success_count(),
            error_count: run.error_count(),
            classification: run.classification(),
            started_at_unix: run.started_at_unix(),
            finished_at_unix: run.finished_at_unix(),
            files: vec![],
        }
    }
}
