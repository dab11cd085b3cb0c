use std::path::PathBuf;

use anyhow::{bail, Result};
use bulkstate_core::BatchRun;
use bulkstate_dataset::TabularDataset;
use tracing::info;

use crate::report::RunReport;
use crate::sink::ExportSink;

pub const SUCCESS_ROWS_FILE: &str = "successful_records.json";
pub const ERROR_LOG_FILE: &str = "errors.log";
pub const REPORT_FILE: &str = "report.json";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportedFiles {
    pub success_rows: Option<PathBuf>,
    pub error_log: Option<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Re-projects full dataset rows for succeeded identifiers: for each id, the
/// first row whose `column` cell matches. Ids with no matching row are skipped.
pub fn success_rows(dataset: &TabularDataset, column: &str, success_ids: &[String]) -> Result<TabularDataset> {
    let mut rows = Vec::with_capacity(success_ids.len());
    for id in success_ids {
        if let Some(row) = dataset.find_row(column, id)? {
            rows.push(row.to_vec());
        }
    }
    Ok(TabularDataset::new(dataset.columns().to_vec(), rows)?)
}

pub struct ResultExporter<'a> {
    sink: &'a dyn ExportSink,
}

impl<'a> ResultExporter<'a> {
    pub fn new(sink: &'a dyn ExportSink) -> Self {
        Self { sink }
    }

    /// Writes whatever the run's classification offers, plus a report.
    pub fn export(&self, run: &BatchRun, dataset: &TabularDataset, column: &str) -> Result<ExportedFiles> {
        let Some(classification) = run.classification() else {
            bail!("run {} has not completed; nothing to export", run.run_id().as_str());
        };
        let offer = classification.export_offer();
        let mut files = ExportedFiles::default();
        let mut report = RunReport::from_run(run);

        if offer.success_rows {
            let rows = success_rows(dataset, column, run.success_ids())?;
            files.success_rows = Some(self.sink.write_bytes(SUCCESS_ROWS_FILE, &rows.to_json_bytes()?)?);
            report.files.push(SUCCESS_ROWS_FILE.to_string());
        }
        if offer.error_log {
            files.error_log = Some(self.sink.write_bytes(ERROR_LOG_FILE, run.error_log().render().as_bytes())?);
            report.files.push(ERROR_LOG_FILE.to_string());
        }
        report.files.push(REPORT_FILE.to_string());
        files.report = Some(self.sink.write_bytes(REPORT_FILE, &serde_json::to_vec_pretty(&report)?)?);

        info!(
            run_id = run.run_id().as_str(),
            success_rows = files.success_rows.is_some(),
            error_log = files.error_log.is_some(),
            "exported run results"
        );
        Ok(files)
    }
}
