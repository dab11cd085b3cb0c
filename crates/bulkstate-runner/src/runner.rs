use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use bulkstate_core::{validate, BatchEngine, BatchRun, EngineError, TargetTransition, TransitionGateway};
use bulkstate_dataset::{load_dataset, SelectionSet, TabularDataset};
use bulkstate_export::{ExportSink, ExportedFiles, FsExportSink, ResultExporter};
use bulkstate_gateway::{DryRunGateway, TransitionCatalog};
use bulkstate_gateway_http::HttpGateway;
use tracing::{error, info};

use crate::{Config, TracingProgress};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSelection {
    All,
    /// 0-based indices into the dataset after blank rows were dropped.
    Rows(Vec<usize>),
}

#[derive(Clone, Debug)]
pub struct JobRequest {
    pub dataset: PathBuf,
    pub column: String,
    pub entity: Option<String>,
    pub state: Option<u32>,
    pub status: Option<u32>,
    pub rows: RowSelection,
}

#[derive(Debug)]
pub struct JobSummary {
    pub run: BatchRun,
    pub files: ExportedFiles,
}

pub const PARTIAL_ERRORS_FILE: &str = "partial_errors.log";
pub const PARTIAL_SUCCESS_IDS_FILE: &str = "partial_success_ids.json";

pub struct Runner {
    pub cfg: Config,
    engine: BatchEngine,
    gateway: Arc<dyn TransitionGateway>,
    catalog: Option<Arc<dyn TransitionCatalog>>,
    sink: FsExportSink,
}

impl Runner {
    /// Loads (or creates) the config under `root` and connects to the remote service.
    pub fn open(root: &Path) -> Result<Self> {
        let cfg = Self::load_or_init_config(root)?;
        let http = Arc::new(HttpGateway::new(cfg.http_gateway_config()?)?);
        let catalog: Arc<dyn TransitionCatalog> = http.clone();
        Ok(Self::with_parts(cfg, http, Some(catalog)))
    }

    /// Same wiring, but every well-formed record is accepted locally and no
    /// catalog is consulted.
    pub fn open_dry_run(root: &Path) -> Result<Self> {
        let cfg = Self::load_or_init_config(root)?;
        Ok(Self::with_parts(cfg, Arc::new(DryRunGateway), None))
    }

    pub fn with_parts(
        cfg: Config,
        gateway: Arc<dyn TransitionGateway>,
        catalog: Option<Arc<dyn TransitionCatalog>>,
    ) -> Self {
        let sink = FsExportSink::new(cfg.export_dir());
        let engine = BatchEngine::new(cfg.engine_options());
        Self { cfg, engine, gateway, catalog, sink }
    }

    /// Replaces the engine built from `[engine]` config.
    pub fn with_engine(mut self, engine: BatchEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn init(root: &Path) -> Result<PathBuf> {
        let cfg_path = Config::config_path(root);
        if !cfg_path.exists() {
            Config::default_config().save_to(&cfg_path)?;
        }
        Ok(cfg_path)
    }

    fn load_or_init_config(root: &Path) -> Result<Config> {
        let cfg_path = Config::config_path(root);
        if cfg_path.exists() {
            Config::load_from(&cfg_path)
        } else {
            let cfg = Config::default_config();
            cfg.save_to(&cfg_path)?;
            Ok(cfg)
        }
    }

    pub fn catalog(&self) -> Result<&dyn TransitionCatalog> {
        self.catalog
            .as_deref()
            .ok_or_else(|| anyhow!("no transition catalog available (dry run?)"))
    }

    /// Load, select, validate, run, export.
    pub fn execute(&self, job: &JobRequest) -> Result<JobSummary> {
        let dataset = load_dataset(&job.dataset).with_context(|| format!("load {}", job.dataset.display()))?;
        let identifiers = select_identifiers(&dataset, &job.column, &job.rows)?;
        info!(rows = dataset.len(), selected = identifiers.len(), column = %job.column, "selection projected");

        let transition = TargetTransition::from_parts(job.state, job.status);
        let plan = validate(job.entity.as_deref(), transition, &identifiers)?;

        if self.cfg.engine.verify_transition {
            if let Some(catalog) = &self.catalog {
                let ok = catalog
                    .is_valid(plan.entity(), plan.transition())
                    .with_context(|| format!("check transition for {}", plan.entity()))?;
                if !ok {
                    bail!(
                        "{} does not support state {} with status {}",
                        plan.entity(),
                        plan.transition().state,
                        plan.transition().status
                    );
                }
            }
        }

        let mut progress = TracingProgress;
        let run = match self.engine.run(&*self.gateway, &plan, &mut progress) {
            Ok(run) => run,
            Err(EngineError::InvariantViolated { detail, partial }) => {
                return Err(match self.flush_partial(&partial) {
                    Ok(dir) => {
                        error!(%detail, dir = %dir.display(), "batch run aborted; partial results flushed");
                        anyhow!("batch run aborted: {}", detail)
                    }
                    Err(flush_err) => {
                        error!(%detail, error = %flush_err, "batch run aborted; flushing partial results failed");
                        flush_err.context(format!("batch run aborted: {}; partial results not saved", detail))
                    }
                });
            }
            Err(e) => return Err(e.into()),
        };

        let sink = self.sink.for_run(run.run_id().as_str())?;
        let files = ResultExporter::new(&sink).export(&run, &dataset, &job.column)?;
        Ok(JobSummary { run, files })
    }

    /// Writes whatever an aborted run had recorded. Returns the run's export dir.
    fn flush_partial(&self, run: &BatchRun) -> Result<PathBuf> {
        let sink = self.sink.for_run(run.run_id().as_str())?;
        sink.write_bytes(PARTIAL_ERRORS_FILE, run.error_log().render().as_bytes())?;
        sink.write_bytes(PARTIAL_SUCCESS_IDS_FILE, &serde_json::to_vec_pretty(run.success_ids())?)?;
        Ok(sink.root)
    }
}

pub fn select_identifiers(dataset: &TabularDataset, column: &str, rows: &RowSelection) -> Result<Vec<String>> {
    let mut selection = SelectionSet::for_dataset(dataset);
    match rows {
        RowSelection::All => selection.select_all(),
        RowSelection::Rows(rows) => {
            for row in rows {
                selection.mark(*row)?;
            }
        }
    }
    Ok(selection.identifiers(dataset, column)?)
}
