use std::path::Path;
use std::sync::Arc;

use bulkstate_core::{BatchEngine, BatchRun, Classification, EngineOptions, GatewayError, ValidationError};
use bulkstate_gateway::{OptionEntry, ScriptedGateway, StaticCatalog, StatusOption, TransitionCatalog};
use bulkstate_runner::{
    Config, JobRequest, RowSelection, Runner, PARTIAL_ERRORS_FILE, PARTIAL_SUCCESS_IDS_FILE,
};
use tempfile::tempdir;

const A: &str = "0b7f4a52-0e6c-4a8e-9d1e-6f2b3c4d5e60";
const B: &str = "1c8e5b63-1f7d-4b9f-8e2f-7a3c4d5e6f71";
const C: &str = "2d9f6c74-2a8e-4caf-9f3a-8b4d5e6f7a82";

fn write_dataset(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("contacts.json");
    let doc = serde_json::json!({
        "columns": ["contactid", "fullname"],
        "rows": [
            [A, "Ann"],
            ["", "No id"],
            [B, "Bob"],
            ["", ""],
            ["not-a-guid", "Broken"],
            [C, "Cy"]
        ]
    });
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();
    path
}

fn catalog() -> Arc<dyn TransitionCatalog> {
    Arc::new(StaticCatalog::new().with_entity(
        "contact",
        vec![
            OptionEntry { value: 0, label: "Active".into() },
            OptionEntry { value: 1, label: "Inactive".into() },
        ],
        vec![
            StatusOption { state: 0, value: 1, label: "Active".into() },
            StatusOption { state: 1, value: 2, label: "Inactive".into() },
        ],
    ))
}

fn runner(root: &Path, gw: Arc<ScriptedGateway>) -> Runner {
    let mut cfg = Config::default_config();
    cfg.export.dir = root.join("exports").to_string_lossy().to_string();
    Runner::with_parts(cfg, gw, Some(catalog()))
}

fn job(dataset: std::path::PathBuf, rows: RowSelection) -> JobRequest {
    JobRequest {
        dataset,
        column: "contactid".into(),
        entity: Some("contact".into()),
        state: Some(1),
        status: Some(2),
        rows,
    }
}

#[test]
fn select_all_runs_and_exports() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new().fail(B, GatewayError::Rejected("locked record".into())));
    let r = runner(dir.path(), gw.clone());

    let summary = r.execute(&job(dataset, RowSelection::All)).unwrap();
    let run = &summary.run;
    // blank-row dropped at load, empty id skipped at selection
    assert_eq!(run.total(), 4);
    assert_eq!(gw.call_count(), 3);
    assert_eq!(run.success_ids(), &[A.to_string(), C.to_string()]);
    let pairs = run.error_log().pairs();
    assert_eq!(pairs[0], (B, "locked record"));
    assert_eq!(pairs[1].0, "not-a-guid");
    assert_eq!(run.classification(), Some(Classification::PartialSuccess));

    let rows: serde_json::Value =
        serde_json::from_slice(&std::fs::read(summary.files.success_rows.unwrap()).unwrap()).unwrap();
    assert_eq!(rows["rows"][1][1], "Cy");
    let log = std::fs::read_to_string(summary.files.error_log.unwrap()).unwrap();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains(&format!("Error processing record {}: locked record", B)));
}

#[test]
fn explicit_rows_keep_dataset_order() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new());
    let r = runner(dir.path(), gw.clone());

    // indices after blank-row filtering: 0=A, 1=no id, 2=B, 3=broken, 4=C
    let summary = r.execute(&job(dataset, RowSelection::Rows(vec![4, 0]))).unwrap();
    assert_eq!(summary.run.success_ids(), &[A.to_string(), C.to_string()]);
    assert_eq!(summary.run.classification(), Some(Classification::AllSucceeded));
    assert!(summary.files.error_log.is_none());
}

#[test]
fn selection_with_only_empty_ids_is_empty_selection() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new());
    let r = runner(dir.path(), gw.clone());

    let err = r.execute(&job(dataset, RowSelection::Rows(vec![1]))).unwrap_err();
    assert_eq!(err.downcast_ref::<ValidationError>(), Some(&ValidationError::EmptySelection));
    assert_eq!(gw.call_count(), 0);
}

#[test]
fn missing_entity_and_transition_are_validation_errors() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new());
    let r = runner(dir.path(), gw.clone());

    let mut j = job(dataset.clone(), RowSelection::All);
    j.entity = None;
    let err = r.execute(&j).unwrap_err();
    assert_eq!(err.downcast_ref::<ValidationError>(), Some(&ValidationError::MissingEntity));

    let mut j = job(dataset, RowSelection::All);
    j.status = None;
    let err = r.execute(&j).unwrap_err();
    assert_eq!(err.downcast_ref::<ValidationError>(), Some(&ValidationError::MissingTransition));
    assert_eq!(gw.call_count(), 0);
}

#[test]
fn catalog_refuses_unknown_transition() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new());
    let r = runner(dir.path(), gw.clone());

    let mut j = job(dataset, RowSelection::All);
    j.status = Some(1);
    let err = r.execute(&j).unwrap_err();
    assert!(err.to_string().contains("does not support state 1 with status 1"));
    assert_eq!(gw.call_count(), 0);
}

#[test]
fn unknown_column_fails_before_running() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new());
    let r = runner(dir.path(), gw.clone());

    let mut j = job(dataset, RowSelection::All);
    j.column = "accountid".into();
    assert!(r.execute(&j).is_err());
    assert_eq!(gw.call_count(), 0);
}

#[test]
fn dry_run_writes_default_config_and_has_no_catalog() {
    let dir = tempdir().unwrap();
    let r = Runner::open_dry_run(dir.path()).unwrap();
    assert!(Config::config_path(dir.path()).exists());
    assert!(r.catalog().is_err());
}

fn stop_after_two(run: &BatchRun) -> Result<(), String> {
    if run.processed_count() >= 2 {
        return Err(format!("stopped at {}", run.processed_count()));
    }
    Ok(())
}

fn stopping_engine() -> BatchEngine {
    BatchEngine::new(EngineOptions::default()).with_check(stop_after_two)
}

#[test]
fn aborted_run_flushes_partial_results() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let gw = Arc::new(ScriptedGateway::new().fail(B, GatewayError::Rejected("locked record".into())));
    let r = runner(dir.path(), gw.clone()).with_engine(stopping_engine());

    let err = r.execute(&job(dataset, RowSelection::All)).unwrap_err();
    assert_eq!(err.to_string(), "batch run aborted: stopped at 2");
    assert_eq!(gw.call_count(), 2);

    let run_dirs: Vec<_> = std::fs::read_dir(dir.path().join("exports"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(run_dirs.len(), 1);
    let run_dir = &run_dirs[0];

    let log = std::fs::read_to_string(run_dir.join(PARTIAL_ERRORS_FILE)).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains(&format!("Error processing record {}: locked record", B)));
    let ids: Vec<String> = serde_json::from_slice(&std::fs::read(run_dir.join(PARTIAL_SUCCESS_IDS_FILE)).unwrap()).unwrap();
    assert_eq!(ids, vec![A.to_string()]);
    assert!(!run_dir.join("report.json").exists());
}

#[test]
fn failed_flush_is_attached_to_the_abort_error() {
    let dir = tempdir().unwrap();
    let dataset = write_dataset(dir.path());
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let mut cfg = Config::default_config();
    cfg.export.dir = blocker.to_string_lossy().to_string();
    let r = Runner::with_parts(cfg, Arc::new(ScriptedGateway::new()), Some(catalog())).with_engine(stopping_engine());

    let err = r.execute(&job(dataset, RowSelection::All)).unwrap_err();
    assert_eq!(err.to_string(), "batch run aborted: stopped at 2; partial results not saved");
    let chain = format!("{:#}", err);
    assert!(chain.contains("create export dir"), "{}", chain);
}
