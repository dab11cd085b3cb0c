use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bulkstate_core::Classification;
use bulkstate_runner::{JobRequest, RowSelection, Runner};

#[derive(Parser)]
#[command(name = "bulkstate", version, about = "Apply a state/status change to records listed in a table")]
struct Cli {
    /// Directory holding .bulkstate/ (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default .bulkstate/bulkstate.toml
    Init,

    /// Show the columns and row count of a dataset file
    Inspect {
        #[arg(long)]
        file: PathBuf,
    },

    /// List entity logical names known to the remote service
    Entities,

    /// List states of an entity, or status reasons for one state
    Statuses {
        #[arg(long)]
        entity: String,
        #[arg(long)]
        state: Option<u32>,
    },

    /// Apply one state/status transition to the selected rows
    Run {
        #[arg(long)]
        file: PathBuf,
        /// Column holding the record identifiers
        #[arg(long)]
        column: String,
        #[arg(long)]
        entity: Option<String>,
        #[arg(long)]
        state: Option<u32>,
        #[arg(long)]
        status: Option<u32>,
        /// Row index to select (0-based, repeatable)
        #[arg(long = "row")]
        rows: Vec<usize>,
        /// Select every row
        #[arg(long, conflicts_with = "rows")]
        all: bool,
        /// Accept every well-formed record without contacting the service
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.cmd {
        Command::Init => {
            let path = Runner::init(&root)?;
            println!("Wrote {}", path.display());
        }
        Command::Inspect { file } => {
            let ds = bulkstate_dataset::load_dataset(&file)?;
            println!("Columns: {}", ds.columns().join(", "));
            println!("Rows: {}", ds.len());
        }
        Command::Entities => {
            let r = Runner::open(&root)?;
            for name in r.catalog()?.entities()? {
                println!("{}", name);
            }
        }
        Command::Statuses { entity, state } => {
            let r = Runner::open(&root)?;
            let catalog = r.catalog()?;
            let options = match state {
                Some(state) => catalog.status_options(&entity, state)?,
                None => catalog.state_options(&entity)?,
            };
            for o in options {
                println!("{}", o);
            }
        }
        Command::Run { file, column, entity, state, status, rows, all, dry_run } => {
            let r = if dry_run { Runner::open_dry_run(&root)? } else { Runner::open(&root)? };
            let selection = if all { RowSelection::All } else { RowSelection::Rows(rows) };
            info!(file = %file.display(), dry_run, "starting run");
            let summary = r.execute(&JobRequest { dataset: file, column, entity, state, status, rows: selection })?;
            let run = &summary.run;

            println!("Run {}", run.run_id().as_str());
            println!("Succeeded: {}", run.success_count());
            println!("Failed: {}", run.error_count());
            match run.classification() {
                Some(Classification::AllSucceeded) => println!("All records processed successfully."),
                Some(Classification::PartialSuccess) => {
                    println!("{} record(s) failed. Check the error log for details.", run.error_count())
                }
                Some(Classification::AllFailed) => println!("Every record failed. Check the error log for details."),
                None => {}
            }
            if let Some(p) = &summary.files.success_rows {
                println!("Successful records: {}", p.display());
            }
            if let Some(p) = &summary.files.error_log {
                println!("Error log: {}", p.display());
            }
        }
    }

    Ok(())
}
