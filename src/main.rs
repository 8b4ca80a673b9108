//! medarc CLI: batch migration of clinical document folders.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use medarc::config::{self, MigrationConfig, TimeOrder};
use medarc::convert::{Converter, OfficeRenderer};
use medarc::pipeline::runner::Migrator;
use medarc::pipeline::MigrateError;

#[derive(Parser)]
#[command(
    name = "medarc",
    version,
    about = "Migrates per-patient clinical document folders into merged PDF archives"
)]
struct Cli {
    /// Root of the source document tree.
    #[arg(long)]
    input: PathBuf,

    /// Where merged archives, sidecars and reports are written.
    /// Defaults to ~/medarc-output.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Which filesystem timestamp orders a patient's documents.
    #[arg(long, value_enum, default_value_t = TimeOrder::Creation)]
    time: TimeOrder,

    /// Run log path (defaults to <output>/log.txt).
    #[arg(long)]
    log: Option<PathBuf>,

    /// Error detail path (defaults to <output>/err.txt).
    #[arg(long)]
    err: Option<PathBuf>,

    /// External office renderer binary for word-processor, spreadsheet and
    /// presentation sources.
    #[arg(long)]
    office_renderer: Option<PathBuf>,

    /// Only export the patient identity CSV; convert nothing.
    #[arg(long)]
    extract_csv: bool,

    /// Only list detected patient folders into the log file; convert nothing.
    #[arg(long)]
    extract_patients: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "migration failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<(), MigrateError> {
    let output = cli.output.unwrap_or_else(config::default_output_dir);
    let mut config = MigrationConfig::new(cli.input, output).with_time_order(cli.time);
    if let Some(log) = cli.log {
        config = config.with_log_path(log);
    }
    if let Some(err) = cli.err {
        config = config.with_err_path(err);
    }
    if let Some(program) = cli.office_renderer {
        config = config.with_office_program(program);
    }

    let office = OfficeRenderer::new(
        config.office_program.clone(),
        Duration::from_secs(config.office_timeout_secs),
    );
    let migrator = Migrator::new(config, Converter { office })?;

    if cli.extract_patients {
        let found = migrator.list_patient_folders()?;
        tracing::info!(found, log = %migrator.config().log_path.display(), "patient folders listed");
    } else if cli.extract_csv {
        let csv = migrator.export_csv()?;
        tracing::info!(csv = %csv.display(), "patient identity table written");
    } else {
        let report = migrator.run()?;
        tracing::info!(
            converted = report.converted,
            failed = report.failures.len(),
            ignored = report.ignored.len(),
            "done; see the log and error reports for details"
        );
    }
    Ok(())
}
