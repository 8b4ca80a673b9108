use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "medarc";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// File names created inside the output directory.
pub const LOG_FILE: &str = "log.txt";
pub const ERR_FILE: &str = "err.txt";
pub const REPORT_JSON_FILE: &str = "run_report.json";
pub const CSV_FILE: &str = "csv_file.csv";
pub const PROCESSED_LEDGER_FILE: &str = "processed.txt";

/// Windows thumbnail cache files are never clinical documents.
pub const CACHE_FILE_NAME: &str = "Thumbs.db";

pub fn default_log_filter() -> String {
    format!("{}=info", APP_NAME)
}

/// Fallback output location when none is given: ~/medarc-output
pub fn default_output_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("medarc-output")
}

/// Which filesystem timestamp counts as a document's acquisition time.
/// Fixed for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TimeOrder {
    #[default]
    Creation,
    Modification,
}

/// Everything a migration run needs to know. Paths are absolutized against
/// the current working directory; report files default to the output folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub time_order: TimeOrder,
    pub log_path: PathBuf,
    pub err_path: PathBuf,
    pub report_json_path: PathBuf,
    /// Append-only ledger of already-converted source paths; survives runs.
    pub ledger_path: PathBuf,
    /// External office-document renderer invoked for word-processor,
    /// spreadsheet and presentation formats.
    pub office_program: PathBuf,
    pub office_timeout_secs: u64,
}

impl MigrationConfig {
    pub fn new(input_dir: PathBuf, output_dir: PathBuf) -> Self {
        let input_dir = absolutize(input_dir);
        let output_dir = absolutize(output_dir);
        Self {
            log_path: output_dir.join(LOG_FILE),
            err_path: output_dir.join(ERR_FILE),
            report_json_path: output_dir.join(REPORT_JSON_FILE),
            ledger_path: output_dir.join(PROCESSED_LEDGER_FILE),
            office_program: PathBuf::from("soffice"),
            office_timeout_secs: 120,
            time_order: TimeOrder::default(),
            input_dir,
            output_dir,
        }
    }

    pub fn with_time_order(mut self, time_order: TimeOrder) -> Self {
        self.time_order = time_order;
        self
    }

    pub fn with_log_path(mut self, path: PathBuf) -> Self {
        self.log_path = absolutize(path);
        self
    }

    pub fn with_err_path(mut self, path: PathBuf) -> Self {
        self.err_path = absolutize(path);
        self
    }

    pub fn with_office_program(mut self, program: PathBuf) -> Self {
        self.office_program = program;
        self
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir.join(CSV_FILE)
    }
}

fn absolutize(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    }
}

/// True for files excluded from processing and from the upfront total.
pub fn is_cache_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n == CACHE_FILE_NAME)
        .unwrap_or(false)
}
