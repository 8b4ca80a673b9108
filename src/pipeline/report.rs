//! Run reporting: the human-readable log, the error detail file and a
//! structured JSON dump of the same numbers.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::MigrationConfig;

use super::MigrateError;

/// A file that could not be converted (or a scope that could not be merged).
#[derive(Debug, Clone, Serialize)]
pub struct FailureRecord {
    pub source_path: PathBuf,
    pub error: String,
}

/// A file outside every patient scope; never converted.
#[derive(Debug, Clone, Serialize)]
pub struct IgnoredFile {
    pub path: PathBuf,
    /// Leaf name of the folder it was found in.
    pub folder: String,
}

/// Everything one migration run counted, flushed at run end.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub total_files: usize,
    pub converted: usize,
    pub previously_processed: usize,
    pub ignored: Vec<IgnoredFile>,
    pub failures: Vec<FailureRecord>,
    pub merge_failures: Vec<FailureRecord>,
}

impl RunReport {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    pub fn record_ignored(&mut self, path: PathBuf, folder: String) {
        self.ignored.push(IgnoredFile { path, folder });
    }

    pub fn record_failure(&mut self, source_path: PathBuf, error: String) {
        self.failures.push(FailureRecord { source_path, error });
    }

    pub fn record_merge_failure(&mut self, scope_root: PathBuf, error: String) {
        self.merge_failures
            .push(FailureRecord { source_path: scope_root, error });
    }

    /// Write log, error detail file and JSON report. Unrecoverable I/O here
    /// is the one thing that fails the run.
    pub fn flush(&self, config: &MigrationConfig) -> Result<(), MigrateError> {
        write_with_parents(&config.log_path, &self.render_log())?;
        write_with_parents(&config.err_path, &self.render_errors())?;
        let json = serde_json::to_string_pretty(self)?;
        write_with_parents(&config.report_json_path, &json)?;
        Ok(())
    }

    fn render_log(&self) -> String {
        let mut out = String::new();
        if self.previously_processed > 0 {
            let _ = writeln!(
                out,
                "{} files were skipped because an earlier run already converted them.\n",
                self.previously_processed
            );
        }
        if !self.ignored.is_empty() {
            let _ = writeln!(
                out,
                "The following {} files out of the total {} files have been ignored since the patient folder was missing the id number:\n",
                self.ignored.len(),
                self.total_files
            );
            for file in &self.ignored {
                let _ = writeln!(out, "Folder: {}\nPath: {}\n", file.folder, file.path.display());
            }
        }
        if !self.failures.is_empty() {
            let _ = writeln!(
                out,
                "It was not possible to convert the following {} files:\n",
                self.failures.len()
            );
            for failure in &self.failures {
                let _ = writeln!(
                    out,
                    "Error: {}\nPath: {}\n",
                    failure.error,
                    failure.source_path.display()
                );
            }
        }
        if !self.merge_failures.is_empty() {
            let _ = writeln!(
                out,
                "The merge failed for the following {} patient folders:\n",
                self.merge_failures.len()
            );
            for failure in &self.merge_failures {
                let _ = writeln!(
                    out,
                    "Error: {}\nPatient folder: {}\n",
                    failure.error,
                    failure.source_path.display()
                );
            }
        }
        if self.ignored.is_empty() && self.failures.is_empty() && self.merge_failures.is_empty() {
            let _ = writeln!(
                out,
                "All the {} files have been successfully converted.",
                self.converted
            );
        } else {
            let _ = writeln!(out, "{} files have been successfully converted.", self.converted);
        }
        out
    }

    fn render_errors(&self) -> String {
        let mut out = String::new();
        for failure in self.failures.iter().chain(self.merge_failures.iter()) {
            let _ = writeln!(out, "{}: {}\n\n", failure.source_path.display(), failure.error);
        }
        out
    }
}

fn write_with_parents(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_run_log_reports_full_success() {
        let mut report = RunReport::new(3);
        report.converted = 3;
        let log = report.render_log();
        assert!(log.contains("All the 3 files have been successfully converted."));
    }

    #[test]
    fn ignored_and_failed_files_are_listed() {
        let mut report = RunReport::new(5);
        report.converted = 3;
        report.record_ignored(PathBuf::from("/in/Arch/alt.pdf"), "Arch".into());
        report.record_failure(PathBuf::from("/in/x/broken.doc"), "renderer exited 1".into());
        let log = report.render_log();
        assert!(log.contains("1 files out of the total 5 files have been ignored"));
        assert!(log.contains("Folder: Arch"));
        assert!(log.contains("renderer exited 1"));
        assert!(log.contains("3 files have been successfully converted."));
    }

    #[test]
    fn error_file_lists_conversion_and_merge_failures() {
        let mut report = RunReport::new(2);
        report.record_failure(PathBuf::from("/in/a.doc"), "corrupt".into());
        report.record_merge_failure(PathBuf::from("/in/Mueller 123456"), "page tree broken".into());
        let errors = report.render_errors();
        assert!(errors.contains("/in/a.doc: corrupt"));
        assert!(errors.contains("page tree broken"));
    }

    #[test]
    fn flush_writes_all_three_report_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = MigrationConfig::new(
            dir.path().join("in"),
            dir.path().join("out"),
        );
        let mut report = RunReport::new(1);
        report.converted = 1;
        report.flush(&config).unwrap();

        assert!(config.log_path.is_file());
        assert!(config.err_path.is_file());
        let json = std::fs::read_to_string(&config.report_json_path).unwrap();
        assert!(json.contains("\"converted\": 1"));
    }
}
