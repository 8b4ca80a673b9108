//! Migration orchestration: one sequential pass over the input tree.
//!
//! Data flow: the walker discovers folders, the boundary detector
//! opens/closes patient scopes, every in-scope file goes through the
//! converter, the aggregator buffers converted outputs with timestamps and
//! seals each scope into one merged document plus metadata sidecar. The
//! resume ledger is consulted before every conversion so repeated runs only
//! process new files.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use chrono::Local;

use crate::config::{self, MigrationConfig, TimeOrder};
use crate::convert::Convert;
use crate::identity::Identity;

use super::aggregate;
use super::ledger::ProcessedSet;
use super::report::RunReport;
use super::scope::PatientScope;
use super::walker::{walk_tree, BoundaryDetector, ScopeState};
use super::MigrateError;

/// Progress is logged every this many processed files.
const PROGRESS_EVERY: usize = 50;

pub struct Migrator<C: Convert> {
    config: MigrationConfig,
    converter: C,
    detector: BoundaryDetector,
}

impl<C: Convert> Migrator<C> {
    pub fn new(config: MigrationConfig, converter: C) -> Result<Self, MigrateError> {
        if !config.input_dir.is_dir() {
            return Err(MigrateError::InvalidInputDir(config.input_dir.clone()));
        }
        std::fs::create_dir_all(&config.output_dir)?;
        let detector =
            BoundaryDetector::new(config.input_dir.clone(), config.output_dir.clone());
        Ok(Self {
            config,
            converter,
            detector,
        })
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// The full migration pass. Returns the final counts; the same numbers
    /// are flushed to the log/err/JSON report files.
    pub fn run(&self) -> Result<RunReport, MigrateError> {
        let total_files = self.count_files();
        let mut report = RunReport::new(total_files);
        let mut processed = ProcessedSet::open(&self.config.ledger_path)?;
        let mut patients: Vec<Identity> = Vec::new();
        let mut state = ScopeState::Outside;
        let mut seen = 0usize;

        tracing::info!(
            input = %self.config.input_dir.display(),
            output = %self.config.output_dir.display(),
            total_files,
            "starting migration run"
        );

        for entry in walk_tree(&self.config.input_dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                let (next, sealed) = self.detector.advance(state, entry.path());
                if let Some(scope) = sealed {
                    self.seal_scope(scope, &mut report);
                }
                if let Some(scope) = next.current() {
                    if scope.root == entry.path() {
                        patients.push(scope.identity.clone());
                    }
                }
                state = next;
            } else {
                self.process_file(entry.path(), &state, &mut processed, &mut report)?;
                seen += 1;
                if seen % PROGRESS_EVERY == 0 {
                    tracing::info!(processed = seen, total = total_files, "migration progress");
                }
            }
        }
        if let Some(scope) = state.into_open() {
            self.seal_scope(scope, &mut report);
        }

        self.write_csv(&patients)?;
        report.flush(&self.config)?;
        tracing::info!(
            converted = report.converted,
            ignored = report.ignored.len(),
            previously_processed = report.previously_processed,
            failed = report.failures.len(),
            "migration run finished"
        );
        Ok(report)
    }

    /// One source file. Cache files are invisible; files already in the
    /// resume ledger count as previously processed; files outside every
    /// scope are ignored and never converted.
    fn process_file(
        &self,
        source: &Path,
        state: &ScopeState,
        processed: &mut ProcessedSet,
        report: &mut RunReport,
    ) -> Result<(), MigrateError> {
        if config::is_cache_file(source) {
            return Ok(());
        }
        if processed.contains(source) {
            tracing::debug!(file = %source.display(), "already converted in an earlier run");
            report.previously_processed += 1;
            return Ok(());
        }
        let scope = match state.current() {
            Some(scope) => scope,
            None => {
                let folder = source
                    .parent()
                    .and_then(Path::file_name)
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                report.record_ignored(source.to_path_buf(), folder);
                return Ok(());
            }
        };

        std::fs::create_dir_all(&scope.out_dir)?;
        let dest = unique_output_path(&scope.out_dir, source);
        match self.converter.convert(source, &dest) {
            Ok(()) => {
                let acquisition_time = acquisition_time(source, self.config.time_order)?;
                aggregate::append_record(&scope.ledger_path, &dest, acquisition_time)?;
                processed.mark(source)?;
                report.converted += 1;
            }
            Err(e) => {
                tracing::warn!(file = %source.display(), error = %e, "conversion failed");
                report.record_failure(source.to_path_buf(), e.to_string());
            }
        }
        Ok(())
    }

    /// Merge failure is recorded per scope and never fatal to the run.
    fn seal_scope(&self, scope: PatientScope, report: &mut RunReport) {
        let today = Local::now().date_naive();
        if let Err(e) = aggregate::seal(&scope, today) {
            tracing::warn!(patient = %scope.raw_name, error = %e, "sealing patient scope failed");
            report.record_merge_failure(scope.root.clone(), e.to_string());
        }
    }

    /// Walk the tree collecting one identity per patient scope, converting
    /// nothing. Used by the export-only modes.
    pub fn collect_patients(&self) -> Result<Vec<(String, Identity)>, MigrateError> {
        let mut patients = Vec::new();
        let mut state = ScopeState::Outside;
        for entry in walk_tree(&self.config.input_dir) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let (next, _) = self.detector.advance(state, entry.path());
            if let Some(scope) = next.current() {
                if scope.root == entry.path() {
                    patients.push((scope.raw_name.clone(), scope.identity.clone()));
                }
            }
            state = next;
        }
        Ok(patients)
    }

    /// Write the per-patient identity table (`Vorname,Nachname,Geburtstag,
    /// Fall-nr`). Rows without a case number are not patients and are not
    /// exported.
    pub fn export_csv(&self) -> Result<PathBuf, MigrateError> {
        let patients = self.collect_patients()?;
        let identities: Vec<Identity> = patients.into_iter().map(|(_, id)| id).collect();
        self.write_csv(&identities)?;
        Ok(self.config.csv_path())
    }

    fn write_csv(&self, patients: &[Identity]) -> Result<(), MigrateError> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let mut out = String::from("Vorname,Nachname,Geburtstag,Fall-nr\n");
        for identity in patients {
            if identity.case_nr.is_none() {
                continue;
            }
            let row = [
                identity.first_name.as_deref().unwrap_or_default(),
                identity.last_name.as_deref().unwrap_or_default(),
                identity.birthday.as_deref().unwrap_or_default(),
                identity.case_nr.as_deref().unwrap_or_default(),
            ];
            let line: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
            out.push_str(&line.join(","));
            out.push('\n');
        }
        std::fs::write(self.config.csv_path(), out)?;
        Ok(())
    }

    /// List-only mode: append every detected patient folder name to the log
    /// file. Returns how many were found.
    pub fn list_patient_folders(&self) -> Result<usize, MigrateError> {
        let patients = self.collect_patients()?;
        if let Some(parent) = self.config.log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = String::new();
        for (raw_name, _) in &patients {
            out.push_str(raw_name);
            out.push('\n');
        }
        std::fs::write(&self.config.log_path, out)?;
        Ok(patients.len())
    }

    /// Upfront total for progress reporting; cache files are not counted.
    fn count_files(&self) -> usize {
        walk_tree(&self.config.input_dir)
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| !config::is_cache_file(e.path()))
            .count()
    }
}

/// Quote a CSV field only when it needs it.
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Mirror the original tool's distinct-name scheme: `<stem><n>.pdf`,
/// first free suffix starting at 0.
fn unique_output_path(out_dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let mut index = 0usize;
    loop {
        let candidate = out_dir.join(format!("{stem}{index}.pdf"));
        if !candidate.exists() {
            return candidate;
        }
        index += 1;
    }
}

/// The source file's acquisition timestamp as fractional epoch seconds.
/// Creation time falls back to modification time where the filesystem does
/// not report it.
fn acquisition_time(path: &Path, order: TimeOrder) -> std::io::Result<f64> {
    let metadata = std::fs::metadata(path)?;
    let time = match order {
        TimeOrder::Creation => metadata.created().or_else(|_| metadata.modified())?,
        TimeOrder::Modification => metadata.modified()?,
    };
    Ok(time
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default())
}
