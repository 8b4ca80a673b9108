//! Per-patient document aggregation and the ordered merge.
//!
//! While a scope is open, every successfully converted document is appended
//! to the scope's ledger file: two lines per record, output path then
//! acquisition timestamp. Sealing a scope reads the ledger back, stable-sorts
//! by timestamp and concatenates the PDFs in that order — reconstructing
//! chronological acquisition order even though the files were gathered from
//! unordered sub-folders.

use std::cmp::Ordering;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;

use super::metadata;
use super::scope::PatientScope;
use super::MigrateError;
use crate::convert::pdf;

/// One successfully converted file, owned by the scope it was produced under.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    pub output_path: PathBuf,
    /// Seconds since the epoch, fractional part kept.
    pub acquisition_time: f64,
}

/// What sealing a scope produced.
#[derive(Debug)]
pub enum SealOutcome {
    /// The merged document was written and intermediates were cleaned up.
    Merged(PathBuf),
    /// The scope had no pending records (nothing was converted under it).
    Empty,
}

/// Append one record to the scope's ledger file.
pub fn append_record(
    ledger_path: &Path,
    output_path: &Path,
    acquisition_time: f64,
) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(ledger_path)?;
    write!(file, "{}\n{}\n", output_path.display(), acquisition_time)?;
    Ok(())
}

/// Read all records back. Malformed pairs are skipped with a warning — a
/// truncated ledger from an interrupted run must not sink the scope.
pub fn read_records(ledger_path: &Path) -> std::io::Result<Vec<DocumentRecord>> {
    let contents = std::fs::read_to_string(ledger_path)?;
    let lines: Vec<&str> = contents.lines().collect();
    let mut records = Vec::with_capacity(lines.len() / 2);
    for pair in lines.chunks_exact(2) {
        match pair[1].trim().parse::<f64>() {
            Ok(acquisition_time) => records.push(DocumentRecord {
                output_path: PathBuf::from(pair[0]),
                acquisition_time,
            }),
            Err(_) => {
                tracing::warn!(
                    ledger = %ledger_path.display(),
                    line = pair[1],
                    "skipping ledger record with unparseable timestamp"
                );
            }
        }
    }
    Ok(records)
}

/// Ascending by acquisition time; ties keep append order (stable sort).
pub fn sort_records(records: &mut [DocumentRecord]) {
    records.sort_by(|a, b| {
        a.acquisition_time
            .partial_cmp(&b.acquisition_time)
            .unwrap_or(Ordering::Equal)
    });
}

/// Seal a closing scope: merge its pending documents in chronological order,
/// emit the metadata sidecar, delete the intermediates and the ledger.
///
/// On merge failure the error propagates and every artifact stays in place
/// for manual inspection; the caller records the failure and walks on.
pub fn seal(scope: &PatientScope, today: NaiveDate) -> Result<SealOutcome, MigrateError> {
    if !scope.ledger_path.is_file() {
        return Ok(SealOutcome::Empty);
    }
    let mut records = read_records(&scope.ledger_path)?;
    if records.is_empty() {
        return Ok(SealOutcome::Empty);
    }
    sort_records(&mut records);

    let inputs: Vec<&Path> = records.iter().map(|r| r.output_path.as_path()).collect();
    let merged_path = scope
        .out_dir
        .join(format!("{}.pdf", scope.merged_basename()));
    pdf::merge_files(&inputs, &merged_path)?;

    // Intermediates are scaffolding; only the merged document and its
    // sidecar remain.
    if let Err(e) = std::fs::remove_file(&scope.ledger_path) {
        tracing::warn!(path = %scope.ledger_path.display(), error = %e, "could not remove scope ledger");
    }
    for record in &records {
        if let Err(e) = std::fs::remove_file(&record.output_path) {
            tracing::warn!(path = %record.output_path.display(), error = %e, "could not remove intermediate PDF");
        }
    }

    metadata::write_sidecar(scope, today)?;

    tracing::info!(
        patient = %scope.raw_name,
        documents = records.len(),
        merged = %merged_path.display(),
        "patient scope sealed"
    );
    Ok(SealOutcome::Merged(merged_path))
}
