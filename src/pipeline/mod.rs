//! The migration pipeline: tree walking, patient-boundary detection,
//! per-patient aggregation, resume bookkeeping and reporting.

pub mod aggregate;
pub mod ledger;
pub mod metadata;
pub mod report;
pub mod runner;
pub mod scope;
pub mod walker;

use std::path::PathBuf;

use thiserror::Error;

use crate::convert::ConvertError;

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("input directory does not exist or is not a directory: {}", .0.display())]
    InvalidInputDir(PathBuf),

    #[error("could not serialize run report: {0}")]
    Report(#[from] serde_json::Error),
}
