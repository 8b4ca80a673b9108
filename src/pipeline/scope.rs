//! Patient scopes: the maximal subtree attributed to one patient.

use std::path::{Path, PathBuf};

use crate::identity::{extract_patient_data, Identity};

/// Per-scope ledger of pending converted documents, kept in the scope's
/// output directory until the scope is sealed.
pub const SCOPE_LEDGER_FILE: &str = "info.txt";

/// A subtree rooted at a folder whose name yields a case number. At most one
/// scope is open at a time; `root` never changes once set.
#[derive(Debug, Clone)]
pub struct PatientScope {
    pub root: PathBuf,
    pub raw_name: String,
    pub identity: Identity,
    /// Mirror of `root` under the output directory; all converted files of
    /// this patient land here, flat.
    pub out_dir: PathBuf,
    pub ledger_path: PathBuf,
}

impl PatientScope {
    pub fn new(root: PathBuf, raw_name: String, identity: Identity, out_dir: PathBuf) -> Self {
        Self {
            ledger_path: out_dir.join(SCOPE_LEDGER_FILE),
            root,
            raw_name,
            identity,
            out_dir,
        }
    }

    /// Whether `path` belongs to this scope (descendant of or equal to root).
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
    }

    /// Base name (no extension) for the merged document and its metadata
    /// sidecar: `"<first_name>, <last_name> Fall-Nr <case_nr>"`. Missing name
    /// parts degrade with a warning; the raw folder name is the last resort.
    pub fn merged_basename(&self) -> String {
        let case_nr = self.identity.case_nr.as_deref().unwrap_or_default();
        let name = match (&self.identity.first_name, &self.identity.last_name) {
            (Some(first), Some(last)) => format!("{first}, {last}"),
            (Some(first), None) => {
                tracing::warn!(folder = %self.raw_name, "no last name extracted for merged document name");
                first.clone()
            }
            (None, Some(last)) => {
                tracing::warn!(folder = %self.raw_name, "no first name extracted for merged document name");
                last.clone()
            }
            (None, None) => {
                tracing::warn!(folder = %self.raw_name, "no name extracted, using the folder name");
                self.raw_name.clone()
            }
        };
        sanitize_file_stem(&format!("{name} Fall-Nr {case_nr}"))
    }
}

/// Test a directory for being a patient-scope root: its leaf name must yield
/// a case number. Total — malformed names simply return `None`.
pub fn detect(dir: &Path) -> Option<(String, Identity)> {
    let raw_name = dir.file_name()?.to_string_lossy().into_owned();
    let identity = extract_patient_data(&raw_name);
    if identity.is_patient() {
        Some((raw_name, identity))
    } else {
        None
    }
}

/// Strip path separators and NULs from a generated file stem, limit length.
fn sanitize_file_stem(original: &str) -> String {
    let clean: String = original
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '\0'))
        .take(200)
        .collect();

    if clean.is_empty() {
        "document".to_string()
    } else {
        clean
    }
}
