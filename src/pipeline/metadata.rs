//! Metadata sidecar emitted next to each merged patient document.
//!
//! Fixed key/value text format consumed by the receiving archive system.
//! Field numbers and constants follow the target import convention; the
//! migration label distinguishes wound-care from stoma-care source trees.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::NaiveDate;

use super::scope::PatientScope;

/// Substring in the source path that marks a wound-care documentation tree.
const WOUND_CARE_MARKER: &str = "Wunddoku";

const SIDECAR_EXTENSION: &str = "jpl";

/// Write the sidecar for a sealed scope. Unavailable identity fields are
/// omitted with a logged warning; the record itself is always produced.
pub fn write_sidecar(scope: &PatientScope, today: NaiveDate) -> std::io::Result<PathBuf> {
    let path = scope
        .out_dir
        .join(format!("{}.{}", scope.merged_basename(), SIDECAR_EXTENSION));

    let documentation = if scope.root.to_string_lossy().contains(WOUND_CARE_MARKER) {
        "Wunddokumentation"
    } else {
        "Stomadokumentation"
    };
    let case_nr = scope.identity.case_nr.as_deref().unwrap_or_default();
    let today_str = today.format("%d.%m.%y");

    let mut out = String::new();
    let _ = writeln!(out, "dokuart = \"DMDOK\"");
    let _ = writeln!(out, "logi_verzeichnis = \"Freigabe\"");
    let _ = writeln!(out, "dok_dat_feld[3] = \"MCC AA {documentation} Migration\"");
    let _ = writeln!(out, "dok_dat_feld[5] = \"{documentation}\"");
    let _ = writeln!(out, "dok_dat_feld[7] = \"{case_nr}\"");
    match &scope.identity.first_name {
        Some(first_name) => {
            let _ = writeln!(out, "dok_dat_feld[11] = \"{first_name}\"");
        }
        None => {
            tracing::warn!(patient = %scope.raw_name, "was not possible to extract the first name");
        }
    }
    match &scope.identity.last_name {
        Some(last_name) => {
            let _ = writeln!(out, "dok_dat_feld[12] = \"{last_name}\"");
        }
        None => {
            tracing::warn!(patient = %scope.raw_name, "was not possible to extract the last name");
        }
    }
    let _ = writeln!(out, "dok_dat_feld[14] = \"Migrationsdokument\"");
    let _ = writeln!(out, "dok_dat_feld[15] = \"2080\"");
    let _ = writeln!(out, "dok_dat_feld[16] = \"MCC HLT\"");
    let _ = writeln!(out, "dok_dat_feld[50] = \"{today_str}\"");
    let _ = writeln!(out, "dok_dat_feld[52] = \"{today_str}\"");
    match &scope.identity.birthday {
        Some(birthday) => {
            let _ = writeln!(out, "dok_dat_feld[53] = \"{birthday}\"");
        }
        None => {
            tracing::warn!(patient = %scope.raw_name, "was not possible to extract the birthday");
        }
    }

    std::fs::write(&path, out)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::extract_patient_data;
    use std::path::Path;

    fn scope_under(dir: &Path, tree: &str, name: &str) -> PatientScope {
        let out_dir = dir.join(tree).join(name);
        std::fs::create_dir_all(&out_dir).unwrap();
        PatientScope::new(
            PathBuf::from("/in").join(tree).join(name),
            name.to_string(),
            extract_patient_data(name),
            out_dir,
        )
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn full_identity_produces_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let scope = scope_under(
            dir.path(),
            "Wunddoku",
            "Mueller, Hans geb. 12.03.1950 123456",
        );
        let path = write_sidecar(&scope, today()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        assert!(content.starts_with("dokuart = \"DMDOK\"\n"));
        assert!(content.contains("logi_verzeichnis = \"Freigabe\"\n"));
        assert!(content.contains("dok_dat_feld[3] = \"MCC AA Wunddokumentation Migration\"\n"));
        assert!(content.contains("dok_dat_feld[5] = \"Wunddokumentation\"\n"));
        assert!(content.contains("dok_dat_feld[7] = \"123456\"\n"));
        assert!(content.contains("dok_dat_feld[11] = \"Mueller\"\n"));
        assert!(content.contains("dok_dat_feld[12] = \"Hans\"\n"));
        assert!(content.contains("dok_dat_feld[14] = \"Migrationsdokument\"\n"));
        assert!(content.contains("dok_dat_feld[15] = \"2080\"\n"));
        assert!(content.contains("dok_dat_feld[50] = \"01.06.24\"\n"));
        assert!(content.contains("dok_dat_feld[52] = \"01.06.24\"\n"));
        assert!(content.contains("dok_dat_feld[53] = \"12.03.1950\"\n"));
    }

    #[test]
    fn stoma_tree_gets_the_stoma_label() {
        let dir = tempfile::tempdir().unwrap();
        let scope = scope_under(dir.path(), "Stomadoku", "Meier, Eva 654321");
        let path = write_sidecar(&scope, today()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("dok_dat_feld[5] = \"Stomadokumentation\"\n"));
    }

    #[test]
    fn missing_fields_are_omitted_not_empty() {
        let dir = tempfile::tempdir().unwrap();
        // Only a case number extractable.
        let scope = scope_under(dir.path(), "Wunddoku", "1234567");
        let path = write_sidecar(&scope, today()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("dok_dat_feld[7] = \"1234567\"\n"));
        assert!(!content.contains("dok_dat_feld[12]"));
        assert!(!content.contains("dok_dat_feld[53]"));
    }
}
