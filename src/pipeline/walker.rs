//! Depth-first tree walking and patient-boundary detection.
//!
//! The walk visits directories before their files; sibling order is sorted by
//! file name so one run is deterministic. Boundary detection is an explicit
//! state machine value threaded through the traversal: the caller passes the
//! current [`ScopeState`] in and gets the next state back, together with any
//! scope that just closed and must be sealed.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::scope::{self, PatientScope};

/// Traversal state: either outside any patient scope, or inside exactly one.
#[derive(Debug)]
pub enum ScopeState {
    Outside,
    Inside(PatientScope),
}

impl ScopeState {
    pub fn current(&self) -> Option<&PatientScope> {
        match self {
            ScopeState::Outside => None,
            ScopeState::Inside(scope) => Some(scope),
        }
    }

    /// Take the open scope out (used for the final seal at end of walk).
    pub fn into_open(self) -> Option<PatientScope> {
        match self {
            ScopeState::Outside => None,
            ScopeState::Inside(scope) => Some(scope),
        }
    }
}

/// Ordered depth-first iterator over the input tree.
pub fn walk_tree(root: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
    WalkDir::new(root).sort_by_file_name().into_iter()
}

/// Decides patient boundaries while the walk advances.
#[derive(Debug, Clone)]
pub struct BoundaryDetector {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl BoundaryDetector {
    pub fn new(input_root: PathBuf, output_root: PathBuf) -> Self {
        Self {
            input_root,
            output_root,
        }
    }

    /// Advance the state machine over the next visited directory.
    ///
    /// Returns the new state plus the previously open scope if `dir` fell
    /// outside of it (the caller seals that one). A directory inside the open
    /// scope is never re-evaluated.
    pub fn advance(&self, state: ScopeState, dir: &Path) -> (ScopeState, Option<PatientScope>) {
        if let ScopeState::Inside(open) = &state {
            if open.contains(dir) {
                return (state, None);
            }
        }
        let sealed = state.into_open();

        match scope::detect(dir) {
            Some((raw_name, identity)) => {
                tracing::debug!(
                    folder = %raw_name,
                    case_nr = identity.case_nr.as_deref().unwrap_or_default(),
                    "opening patient scope"
                );
                let out_dir = self.mirror_dir(dir);
                let scope =
                    PatientScope::new(dir.to_path_buf(), raw_name, identity, out_dir);
                (ScopeState::Inside(scope), sealed)
            }
            None => (ScopeState::Outside, sealed),
        }
    }

    /// Mirror of an input directory under the output root.
    fn mirror_dir(&self, dir: &Path) -> PathBuf {
        match dir.strip_prefix(&self.input_root) {
            Ok(relative) => self.output_root.join(relative),
            Err(_) => self.output_root.join(dir.file_name().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> BoundaryDetector {
        BoundaryDetector::new(PathBuf::from("/in"), PathBuf::from("/out"))
    }

    #[test]
    fn case_numbered_folder_opens_a_scope() {
        let (state, sealed) =
            detector().advance(ScopeState::Outside, Path::new("/in/Wunddoku/Mueller, Hans 123456"));
        assert!(sealed.is_none());
        let scope = state.current().expect("scope should open");
        assert_eq!(scope.identity.case_nr.as_deref(), Some("123456"));
        assert_eq!(
            scope.out_dir,
            PathBuf::from("/out/Wunddoku/Mueller, Hans 123456")
        );
    }

    #[test]
    fn folder_without_case_number_never_opens_a_scope() {
        let (state, _) = detector().advance(ScopeState::Outside, Path::new("/in/Arch"));
        assert!(state.current().is_none());
    }

    #[test]
    fn subfolders_stay_in_the_open_scope() {
        let d = detector();
        let (state, _) =
            d.advance(ScopeState::Outside, Path::new("/in/Wunddoku/Mueller, Hans 123456"));
        let (state, sealed) =
            d.advance(state, Path::new("/in/Wunddoku/Mueller, Hans 123456/Bilder"));
        assert!(sealed.is_none());
        assert_eq!(
            state.current().map(|s| s.root.clone()),
            Some(PathBuf::from("/in/Wunddoku/Mueller, Hans 123456"))
        );
    }

    #[test]
    fn nested_case_numbered_folder_does_not_reopen() {
        // A sub-folder whose own name would qualify stays part of the
        // already-open scope: scopes are maximal subtrees.
        let d = detector();
        let (state, _) =
            d.advance(ScopeState::Outside, Path::new("/in/Wunddoku/Mueller, Hans 123456"));
        let (state, sealed) = d.advance(
            state,
            Path::new("/in/Wunddoku/Mueller, Hans 123456/Fall 999999"),
        );
        assert!(sealed.is_none());
        assert_eq!(
            state.current().and_then(|s| s.identity.case_nr.clone()),
            Some("123456".to_string())
        );
    }

    #[test]
    fn leaving_the_subtree_seals_the_scope() {
        let d = detector();
        let (state, _) =
            d.advance(ScopeState::Outside, Path::new("/in/Wunddoku/Mueller, Hans 123456"));
        let (state, sealed) =
            d.advance(state, Path::new("/in/Wunddoku/Meier, Eva 654321"));
        let sealed = sealed.expect("previous scope should seal");
        assert_eq!(sealed.identity.case_nr.as_deref(), Some("123456"));
        assert_eq!(
            state.current().and_then(|s| s.identity.case_nr.clone()),
            Some("654321".to_string())
        );
    }

    #[test]
    fn walk_visits_directories_before_their_files() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("Mueller, Hans 123456");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("scan.jpg"), b"x").unwrap();

        let visited: Vec<PathBuf> = walk_tree(dir.path())
            .filter_map(Result::ok)
            .map(|e| e.path().to_path_buf())
            .collect();
        let dir_pos = visited.iter().position(|p| p == &sub).unwrap();
        let file_pos = visited.iter().position(|p| p == &sub.join("scan.jpg")).unwrap();
        assert!(dir_pos < file_pos);
    }
}
