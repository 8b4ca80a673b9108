//! Resume/dedup ledger of already-converted source files.
//!
//! Plain text, one absolute source path per line, append-only, never pruned.
//! It persists across invocations so a re-run over a partially-migrated tree
//! only processes new files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// In-memory view plus append handle over the on-disk ledger.
#[derive(Debug)]
pub struct ProcessedSet {
    path: PathBuf,
    contents: String,
}

impl ProcessedSet {
    /// Load the ledger, creating an empty one (and its parent directory) if
    /// this is the first run.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            path: path.to_path_buf(),
            contents,
        })
    }

    /// Membership by substring search over the ledger text.
    pub fn contains(&self, path: &Path) -> bool {
        self.contents.contains(path.to_string_lossy().as_ref())
    }

    /// Record a converted source file, durably and in memory.
    pub fn mark(&mut self, path: &Path) -> std::io::Result<()> {
        let line = format!("{}\n", path.to_string_lossy());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        self.contents.push_str(&line);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.contents.lines().count()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
