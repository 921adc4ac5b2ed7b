//! Access control and read tracking, injected into the engine.
//!
//! The engine itself holds no cross-call state. Whether a path may be
//! edited and whether the caller has actually observed the file this
//! session are questions for the embedding application, consulted through
//! [`AccessGate`] before any file I/O. [`WorkspaceGate`] is the stock
//! implementation: a canonicalized workspace boundary with forbidden
//! subdirectories plus a session read ledger.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

/// The gate the orchestrator consults before touching a file.
///
/// A `false` from either query short-circuits the edit without any file
/// I/O. `mark_rewritten` lets the embedding application know the on-disk
/// content changed under this engine's hands.
pub trait AccessGate {
    fn is_path_allowed(&self, path: &Path) -> bool;
    fn has_been_read(&self, path: &Path) -> bool;
    fn mark_rewritten(&self, path: &Path);
}

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("failed to canonicalize workspace root: {0}")]
    Canonicalize(#[from] std::io::Error),
}

/// Workspace-scoped gate with a session read ledger.
///
/// Paths are canonicalized before checking, so symlinks pointing out of the
/// workspace are rejected. Directories that must never be edited (version
/// control metadata, build output, vendored dependencies) are forbidden
/// even inside the workspace.
#[derive(Debug)]
pub struct WorkspaceGate {
    workspace_root: PathBuf,
    forbidden_paths: Vec<PathBuf>,
    read_paths: Mutex<HashSet<PathBuf>>,
    rewritten_paths: Mutex<HashSet<PathBuf>>,
}

const FORBIDDEN_DIRS: &[&str] = &[".git", "target", "node_modules"];

impl WorkspaceGate {
    /// Create a gate rooted at `workspace_root`.
    ///
    /// The root is canonicalized to handle symlinks correctly.
    pub fn new(workspace_root: impl AsRef<Path>) -> Result<Self, AccessError> {
        let workspace_root = workspace_root.as_ref().canonicalize()?;

        let forbidden_paths = FORBIDDEN_DIRS
            .iter()
            .filter_map(|dir| workspace_root.join(dir).canonicalize().ok())
            .collect();

        Ok(Self {
            workspace_root,
            forbidden_paths,
            read_paths: Mutex::new(HashSet::new()),
            rewritten_paths: Mutex::new(HashSet::new()),
        })
    }

    /// Record that the caller has observed `path` this session.
    pub fn mark_read(&self, path: &Path) {
        if let Some(canonical) = self.canonicalize(path) {
            self.read_paths.lock().expect("gate lock poisoned").insert(canonical);
        }
    }

    /// Paths rewritten through the engine so far this session.
    pub fn rewritten(&self) -> Vec<PathBuf> {
        let set = self.rewritten_paths.lock().expect("gate lock poisoned");
        let mut paths: Vec<_> = set.iter().cloned().collect();
        paths.sort();
        paths
    }

    /// Get the workspace root.
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Canonicalize `path`, resolving relative paths against the workspace
    /// root. Returns `None` when the containing directory does not exist.
    fn canonicalize(&self, path: &Path) -> Option<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        if let Ok(canonical) = absolute.canonicalize() {
            return Some(canonical);
        }

        // The file itself may not exist yet; canonicalize its parent so a
        // symlinked directory still cannot escape the workspace.
        let parent = absolute.parent()?.canonicalize().ok()?;
        Some(parent.join(absolute.file_name()?))
    }

    fn check(&self, canonical: &Path) -> bool {
        canonical.starts_with(&self.workspace_root)
            && !self
                .forbidden_paths
                .iter()
                .any(|forbidden| canonical.starts_with(forbidden))
    }
}

impl AccessGate for WorkspaceGate {
    fn is_path_allowed(&self, path: &Path) -> bool {
        match self.canonicalize(path) {
            Some(canonical) => self.check(&canonical),
            None => false,
        }
    }

    fn has_been_read(&self, path: &Path) -> bool {
        match self.canonicalize(path) {
            Some(canonical) => self
                .read_paths
                .lock()
                .expect("gate lock poisoned")
                .contains(&canonical),
            None => false,
        }
    }

    fn mark_rewritten(&self, path: &Path) {
        if let Some(canonical) = self.canonicalize(path) {
            self.rewritten_paths
                .lock()
                .expect("gate lock poisoned")
                .insert(canonical);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn allows_file_inside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.rs");
        fs::write(&file, b"").unwrap();

        let gate = WorkspaceGate::new(dir.path()).unwrap();
        assert!(gate.is_path_allowed(&file));
    }

    #[test]
    fn rejects_file_outside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let outside = dir.path().join("outside.rs");
        fs::write(&outside, b"").unwrap();

        let gate = WorkspaceGate::new(&workspace).unwrap();
        assert!(!gate.is_path_allowed(&outside));
    }

    #[test]
    fn rejects_forbidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        let git_file = dir.path().join(".git/config");
        fs::create_dir_all(git_file.parent().unwrap()).unwrap();
        fs::write(&git_file, b"").unwrap();

        let gate = WorkspaceGate::new(dir.path()).unwrap();
        assert!(!gate.is_path_allowed(&git_file));
    }

    #[test]
    fn resolves_relative_paths_against_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lib.rs"), b"").unwrap();

        let gate = WorkspaceGate::new(dir.path()).unwrap();
        assert!(gate.is_path_allowed(Path::new("lib.rs")));
    }

    #[test]
    #[cfg(unix)]
    fn rejects_symlink_escape() {
        use std::os::unix::fs::symlink;

        let dir = tempfile::tempdir().unwrap();
        let workspace = dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let outside = dir.path().join("outside.rs");
        fs::write(&outside, b"").unwrap();
        let link = workspace.join("escape.rs");
        symlink(&outside, &link).unwrap();

        let gate = WorkspaceGate::new(&workspace).unwrap();
        assert!(!gate.is_path_allowed(&link));
    }

    #[test]
    fn read_ledger_tracks_observations() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.rs");
        fs::write(&file, b"").unwrap();

        let gate = WorkspaceGate::new(dir.path()).unwrap();
        assert!(!gate.has_been_read(&file));
        gate.mark_read(&file);
        assert!(gate.has_been_read(&file));
    }

    #[test]
    fn rewritten_paths_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.rs");
        fs::write(&file, b"").unwrap();

        let gate = WorkspaceGate::new(dir.path()).unwrap();
        gate.mark_rewritten(&file);
        assert_eq!(gate.rewritten(), vec![file.canonicalize().unwrap()]);
    }
}
