//! Whole-file access, injected into the engine.
//!
//! The engine reads the entire file at the start of every edit and writes
//! the entire file at the end; the authoritative copy is always on disk.
//! [`DiskFiles`] writes atomically (tempfile in the target directory,
//! fsync, rename) so a crash mid-edit never leaves a half-written file.

use std::io::{self, Write};
use std::path::Path;

/// Whole-file read/write, synchronous from the engine's perspective.
pub trait FileAccess {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// The stock implementation backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFiles;

impl FileAccess for DiskFiles {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        atomic_write(path, contents.as_bytes())
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The tempfile is created in the target's directory so the rename never
/// crosses a filesystem boundary.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");

        let files = DiskFiles;
        files.write(&path, "alpha\nbeta\n").unwrap();
        assert_eq!(files.read_to_string(&path).unwrap(), "alpha\nbeta\n");
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, "old").unwrap();

        DiskFiles.write(&path, "new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = DiskFiles
            .read_to_string(&dir.path().join("ghost.txt"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
