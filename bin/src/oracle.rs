//! Filesystem-backed implementations of the CORE's oracle traits (§6).
//!
//! Each oracle is rooted at one snapshot directory and answers existence/kind questions with a
//! plain `lstat`, via [`std::fs::symlink_metadata`] — the CORE never needs to distinguish a
//! symlink from its target, so this deliberately doesn't follow links.

use std::path::{Path, PathBuf};

use sendstream_delta::{EntryKind, NewSnapshotOracle, OldSnapshotOracle, RawPath};

fn lstat_kind(root: &Path, path: &RawPath) -> std::io::Result<Option<EntryKind>> {
    let full = path.resolve_under(root);
    match std::fs::symlink_metadata(&full) {
        Ok(meta) => {
            let file_type = meta.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_symlink() {
                EntryKind::Symlink
            } else if file_type.is_file() {
                EntryKind::Regular
            } else {
                EntryKind::Special
            };
            Ok(Some(kind))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Answers `old_exists` against a snapshot directory rooted at `root`.
#[derive(Debug, Clone)]
pub struct FsOldSnapshot {
    root: PathBuf,
}

impl FsOldSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl OldSnapshotOracle for FsOldSnapshot {
    fn old_exists(&self, path: &RawPath) -> std::io::Result<bool> {
        Ok(lstat_kind(&self.root, path)?.is_some())
    }
}

/// Answers `new_exists`/`new_kind` against a snapshot directory rooted at `root`.
#[derive(Debug, Clone)]
pub struct FsNewSnapshot {
    root: PathBuf,
}

impl FsNewSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl NewSnapshotOracle for FsNewSnapshot {
    fn new_exists(&self, path: &RawPath) -> std::io::Result<bool> {
        Ok(lstat_kind(&self.root, path)?.is_some())
    }

    fn new_kind(&self, path: &RawPath) -> std::io::Result<EntryKind> {
        Ok(lstat_kind(&self.root, path)?.unwrap_or(EntryKind::Unknown))
    }
}
