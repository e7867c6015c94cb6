//! The Path/Inode Tracker (§4.3).
//!
//! Owns the bipartite inode↔path graph: a dense table of [`InodeState`] keyed by inode
//! identifier, and a reverse index from path to the inode currently holding it. Neither side
//! owns the other (§9); the reverse index stores only keys.
//!
//! Commands name inodes directly only when they create one (`mkfile`, `mkdir`, `symlink`, ...);
//! every other command names a *path*. Resolving "which inode does this path belong to right
//! now" for a path the stream never explicitly created is the one place this module touches the
//! NEW-snapshot oracle (§4.3's "pre-existing directory being renamed" case) — it happens at
//! most once per such path, in [`Tracker::ensure_tracked`], and the result is cached in the
//! model from then on. The first path an inode is ever discovered under, when it wasn't created
//! in this stream, is recorded as `origin_path` — the closest thing this model has to "the
//! inode's path in OLD", since neither oracle exposes an inode-keyed path listing (§6).

use std::collections::{BTreeMap, BTreeSet};

use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::model::EntryKind;
use crate::oracle::NewSnapshotOracle;
use crate::path::RawPath;
use crate::wire::CommandKind;

/// Synthetic inode identifiers count down from here so they can never collide with a real,
/// stream-assigned inode number (§4.3 doesn't specify one; this is this crate's own scheme).
const SYNTHETIC_INO_START: u64 = u64::MAX;

/// Per-inode state (§3), owned by the [`Tracker`].
#[derive(Debug, Clone)]
pub struct InodeState {
    pub kind: EntryKind,
    pub primary_path: Option<RawPath>,
    pub all_paths: BTreeSet<RawPath>,
    pub created_in_stream: bool,
    pub content_dirty: bool,
    /// Set by a metadata-only command (`chmod`/`chown`/`utimes`/`set_xattr`/`remove_xattr`) that
    /// never also set `content_dirty`. Lets the aggregator tell "this inode was touched, but only
    /// by metadata" apart from "this inode was never touched at all" (§4.2, §4.4 rule 6).
    pub metadata_dirty: bool,
    /// Every command that touched this inode's content or metadata, in the order it was seen.
    /// The aggregator picks the label to surface from this with [`crate::ext::PriorityFind`]
    /// rather than this module tracking a running "best so far" (§4.2's priority table).
    pub commands: Vec<CommandKind>,
    pub size: Option<u64>,
    pub symlink_target: Option<RawPath>,
    /// Set once, the first time a `created_in_stream = false` inode is discovered. Stands in
    /// for "this inode's path in OLD" (see module docs); `None` for inodes created in-stream.
    pub origin_path: Option<RawPath>,
}

impl InodeState {
    fn new(kind: EntryKind, created_in_stream: bool) -> Self {
        Self {
            kind,
            primary_path: None,
            all_paths: BTreeSet::new(),
            created_in_stream,
            content_dirty: false,
            metadata_dirty: false,
            commands: Vec::new(),
            size: None,
            symlink_target: None,
            origin_path: None,
        }
    }

    /// `deleted` is derived, not stored (§3): true once every attached path is gone.
    pub fn deleted(&self) -> bool {
        self.all_paths.is_empty()
    }
}

/// The stateful heart of the parse: every command effect lands here as one of the operations
/// below. Doesn't know about [`crate::classify::Effect`] itself — the facade in `lib.rs`
/// matches on the effect and calls the matching operation, passing an oracle only where §4.3
/// requires one.
pub struct Tracker {
    inodes: BTreeMap<u64, InodeState>,
    path_to_inode: BTreeMap<RawPath, u64>,
    next_synthetic_ino: u64,
    strict: bool,
    diagnostics: Vec<Diagnostic>,
}

impl Tracker {
    pub fn new(strict: bool) -> Self {
        Self {
            inodes: BTreeMap::new(),
            path_to_inode: BTreeMap::new(),
            next_synthetic_ino: SYNTHETIC_INO_START,
            strict,
            diagnostics: Vec::new(),
        }
    }

    fn violation(&mut self, reason: String) -> Result<()> {
        if self.strict {
            return Err(Error::TrackerInvariantViolation { reason });
        }
        self.diagnostics.push(Diagnostic::warning(reason));
        Ok(())
    }

    /// Attach `path` to `ino`, implicitly detaching it from whatever inode previously held it
    /// (§4.3: "some streams rely on this"). Sets `primary_path` if this inode had none yet.
    fn attach_raw(&mut self, ino: u64, path: RawPath) {
        if let Some(prev_ino) = self.path_to_inode.insert(path.clone(), ino) {
            if prev_ino != ino {
                if let Some(prev) = self.inodes.get_mut(&prev_ino) {
                    prev.all_paths.remove(&path);
                    if prev.primary_path.as_ref() == Some(&path) {
                        prev.primary_path = prev.all_paths.iter().next().cloned();
                    }
                }
                self.diagnostics.push(
                    Diagnostic::info(format!(
                        "path implicitly detached from inode {prev_ino} to attach to inode {ino}"
                    ))
                    .with_path(path.clone()),
                );
            }
        }
        if let Some(state) = self.inodes.get_mut(&ino) {
            state.all_paths.insert(path.clone());
            if state.primary_path.is_none() {
                state.primary_path = Some(path);
            }
        }
    }

    /// Remove `path` from whatever inode holds it, without touching `primary_path` — callers
    /// recompute that themselves, since `rename` wants different semantics than a plain detach.
    /// The caller is expected to have already resolved `path` via [`Self::ensure_tracked`], so
    /// a `None` here means the tracker's own bookkeeping is inconsistent, not that the path was
    /// simply never seen.
    fn detach_raw(&mut self, path: &RawPath) -> Result<Option<u64>> {
        match self.path_to_inode.remove(path) {
            Some(ino) => {
                if let Some(state) = self.inodes.get_mut(&ino) {
                    state.all_paths.remove(path);
                }
                Ok(Some(ino))
            }
            None => {
                self.violation(format!("no such path: {path}"))?;
                Ok(None)
            }
        }
    }

    fn recompute_primary_after_removal(&mut self, ino: u64, removed: &RawPath) {
        if let Some(state) = self.inodes.get_mut(&ino) {
            if state.primary_path.as_ref() == Some(removed) {
                state.primary_path = state.all_paths.iter().next().cloned();
            }
        }
    }

    /// Resolve `path` to the inode that currently holds it, synthesizing a pre-existing inode
    /// (via the NEW-snapshot oracle, §4.3) the first time a path is referenced without ever
    /// having been created in this stream. Every command that only carries a path — not the
    /// `mkfile`/`mkdir`/... family, which carry an explicit `ino` — resolves through here first.
    fn ensure_tracked(&mut self, path: &RawPath, new_oracle: &dyn NewSnapshotOracle) -> Result<u64> {
        if let Some(&ino) = self.path_to_inode.get(path) {
            return Ok(ino);
        }
        let ino = self.next_synthetic_ino;
        self.next_synthetic_ino = self.next_synthetic_ino.saturating_sub(1);

        let kind = match new_oracle.new_kind(path) {
            Ok(kind) => kind,
            Err(err) => {
                self.diagnostics.push(
                    Diagnostic::warning(format!("oracle failure resolving kind for {path}: {err}"))
                        .with_path(path.clone()),
                );
                EntryKind::Unknown
            }
        };
        let mut state = InodeState::new(kind, false);
        state.origin_path = Some(path.clone());
        self.inodes.insert(ino, state);
        self.attach_raw(ino, path.clone());
        Ok(ino)
    }

    /// `allocate(inode, kind, path)` (§4.3): a create-class command introducing a brand new
    /// inode. A duplicate allocation is a soft `TrackerInvariantViolation` by default; the path
    /// is still attached so downstream state stays consistent.
    pub fn allocate(&mut self, ino: u64, kind: EntryKind, path: RawPath, command: CommandKind) -> Result<()> {
        if self.inodes.contains_key(&ino) {
            self.violation(format!("duplicate inode {ino} allocated at path {path}"))?;
            self.attach_raw(ino, path);
            return Ok(());
        }
        let mut state = InodeState::new(kind, true);
        state.commands.push(command);
        self.inodes.insert(ino, state);
        self.attach_raw(ino, path);
        Ok(())
    }

    /// `symlink`: allocation plus the recorded link target (§4.2).
    pub fn create_symlink(&mut self, ino: u64, path: RawPath, target: RawPath) -> Result<()> {
        self.allocate(ino, EntryKind::Symlink, path, CommandKind::Symlink)?;
        if let Some(state) = self.inodes.get_mut(&ino) {
            state.symlink_target = Some(target);
        }
        Ok(())
    }

    /// `link`: attach whatever inode currently owns `existing_path` to `new_path`.
    pub fn link(&mut self, existing_path: &RawPath, new_path: RawPath, new_oracle: &dyn NewSnapshotOracle) -> Result<()> {
        let ino = self.ensure_tracked(existing_path, new_oracle)?;
        self.attach_raw(ino, new_path);
        Ok(())
    }

    /// `unlink`: detach `path` from its inode (§4.3). Resolves through [`Self::ensure_tracked`]
    /// first, since an unlink of a path this stream never created still names a real,
    /// pre-existing inode — one that is about to become a `deleted` record (§4.4 rule 1).
    pub fn unlink(&mut self, path: &RawPath, new_oracle: &dyn NewSnapshotOracle) -> Result<()> {
        let ino = self.ensure_tracked(path, new_oracle)?;
        if self.detach_raw(path)?.is_some() {
            self.recompute_primary_after_removal(ino, path);
        }
        Ok(())
    }

    /// `rmdir`: like `unlink`, but the inode is expected to be a directory (§4.2).
    pub fn rmdir(&mut self, path: &RawPath, new_oracle: &dyn NewSnapshotOracle) -> Result<()> {
        let ino = self.ensure_tracked(path, new_oracle)?;
        let mismatched = self
            .inodes
            .get(&ino)
            .is_some_and(|state| !matches!(state.kind, EntryKind::Directory | EntryKind::Unknown));
        if mismatched {
            self.violation(format!("rmdir on non-directory inode {ino} at path {path}"))?;
        }
        self.unlink(path, new_oracle)
    }

    /// `rename(from, to)` (§4.3): `attach(inode_at(from), to)` then `detach(from)`, with primary
    /// preference going to `to` when `from` was primary rather than a plain lexicographic
    /// recompute.
    pub fn rename(&mut self, from: &RawPath, to: RawPath, new_oracle: &dyn NewSnapshotOracle) -> Result<()> {
        let ino = self.ensure_tracked(from, new_oracle)?;
        let was_primary = self.inodes.get(&ino).and_then(|s| s.primary_path.as_ref()) == Some(from);

        self.attach_raw(ino, to.clone());
        self.detach_raw(from)?;

        if let Some(state) = self.inodes.get_mut(&ino) {
            if was_primary {
                state.primary_path = Some(to);
            } else if state.primary_path.is_none() {
                state.primary_path = state.all_paths.iter().next().cloned();
            }
        }
        Ok(())
    }

    /// `mark_dirty(inode, command, size?)` resolved from a path-carrying content command
    /// (`write`, `clone`, `update_extent`, `truncate`).
    pub fn touch_content(
        &mut self,
        path: &RawPath,
        command: CommandKind,
        size: Option<u64>,
        new_oracle: &dyn NewSnapshotOracle,
    ) -> Result<()> {
        let ino = self.ensure_tracked(path, new_oracle)?;
        let state = self.inodes.get_mut(&ino).expect("just ensured");
        state.content_dirty = true;
        if let Some(size) = size {
            state.size = Some(size);
        }
        state.commands.push(command);
        Ok(())
    }

    /// Metadata-only commands (`chmod`/`chown`/`utimes`/`set_xattr`/`remove_xattr`): never set
    /// `content_dirty`, but still recorded in case a stronger effect never materializes for
    /// this inode (§4.2) — aggregation still emits nothing for it in that case (§4.4 rule 6),
    /// so this only matters for diagnostics and `Options::emit_metadata_only_changes`.
    pub fn touch_metadata(&mut self, path: &RawPath, command: CommandKind, new_oracle: &dyn NewSnapshotOracle) -> Result<()> {
        let ino = self.ensure_tracked(path, new_oracle)?;
        let state = self.inodes.get_mut(&ino).expect("just ensured");
        state.metadata_dirty = true;
        state.commands.push(command);
        Ok(())
    }

    /// Every inode the stream ever referenced, keyed by its stream or synthetic identifier.
    pub fn inodes(&self) -> impl Iterator<Item = (u64, &InodeState)> {
        self.inodes.iter().map(|(ino, state)| (*ino, state))
    }

    /// Whether `path` currently names a real inode — used by the aggregator when it needs to
    /// know if a path survives into the final model (§4.4.5 pairing).
    pub fn path_inode(&self, path: &RawPath) -> Option<u64> {
        self.path_to_inode.get(path).copied()
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
