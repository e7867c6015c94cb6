//! Parses a btrfs incremental send-stream into a canonical set of file changes between two
//! snapshots.
//!
//! The stream is a binary, length-prefixed command log (§4.1) that names newly created inodes
//! under temporary paths and emits many low-level operations (`mkfile`, `rename`, `link`,
//! `unlink`, `truncate`, `write`, `update_extent`, ...) that a caller doesn't want to see
//! individually. [`parse`] collapses all of that into an ordered [`Vec<FileChange>`]: what was
//! created or modified, deleted, or renamed, and whether each is a file, directory, or symlink.
//!
//! Invoking the filesystem utility that produces the stream, CLI/output formatting, and a
//! downstream validator that cross-checks output against a live filesystem are all out of scope
//! here — this crate only ever consumes bytes and two small oracle callbacks.

#![deny(clippy::uninlined_format_args)]
#![deny(clippy::unwrap_used)]
#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

mod aggregate;
mod change;
mod classify;
mod diagnostics;
mod error;
mod ext;
mod model;
mod oracle;
mod path;
mod phantom;
mod tracker;
mod wire;

use bon::Builder;
use tracing::instrument;

pub use change::{Action, ChangeDetails, FileChange};
pub use diagnostics::{Diagnostic, Severity};
pub use error::{Error, Result};
pub use model::EntryKind;
pub use oracle::{NewSnapshotOracle, OldSnapshotOracle};
pub use path::RawPath;
pub use wire::{AttributeMap, CommandKind, CommandRecord, Decoder, Kind, MAGIC};

#[cfg(any(test, feature = "test-util"))]
pub use oracle::test_support;

use classify::Effect;
use tracker::Tracker;

/// send-stream format versions this crate decodes by default (§4.1).
pub const DEFAULT_SUPPORTED_VERSIONS: &[u32] = &[1, 2];

/// Cooperative cancellation, checked by the decoder at each command boundary, never inside one
/// (§5). `()` is a permanent no-op implementation for callers that don't need cancellation.
pub trait CancellationToken {
    fn is_cancelled(&self) -> bool;
}

impl CancellationToken for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Configuration for [`parse`] (§4.6).
#[derive(Debug, Clone, Builder)]
pub struct Options {
    /// Verify each command's CRC as it's decoded (§4.1). Off by default: the caller usually
    /// already trusts the pipe `btrfs send` wrote to.
    #[builder(default = false)]
    pub verify_crc: bool,

    /// Envelope versions this parse will accept (§4.1).
    #[builder(default = DEFAULT_SUPPORTED_VERSIONS.to_vec())]
    pub supported_versions: Vec<u32>,

    /// Emit a `modified` record for inodes touched only by metadata commands
    /// (`chmod`/`chown`/`utimes`/`set_xattr`/`remove_xattr`), with no other effect (§4.2, §4.4
    /// rule 6). Off by default, matching the spec's "no output unless something else changed".
    #[builder(default = false)]
    pub emit_metadata_only_changes: bool,

    /// Promote soft failures (unknown command kinds, tracker invariant violations) to hard
    /// errors instead of diagnostics (§7).
    #[builder(default = false)]
    pub strict: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options::builder().build()
    }
}

/// Soft failures collected during a parse, returned alongside the change list (§7).
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Apply one classified effect to the tracker. Returns `true` once `end` has been applied.
fn apply_effect(
    tracker: &mut Tracker,
    effect: Effect,
    new_oracle: &dyn NewSnapshotOracle,
    options: &Options,
) -> Result<bool> {
    match effect {
        Effect::SetStreamRoot => {}
        Effect::Create { ino, kind, path, command } => {
            tracker.allocate(ino, kind, path, command)?;
        }
        Effect::Symlink { ino, path, target } => {
            tracker.create_symlink(ino, path, target)?;
        }
        Effect::Link { new_path, existing_path } => {
            tracker.link(&existing_path, new_path, new_oracle)?;
        }
        Effect::Unlink { path } => {
            tracker.unlink(&path, new_oracle)?;
        }
        Effect::Rmdir { path } => {
            tracker.rmdir(&path, new_oracle)?;
        }
        Effect::Rename { from, to } => {
            tracker.rename(&from, to, new_oracle)?;
        }
        Effect::ContentDirty { path, command, size } => {
            tracker.touch_content(&path, command, size, new_oracle)?;
        }
        Effect::MetadataOnly { path, command } => {
            if options.emit_metadata_only_changes {
                tracker.touch_metadata(&path, command, new_oracle)?;
            }
        }
        Effect::Terminate => return Ok(true),
        Effect::Unknown(_) => {}
    }
    Ok(false)
}

/// Parse a send-stream into the canonical set of changes between `OLD` and `NEW` (§4.6).
///
/// `old_oracle` and `new_oracle` are the only way this crate ever touches a real filesystem
/// (§6); everything else is pure decoding over `bytes`. `cancellation` is polled once per
/// command boundary (§5) so a caller driving this from an async context can abort a parse
/// that's taking too long without tearing down a thread.
#[instrument(skip_all, fields(len = bytes.len(), verify_crc = options.verify_crc))]
pub fn parse(
    bytes: &[u8],
    old_oracle: &dyn OldSnapshotOracle,
    new_oracle: &dyn NewSnapshotOracle,
    options: &Options,
    cancellation: &dyn CancellationToken,
) -> Result<(Vec<FileChange>, Diagnostics)> {
    let decoder = wire::Decoder::new(bytes, options.verify_crc, &options.supported_versions)?;
    let mut tracker = Tracker::new(options.strict);

    for record in decoder {
        if cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let record = record?;
        tracing::trace!(offset = record.offset, kind = %record.kind, "decoded command");

        let effect = classify::classify(&record, options.strict)?;
        if let Effect::Unknown(diagnostic) = &effect {
            tracing::warn!(message = %diagnostic.message, "unknown command kind");
        }
        let terminated = apply_effect(&mut tracker, effect, new_oracle, options)?;
        if terminated {
            break;
        }
    }

    let mut diagnostics = tracker.take_diagnostics();
    let changes = aggregate::aggregate(&tracker, options.emit_metadata_only_changes);
    tracing::debug!(inodes = tracker.inodes().count(), changes = changes.len(), "aggregated model");

    let (changes, phantom_diagnostics) = phantom::filter(changes, old_oracle, new_oracle);
    diagnostics.extend(phantom_diagnostics);

    Ok((changes, Diagnostics(diagnostics)))
}
