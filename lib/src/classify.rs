//! The Command Classifier (§4.2).
//!
//! A static, pure mapping from a decoded [`CommandRecord`] to an [`Effect`] describing how the
//! tracker's model should change. Doesn't touch the model itself — that's [`crate::tracker`]'s
//! job — which keeps the "what a command means" question separate from "how the running state
//! changes", and makes the priority table below the only place command precedence is encoded.

use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::model::EntryKind;
use crate::path::RawPath;
use crate::wire::{CommandKind, CommandRecord, Kind};

/// What a single command means for the tracker's model.
#[derive(Debug, Clone)]
pub enum Effect {
    /// `subvol`/`snapshot`: establishes the stream's root subvolume. Carries no path of its
    /// own kind-wise; the aggregator never emits a [`crate::change::FileChange`] for it.
    SetStreamRoot,

    /// `mkfile`/`mkdir`/`mknod`/`mkfifo`/`mksock`: a brand new inode, named by a (likely
    /// temporary, §4.3) path.
    Create {
        ino: u64,
        kind: EntryKind,
        path: RawPath,
        command: CommandKind,
    },

    /// `symlink`: a new inode with a recorded link target.
    Symlink {
        ino: u64,
        path: RawPath,
        target: RawPath,
    },

    /// `link`: attach whatever inode currently owns `existing_path` to a new name.
    Link {
        new_path: RawPath,
        existing_path: RawPath,
    },

    /// `unlink`: detach a path from its inode.
    Unlink { path: RawPath },

    /// `rmdir`: detach a path from its inode; the inode must be a directory.
    Rmdir { path: RawPath },

    /// `rename`: move a path from one name to another, inode identity preserved.
    Rename { from: RawPath, to: RawPath },

    /// `write`/`clone`/`update_extent`/`truncate`: content changed.
    ContentDirty {
        path: RawPath,
        command: CommandKind,
        size: Option<u64>,
    },

    /// `chmod`/`chown`/`utimes`/`set_xattr`/`remove_xattr`: metadata only, no direct change
    /// unless a stronger effect already applies to this inode (§4.2).
    MetadataOnly { path: RawPath, command: CommandKind },

    /// `end`: terminates processing.
    Terminate,

    /// An unknown command kind, outside strict mode: recorded and otherwise ignored.
    Unknown(Diagnostic),
}

/// Relative precedence used when the aggregator picks a `details.command` label for an inode
/// touched by more than one command (§4.2): lower rank wins.
///
/// `clone` isn't mentioned by name in the spec's priority list; it's ranked alongside the other
/// extent-level content commands, above plain `write`, since it (like `update_extent`) names an
/// explicit byte range rather than appending un-ranged data.
pub fn command_priority(command: CommandKind) -> u8 {
    use CommandKind::*;
    match command {
        Symlink => 0,
        Mkfile | Mkdir | Mknod | Mkfifo | Mksock => 1,
        UpdateExtent => 2,
        Truncate => 3,
        Clone => 4,
        Write => 5,
        Chmod | Chown | Utimes | SetXattr | RemoveXattr => 6,
        // Rename/Unlink/Rmdir/Subvol/Snapshot/End never compete for a content label.
        Rename | Unlink | Rmdir | Subvol | Snapshot | End => u8::MAX,
    }
}

fn required_path(command: CommandKind, record: &CommandRecord) -> Result<RawPath> {
    record.attributes.path().ok_or_else(|| Error::MalformedStream {
        reason: format!("{} missing required `path` attribute", command.as_ref()),
    })
}

fn required_ino(command: CommandKind, record: &CommandRecord) -> Result<u64> {
    record.attributes.ino().ok_or_else(|| Error::MalformedStream {
        reason: format!("{} missing required `ino` attribute", command.as_ref()),
    })
}

/// Classify one decoded command into the effect the tracker should apply.
///
/// `strict_unknown` corresponds to [`crate::Options::strict`]: when set, a code outside the
/// known table is a hard [`Error::UnknownCommand`] instead of [`Effect::Unknown`].
pub fn classify(record: &CommandRecord, strict_unknown: bool) -> Result<Effect> {
    let known = match record.kind {
        Kind::Known(kind) => kind,
        Kind::Unknown(code) => {
            if strict_unknown {
                return Err(Error::UnknownCommand {
                    offset: record.offset,
                    kind: code,
                });
            }
            return Ok(Effect::Unknown(Diagnostic::info(format!(
                "unknown command kind {code} at offset {}",
                record.offset
            ))));
        }
    };

    use CommandKind::*;
    Ok(match known {
        Subvol | Snapshot => Effect::SetStreamRoot,

        Mkfile => Effect::Create {
            ino: required_ino(known, record)?,
            kind: EntryKind::Regular,
            path: required_path(known, record)?,
            command: known,
        },
        Mkdir => Effect::Create {
            ino: required_ino(known, record)?,
            kind: EntryKind::Directory,
            path: required_path(known, record)?,
            command: known,
        },
        Mknod | Mkfifo | Mksock => Effect::Create {
            ino: required_ino(known, record)?,
            kind: EntryKind::Special,
            path: required_path(known, record)?,
            command: known,
        },

        Symlink => Effect::Symlink {
            ino: required_ino(known, record)?,
            path: required_path(known, record)?,
            target: record.attributes.path_link().ok_or_else(|| Error::MalformedStream {
                reason: "symlink missing required `path_link` attribute".to_string(),
            })?,
        },

        Link => Effect::Link {
            new_path: required_path(known, record)?,
            existing_path: record.attributes.path_link().ok_or_else(|| Error::MalformedStream {
                reason: "link missing required `path_link` attribute".to_string(),
            })?,
        },

        Unlink => Effect::Unlink {
            path: required_path(known, record)?,
        },
        Rmdir => Effect::Rmdir {
            path: required_path(known, record)?,
        },

        Rename => Effect::Rename {
            from: required_path(known, record)?,
            to: record.attributes.path_to().ok_or_else(|| Error::MalformedStream {
                reason: "rename missing required `path_to` attribute".to_string(),
            })?,
        },

        Write | UpdateExtent => Effect::ContentDirty {
            path: required_path(known, record)?,
            command: known,
            size: record.attributes.size().or_else(|| {
                record
                    .attributes
                    .file_offset()
                    .zip(record.attributes.data().map(|d| d.len() as u64))
                    .map(|(offset, len)| offset + len)
            }),
        },
        Clone => Effect::ContentDirty {
            path: required_path(known, record)?,
            command: known,
            // `size` isn't carried directly by `clone`; fall back to the cloned range's extent
            // (§4.2, §6: "update size if provided").
            size: record.attributes.size().or_else(|| {
                record
                    .attributes
                    .clone_offset()
                    .zip(record.attributes.clone_len())
                    .map(|(offset, len)| offset + len)
            }),
        },
        Truncate => Effect::ContentDirty {
            path: required_path(known, record)?,
            command: known,
            size: record.attributes.size(),
        },

        Chmod | Chown | Utimes | SetXattr | RemoveXattr => Effect::MetadataOnly {
            path: required_path(known, record)?,
            command: known,
        },

        End => Effect::Terminate,
    })
}
