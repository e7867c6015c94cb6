//! The Change Aggregator (§4.4).
//!
//! Runs once, at end-of-stream: walks every tracked inode and turns its final state into zero
//! or one logical outcomes. Never looks at individual commands — by the time this runs, the
//! tracker has already collapsed the whole command sequence into per-inode state.

use crate::change::{Action, ChangeDetails, FileChange};
use crate::classify::command_priority;
use crate::ext::PriorityFind;
use crate::model::EntryKind;
use crate::tracker::{InodeState, Tracker};
use crate::wire::CommandKind;

fn command_for_removal(kind: EntryKind) -> CommandKind {
    if kind == EntryKind::Directory {
        CommandKind::Rmdir
    } else {
        CommandKind::Unlink
    }
}

fn is_directory(kind: EntryKind) -> Option<bool> {
    EntryKind::is_directory(kind)
}

fn source_inode(ino: u64, state: &InodeState) -> Option<u64> {
    state.created_in_stream.then_some(ino)
}

/// The label to put in `details.command` (§4.2's priority table), picked with the same
/// `priority_find` the rest of this crate's corpus uses for "best candidate by rank".
fn best_command(state: &InodeState) -> Option<CommandKind> {
    state.commands.iter().copied().priority_find(|command| command_priority(*command) as usize)
}

/// One inode's contribution to the output, §4.4 rules 1-6.
fn changes_for_inode(ino: u64, state: &InodeState, emit_metadata_only_changes: bool) -> Vec<FileChange> {
    let deleted = state.deleted();

    // Rule 2: created and destroyed within one delta — net no-op (§8 invariant 7).
    if deleted && state.created_in_stream {
        return Vec::new();
    }

    // Rule 1: a pre-existing inode with no paths left.
    if deleted {
        let Some(path) = state.origin_path.clone() else {
            return Vec::new();
        };
        return vec![FileChange {
            path,
            action: Action::Deleted,
            details: ChangeDetails {
                command: Some(command_for_removal(state.kind)),
                is_directory: is_directory(state.kind),
                inode: source_inode(ino, state),
                ..Default::default()
            },
        }];
    }

    // Rule 3 & 4: content changed, one way or another.
    if state.created_in_stream || state.content_dirty {
        let Some(path) = state.primary_path.clone() else {
            return Vec::new();
        };
        let command = best_command(state);
        return vec![FileChange {
            path,
            action: Action::Modified,
            details: ChangeDetails {
                command,
                size: state.size,
                path_link: state.symlink_target.clone(),
                is_directory: is_directory(state.kind),
                inode: source_inode(ino, state),
                ..Default::default()
            },
        }];
    }

    // Rule 5: the attached-path set moved without any content change. `origin_path` stands in
    // for "the OLD-snapshot path set" (§4.3's single-name approximation for pre-existing
    // inodes, documented in DESIGN.md). Rule 6 (pure metadata touch, no path movement) falls
    // out of this naturally: if nothing moved, the loop below produces no changes at all.
    let mut old_paths: Vec<_> = state.origin_path.iter().cloned().collect();
    let mut new_paths: Vec<_> = state.all_paths.iter().cloned().collect();
    old_paths.sort();
    new_paths.sort();

    let removed: Vec<_> = old_paths.iter().filter(|p| !state.all_paths.contains(*p)).cloned().collect();
    let origin = state.origin_path.as_ref();
    let added: Vec<_> = new_paths.iter().filter(|p| Some(*p) != origin).cloned().collect();

    if removed.is_empty() && added.is_empty() {
        // Rule 6: nothing moved. A metadata-only touch produces a record only when the caller
        // opted in via `Options::emit_metadata_only_changes` (§4.2, §4.4 rule 6's "no output
        // unless something else changed" default).
        if emit_metadata_only_changes && state.metadata_dirty {
            let Some(path) = state.primary_path.clone() else {
                return Vec::new();
            };
            return vec![FileChange {
                path,
                action: Action::Modified,
                details: ChangeDetails {
                    command: best_command(state),
                    is_directory: is_directory(state.kind),
                    inode: source_inode(ino, state),
                    ..Default::default()
                },
            }];
        }
        return Vec::new();
    }

    let mut out = Vec::new();
    let paired = removed.len().min(added.len());
    for (from, to) in removed.iter().take(paired).zip(added.iter().take(paired)) {
        out.push(FileChange {
            path: from.clone(),
            action: Action::Renamed,
            details: ChangeDetails {
                command: Some(CommandKind::Rename),
                path_to: Some(to.clone()),
                is_directory: is_directory(state.kind),
                inode: source_inode(ino, state),
                ..Default::default()
            },
        });
    }
    for from in &removed[paired..] {
        out.push(FileChange {
            path: from.clone(),
            action: Action::Deleted,
            details: ChangeDetails {
                command: Some(command_for_removal(state.kind)),
                is_directory: is_directory(state.kind),
                inode: source_inode(ino, state),
                ..Default::default()
            },
        });
    }
    for to in &added[paired..] {
        out.push(FileChange {
            path: to.clone(),
            action: Action::Modified,
            details: ChangeDetails {
                command: best_command(state).or(Some(CommandKind::Rename)),
                is_directory: is_directory(state.kind),
                inode: source_inode(ino, state),
                ..Default::default()
            },
        });
    }
    out
}

/// Walk the tracker's final model and produce the ordered change list (§4.4).
///
/// `emit_metadata_only_changes` mirrors [`crate::Options`] of the same name: whether an inode
/// touched only by a metadata command, with no content or path change, should surface as an
/// empty-details `Modified` record (rule 6) instead of being dropped.
pub fn aggregate(tracker: &Tracker, emit_metadata_only_changes: bool) -> Vec<FileChange> {
    let mut changes: Vec<FileChange> = tracker
        .inodes()
        .flat_map(|(ino, state)| changes_for_inode(ino, state, emit_metadata_only_changes))
        .collect();

    changes.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    changes
}
