//! The Phantom Filter (§4.5).
//!
//! The very last pass before a change list reaches the caller. Two known stream-generation bugs
//! can make the aggregator emit records for something that was never a real difference between
//! OLD and NEW; this filter asks the oracles to confirm each suspect record and drops the ones
//! they refute. Any oracle failure keeps the record — fail-open, per §4.5 and §7.

use crate::change::{Action, FileChange};
use crate::diagnostics::Diagnostic;
use crate::oracle::{NewSnapshotOracle, OldSnapshotOracle};
use crate::wire::CommandKind;

/// Filter `changes` in place, returning the diagnostics produced by dropped or reclassified
/// records. `changes` retains its relative order; a dropped record is simply removed.
pub fn filter(
    changes: Vec<FileChange>,
    old_oracle: &dyn OldSnapshotOracle,
    new_oracle: &dyn NewSnapshotOracle,
) -> (Vec<FileChange>, Vec<Diagnostic>) {
    let mut diagnostics = Vec::new();
    let mut out = Vec::with_capacity(changes.len());

    for mut change in changes {
        if change.action == Action::Deleted && !keep_deleted(&change, old_oracle, &mut diagnostics) {
            continue;
        }

        if change.action == Action::Modified && change.details.command == Some(CommandKind::Symlink) {
            match new_oracle.new_exists(&change.path) {
                Ok(true) => {}
                Ok(false) => {
                    diagnostics.push(
                        Diagnostic::warning("phantom symlink modification reclassified as deleted")
                            .with_path(change.path.clone()),
                    );
                    change.action = Action::Deleted;
                    change.details.path_link = None;
                    change.details.command = Some(CommandKind::Unlink);
                    if !keep_deleted(&change, old_oracle, &mut diagnostics) {
                        continue;
                    }
                }
                Err(err) => {
                    diagnostics.push(
                        Diagnostic::warning(format!("new-snapshot oracle failed, keeping record: {err}"))
                            .with_path(change.path.clone()),
                    );
                }
            }
        }

        out.push(change);
    }

    (out, diagnostics)
}

fn keep_deleted(change: &FileChange, old_oracle: &dyn OldSnapshotOracle, diagnostics: &mut Vec<Diagnostic>) -> bool {
    match old_oracle.old_exists(&change.path) {
        Ok(true) => true,
        Ok(false) => {
            diagnostics.push(Diagnostic::warning("phantom deletion filtered").with_path(change.path.clone()));
            false
        }
        Err(err) => {
            diagnostics.push(
                Diagnostic::warning(format!("old-snapshot oracle failed, keeping record: {err}"))
                    .with_path(change.path.clone()),
            );
            true
        }
    }
}
