//! The round-trip laws from §8: applying the emitted changes to OLD must reproduce NEW's path
//! set, and parsing two consecutive deltas must agree with parsing their combination (checked on
//! final path sets, not individual records, per the spec's own equivalence definition).

use std::collections::BTreeSet;

use sendstream_delta::test_support::FakeSnapshot;
use sendstream_delta::{Action, CommandKind, EntryKind, FileChange, Options};

use crate::support::*;

/// Apply an ordered change list to a path set the way the spec's round-trip law describes:
/// `deleted` before `renamed` before `modified` (already the sort order `parse` returns).
fn apply(mut paths: BTreeSet<String>, changes: &[FileChange]) -> BTreeSet<String> {
    for change in changes {
        let path = change.path.display_lossy().into_owned();
        match change.action {
            Action::Deleted => {
                paths.remove(&path);
            }
            Action::Renamed => {
                paths.remove(&path);
                if let Some(to) = &change.details.path_to {
                    paths.insert(to.display_lossy().into_owned());
                }
            }
            Action::Modified => {
                paths.insert(path);
            }
        }
    }
    paths
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn applying_changes_to_old_reproduces_new_path_set() {
    let bytes = stream(
        1,
        vec![
            command(CommandKind::Rename, [path_attr(TAG_PATH, "a"), path_attr(TAG_PATH_TO, "a_renamed")].concat()),
            command(CommandKind::Mkfile, [tlv(TAG_INO, &1u64.to_le_bytes()), path_attr(TAG_PATH, "c")].concat()),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old = FakeSnapshot::new().with("a", EntryKind::Regular).with("b", EntryKind::Regular);
    let new = FakeSnapshot::new()
        .with("a_renamed", EntryKind::Regular)
        .with("b", EntryKind::Regular)
        .with("c", EntryKind::Regular);
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    let result = apply(set(&["a", "b"]), &changes);
    assert_eq!(result, set(&["a_renamed", "b", "c"]));
}

#[test]
fn parsing_two_consecutive_deltas_agrees_with_parsing_their_combination_on_final_path_set() {
    let a_to_b = stream(
        1,
        vec![
            command(CommandKind::Rename, [path_attr(TAG_PATH, "x"), path_attr(TAG_PATH_TO, "y")].concat()),
            command(CommandKind::End, Vec::new()),
        ],
    );
    let b_to_c = stream(
        1,
        vec![
            command(CommandKind::Rename, [path_attr(TAG_PATH, "y"), path_attr(TAG_PATH_TO, "z")].concat()),
            command(CommandKind::Mkfile, [tlv(TAG_INO, &2u64.to_le_bytes()), path_attr(TAG_PATH, "w")].concat()),
            command(CommandKind::End, Vec::new()),
        ],
    );
    let a_to_c = stream(
        1,
        vec![
            command(CommandKind::Rename, [path_attr(TAG_PATH, "x"), path_attr(TAG_PATH_TO, "z")].concat()),
            command(CommandKind::Mkfile, [tlv(TAG_INO, &2u64.to_le_bytes()), path_attr(TAG_PATH, "w")].concat()),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old_a = FakeSnapshot::new().with("x", EntryKind::Regular);
    let new_b = FakeSnapshot::new().with("y", EntryKind::Regular);
    let (changes_ab, _) = sendstream_delta::parse(&a_to_b, &old_a, &new_b, &Options::default(), &()).expect("parses");

    let old_b = FakeSnapshot::new().with("y", EntryKind::Regular);
    let new_c = FakeSnapshot::new().with("z", EntryKind::Regular).with("w", EntryKind::Regular);
    let (changes_bc, _) = sendstream_delta::parse(&b_to_c, &old_b, &new_c, &Options::default(), &()).expect("parses");

    let old_direct = FakeSnapshot::new().with("x", EntryKind::Regular);
    let new_direct = FakeSnapshot::new().with("z", EntryKind::Regular).with("w", EntryKind::Regular);
    let (changes_ac, _) = sendstream_delta::parse(&a_to_c, &old_direct, &new_direct, &Options::default(), &()).expect("parses");

    let via_chain = apply(apply(set(&["x"]), &changes_ab), &changes_bc);
    let via_direct = apply(set(&["x"]), &changes_ac);
    assert_eq!(via_chain, via_direct);
}
