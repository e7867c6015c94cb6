//! Literal scenarios S1-S6, run through the public `parse` entry point end to end.

use sendstream_delta::test_support::FakeSnapshot;
use sendstream_delta::{Action, CommandKind, EntryKind, Options, RawPath};

use crate::support::*;

fn rp(s: &str) -> RawPath {
    RawPath::new(s.as_bytes().to_vec())
}

#[test]
fn s1_single_modification() {
    let bytes = stream(
        1,
        vec![
            command(CommandKind::Mkfile, [tlv(TAG_INO, &10u64.to_le_bytes()), path_attr(TAG_PATH, "a")].concat()),
            command(
                CommandKind::Truncate,
                [path_attr(TAG_PATH, "a"), tlv(TAG_SIZE, &4u64.to_le_bytes())].concat(),
            ),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old = FakeSnapshot::new();
    let new = FakeSnapshot::new().with("a", EntryKind::Regular);
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, rp("a"));
    assert_eq!(changes[0].action, Action::Modified);
    assert_eq!(changes[0].details.command, Some(CommandKind::Mkfile));
    assert_eq!(changes[0].details.size, Some(4));
    assert_eq!(changes[0].details.is_directory, Some(false));
    assert_eq!(changes[0].details.inode, Some(10));
}

#[test]
fn s2_simple_rename() {
    let bytes = stream(
        1,
        vec![
            command(CommandKind::Rename, [path_attr(TAG_PATH, "o10-1-0"), path_attr(TAG_PATH_TO, "b")].concat()),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old = FakeSnapshot::new().with("o10-1-0", EntryKind::Regular);
    let new = FakeSnapshot::new().with("b", EntryKind::Regular);
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, rp("o10-1-0"));
    assert_eq!(changes[0].action, Action::Renamed);
    assert_eq!(changes[0].details.path_to, Some(rp("b")));
}

#[test]
fn s3_circular_rename_chain_yields_three_ordered_renames() {
    let bytes = stream(
        1,
        vec![
            command(CommandKind::Rename, [path_attr(TAG_PATH, "A"), path_attr(TAG_PATH_TO, "tmp")].concat()),
            command(CommandKind::Rename, [path_attr(TAG_PATH, "C"), path_attr(TAG_PATH_TO, "A")].concat()),
            command(CommandKind::Rename, [path_attr(TAG_PATH, "B"), path_attr(TAG_PATH_TO, "C")].concat()),
            command(CommandKind::Rename, [path_attr(TAG_PATH, "tmp"), path_attr(TAG_PATH_TO, "B")].concat()),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old = FakeSnapshot::new()
        .with("A", EntryKind::Regular)
        .with("B", EntryKind::Regular)
        .with("C", EntryKind::Regular);
    let new = FakeSnapshot::new()
        .with("A", EntryKind::Regular)
        .with("B", EntryKind::Regular)
        .with("C", EntryKind::Regular);
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    let renamed: Vec<_> = changes
        .iter()
        .map(|c| (c.path.clone(), c.details.path_to.clone().expect("path_to")))
        .collect();
    assert_eq!(renamed, vec![(rp("A"), rp("B")), (rp("B"), rp("C")), (rp("C"), rp("A"))]);
}

#[test]
fn s4_create_then_delete_is_a_no_op() {
    let bytes = stream(
        1,
        vec![
            command(CommandKind::Mkfile, [tlv(TAG_INO, &20u64.to_le_bytes()), path_attr(TAG_PATH, "x")].concat()),
            command(CommandKind::Unlink, path_attr(TAG_PATH, "x")),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old = FakeSnapshot::new();
    let new = FakeSnapshot::new();
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");
    assert!(changes.is_empty());
}

#[test]
fn s5_phantom_deletion_is_filtered_with_a_diagnostic() {
    let bytes = stream(
        1,
        vec![command(CommandKind::Unlink, path_attr(TAG_PATH, "ghost")), command(CommandKind::End, Vec::new())],
    );

    let old = FakeSnapshot::new();
    let new = FakeSnapshot::new();
    let (changes, diagnostics) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    assert!(changes.is_empty());
    assert_eq!(diagnostics.0.len(), 1);
}

#[test]
fn metadata_only_touch_is_suppressed_by_default_but_emitted_when_opted_in() {
    let bytes = stream(1, vec![command(CommandKind::Chmod, path_attr(TAG_PATH, "a")), command(CommandKind::End, Vec::new())]);

    let old = FakeSnapshot::new().with("a", EntryKind::Regular);
    let new = FakeSnapshot::new().with("a", EntryKind::Regular);

    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");
    assert!(changes.is_empty());

    let options = Options::builder().emit_metadata_only_changes(true).build();
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &options, &()).expect("parses");
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, Action::Modified);
    assert_eq!(changes[0].path, rp("a"));
    assert_eq!(changes[0].details.command, Some(CommandKind::Chmod));
}

#[test]
fn s6_symlink() {
    let bytes = stream(
        1,
        vec![
            command(
                CommandKind::Symlink,
                [tlv(TAG_INO, &30u64.to_le_bytes()), path_attr(TAG_PATH, "lnk"), path_attr(TAG_PATH_LINK, "../t")].concat(),
            ),
            command(CommandKind::End, Vec::new()),
        ],
    );

    let old = FakeSnapshot::new();
    let new = FakeSnapshot::new().with("lnk", EntryKind::Symlink);
    let (changes, _) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, rp("lnk"));
    assert_eq!(changes[0].action, Action::Modified);
    assert_eq!(changes[0].details.command, Some(CommandKind::Symlink));
    assert_eq!(changes[0].details.path_link, Some(rp("../t")));
    assert_eq!(changes[0].details.is_directory, Some(false));
    assert_eq!(changes[0].details.inode, Some(30));
}
