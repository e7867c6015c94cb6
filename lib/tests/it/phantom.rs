//! Black-box coverage of the phantom filter (§4.5), driven entirely through `parse`.

use sendstream_delta::test_support::{FailingOracle, FakeSnapshot};
use sendstream_delta::{Action, CommandKind, EntryKind, Options};

use crate::support::*;

#[test]
fn real_deletion_survives_the_filter() {
    let bytes = stream(1, vec![command(CommandKind::Unlink, path_attr(TAG_PATH, "real")), command(CommandKind::End, Vec::new())]);

    let old = FakeSnapshot::new().with("real", EntryKind::Regular);
    let new = FakeSnapshot::new();
    let (changes, diagnostics) = sendstream_delta::parse(&bytes, &old, &new, &Options::default(), &()).expect("parses");

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].action, Action::Deleted);
    assert!(diagnostics.0.is_empty());
}

#[test]
fn oracle_failure_keeps_the_record_fail_open() {
    let bytes = stream(1, vec![command(CommandKind::Unlink, path_attr(TAG_PATH, "x")), command(CommandKind::End, Vec::new())]);

    let (changes, diagnostics) =
        sendstream_delta::parse(&bytes, &FailingOracle, &FailingOracle, &Options::default(), &()).expect("parses");

    assert_eq!(changes.len(), 1);
    assert!(!diagnostics.0.is_empty());
}
