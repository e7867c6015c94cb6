//! Oracles (§6): the only points where this crate touches a real filesystem.
//!
//! Every oracle call is injected by the caller and expected to be an O(1) lookup — typically a
//! `stat`/`lstat` or a lookup against a pre-scanned directory listing. The tracker and the
//! phantom filter are the only consumers; neither ever calls an oracle more than once per path.
//! Calls are fallible so a real, `std::io::Error`-backed implementation has somewhere to put an
//! I/O failure; the phantom filter treats any `Err` as fail-open (§4.5, §7).

use crate::model::EntryKind;
use crate::path::RawPath;

/// Answers existence questions against the OLD snapshot.
pub trait OldSnapshotOracle {
    /// Does `path` exist in the OLD snapshot tree?
    fn old_exists(&self, path: &RawPath) -> std::io::Result<bool>;
}

/// Answers existence and kind questions against the NEW snapshot.
pub trait NewSnapshotOracle {
    /// Does `path` exist in the NEW snapshot tree?
    fn new_exists(&self, path: &RawPath) -> std::io::Result<bool>;

    /// The kind of the entry at `path` in the NEW snapshot tree, used to resolve `kind` for
    /// inodes the stream references but never creates (§4.3).
    fn new_kind(&self, path: &RawPath) -> std::io::Result<EntryKind>;
}

impl<T: OldSnapshotOracle + ?Sized> OldSnapshotOracle for &T {
    fn old_exists(&self, path: &RawPath) -> std::io::Result<bool> {
        (**self).old_exists(path)
    }
}

impl<T: NewSnapshotOracle + ?Sized> NewSnapshotOracle for &T {
    fn new_exists(&self, path: &RawPath) -> std::io::Result<bool> {
        (**self).new_exists(path)
    }

    fn new_kind(&self, path: &RawPath) -> std::io::Result<EntryKind> {
        (**self).new_kind(path)
    }
}

/// In-memory oracle test doubles (§9: "a test double that returns constant booleans is
/// sufficient to exercise every path"), shared between this crate's unit tests and the
/// black-box `tests/it` suite via the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
pub mod test_support {
    use std::collections::HashMap;

    use super::*;

    /// A fixed snapshot tree: a set of existing paths, plus kinds for a subset of them.
    #[derive(Debug, Clone, Default)]
    pub struct FakeSnapshot {
        paths: HashMap<RawPath, EntryKind>,
    }

    impl FakeSnapshot {
        pub fn new() -> Self {
            Self::default()
        }

        /// Record that `path` exists in this snapshot with the given kind.
        pub fn with(mut self, path: impl Into<RawPath>, kind: EntryKind) -> Self {
            self.paths.insert(path.into(), kind);
            self
        }
    }

    impl OldSnapshotOracle for FakeSnapshot {
        fn old_exists(&self, path: &RawPath) -> std::io::Result<bool> {
            Ok(self.paths.contains_key(path))
        }
    }

    impl NewSnapshotOracle for FakeSnapshot {
        fn new_exists(&self, path: &RawPath) -> std::io::Result<bool> {
            Ok(self.paths.contains_key(path))
        }

        fn new_kind(&self, path: &RawPath) -> std::io::Result<EntryKind> {
            Ok(self.paths.get(path).copied().unwrap_or(EntryKind::Unknown))
        }
    }

    /// An oracle that always errors, for exercising fail-open behavior (§4.5, §7).
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FailingOracle;

    fn oracle_broke() -> std::io::Error {
        std::io::Error::other("fake oracle failure")
    }

    impl OldSnapshotOracle for FailingOracle {
        fn old_exists(&self, _path: &RawPath) -> std::io::Result<bool> {
            Err(oracle_broke())
        }
    }

    impl NewSnapshotOracle for FailingOracle {
        fn new_exists(&self, _path: &RawPath) -> std::io::Result<bool> {
            Err(oracle_broke())
        }

        fn new_kind(&self, _path: &RawPath) -> std::io::Result<EntryKind> {
            Err(oracle_broke())
        }
    }
}
