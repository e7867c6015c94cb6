//! Small shared types used across the tracker, classifier and aggregator.

use serde::Serialize;

/// What kind of filesystem entry an inode is.
///
/// `Unknown` only ever appears for inodes the stream references but never creates, before
/// their kind has been resolved against the NEW-snapshot oracle (§4.3).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Special,
    Unknown,
}

impl EntryKind {
    /// `details.is_directory` is tri-valued (§3); this is the non-`Unknown` collapse.
    pub fn is_directory(self) -> Option<bool> {
        match self {
            Self::Directory => Some(true),
            Self::Unknown => None,
            _ => Some(false),
        }
    }
}
