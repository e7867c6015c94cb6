//! Output records (§3): the only thing a caller of [`crate::parse`] actually sees.

use serde::Serialize;

use crate::path::RawPath;
use crate::wire::CommandKind;

/// What happened to a path between OLD and NEW.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Action {
    // Ordered `deleted < renamed < modified` to match the tie-break in §4.4's sort.
    Deleted,
    Renamed,
    Modified,
}

/// The `details` object attached to every [`FileChange`] (§3).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeDetails {
    /// The low-level command that best describes the change, per the priority rule in §4.2.
    pub command: Option<CommandKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_to: Option<RawPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_link: Option<RawPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inode: Option<u64>,
    /// Tri-valued: `Some(true)`/`Some(false)` when the kind is known, `None` when the stream
    /// gave no signal (§3).
    pub is_directory: Option<bool>,
}

/// One reconstructed change between OLD and NEW (§3).
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
    pub path: RawPath,
    pub action: Action,
    pub details: ChangeDetails,
}

impl FileChange {
    /// Sort key matching §4.4's "Records are sorted by `(path, action)`" rule; `Action`'s
    /// derived `Ord` already encodes the `deleted < renamed < modified` tie-break.
    pub(crate) fn sort_key(&self) -> (&RawPath, Action) {
        (&self.path, self.action)
    }
}
