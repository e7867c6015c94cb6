//! Byte-string paths.
//!
//! btrfs permits path names that are not valid UTF-8. Storing them as `String`/`PathBuf`
//! would force a lossy conversion the moment the stream handed us a name; instead paths are
//! kept as the raw bytes the stream encoded, and only converted to an [`OsStr`] for display
//! or for handing to the outside world (oracles, CLI output).

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use bytes::Bytes;

/// An immutable, hashable, orderable path, stored as raw bytes.
///
/// Ordering is byte-lexicographic, which is what [the aggregator](crate::aggregate) relies on
/// when it pairs up detaches and attaches or picks a primary path (§4.3, §4.4.5).
#[derive(Clone, Eq, derive_more::From)]
pub struct RawPath(Bytes);

impl From<&'static str> for RawPath {
    fn from(s: &'static str) -> Self {
        Self(Bytes::from(s))
    }
}

impl RawPath {
    /// Build a path from any byte source (a TLV payload, a `&str`, ...).
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// The raw bytes, exactly as the stream encoded them.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View this path the way the local filesystem would: as an [`OsStr`]-backed [`Path`].
    ///
    /// On Linux, `OsStr` is just a wrapper around arbitrary bytes, so this is lossless.
    pub fn as_path(&self) -> &Path {
        Path::new(std::ffi::OsStr::from_bytes(&self.0))
    }

    /// Join this path onto a root directory, for oracles that check a real filesystem.
    pub fn resolve_under(&self, root: &Path) -> std::path::PathBuf {
        root.join(self.as_path())
    }

    /// Best-effort display form; invalid UTF-8 is replaced, never panics.
    pub fn display_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl PartialEq for RawPath {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Hash for RawPath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for RawPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RawPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.as_ref().cmp(other.0.as_ref())
    }
}

impl fmt::Debug for RawPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.display_lossy())
    }
}

impl fmt::Display for RawPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_lossy())
    }
}

impl serde::Serialize for RawPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.display_lossy())
    }
}
