//! Typed errors for the core parser (§7).
//!
//! Every variant here is a *hard* error: callers get it back from [`crate::parse`] instead of
//! a change list, and whatever had been built up so far is discarded. Soft failures never reach
//! this type; they accumulate as [`crate::diagnostics::Diagnostic`]s alongside a successful result.

use thiserror::Error;

/// A hard failure while parsing a send-stream.
#[derive(Debug, Error)]
pub enum Error {
    /// The envelope or command framing doesn't match the wire format (§4.1).
    #[error("malformed send-stream: {reason}")]
    MalformedStream { reason: String },

    /// The envelope declared a version outside [`crate::Options::supported_versions`].
    #[error("unsupported send-stream version {got} (supported: {supported:?})")]
    UnsupportedVersion { got: u32, supported: Vec<u32> },

    /// CRC verification failed for the command at `offset` (only checked when
    /// [`crate::Options::verify_crc`] is set).
    #[error("corrupt command at offset {offset}: crc mismatch (expected {expected:#010x}, got {got:#010x})")]
    CorruptCommand {
        offset: usize,
        expected: u32,
        got: u32,
    },

    /// A command kind outside the known table was seen while strict mode was enabled.
    #[error("unknown command kind {kind} at offset {offset}")]
    UnknownCommand { offset: usize, kind: u16 },

    /// A tracker operation hit an inconsistency that strict mode promotes to a hard error
    /// (§4.3): renaming an unknown path, colliding inode allocation, unlinking an inode with
    /// no attached paths left.
    #[error("tracker invariant violated: {reason}")]
    TrackerInvariantViolation { reason: String },

    /// The caller's [`crate::CancellationToken`] fired at a command boundary.
    #[error("parse cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
