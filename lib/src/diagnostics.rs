//! Soft-failure reporting (§7).
//!
//! Unknown attribute tags, kind-agnostic tracker inconsistencies (outside strict mode), and
//! oracle failures never abort a parse; they're recorded here and returned alongside the
//! change list so a supervising tool can decide whether to care.

use serde::Serialize;

use crate::path::RawPath;

/// How seriously a supervising tool should take a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Worth surfacing, doesn't indicate data loss (e.g. an unknown attribute tag).
    Info,
    /// The output may be missing or approximate because of this (e.g. a phantom record,
    /// an oracle failure kept a record fail-open).
    Warning,
}

/// A single soft failure observed during parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<RawPath>,
}

impl Diagnostic {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            path: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: RawPath) -> Self {
        self.path = Some(path);
        self
    }
}
