//! Error types and handling for `issue_desk`.
//!
//! Two families of errors share one enum:
//!
//! - Business errors are the outcomes clients are expected to see. Their
//!   `Display` output is exactly the message placed in the `error` field of
//!   a response body, and they always travel with status 200.
//! - Infrastructure errors (database, I/O, config) are ours to log. They
//!   never reach a client verbatim.
//!
//! `StructuredError` turns either family into machine-readable CLI output.

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The mutation a collapsed lookup failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
}

impl Mutation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary error type for `issue_desk` operations.
#[derive(Error, Debug)]
pub enum DeskError {
    // === Business Errors ===
    /// One of `issue_title`, `issue_text`, `created_by` was absent or empty.
    #[error("required field(s) missing")]
    RequiredFieldsMissing,

    /// Update or delete without an `_id`.
    #[error("missing _id")]
    MissingId,

    /// Update carrying an `_id` and nothing else.
    #[error("no update field(s) sent")]
    NoUpdateFields,

    /// Malformed id, unknown id, or a failed mutation.
    ///
    /// The causes are deliberately indistinguishable to callers; `detail`
    /// is only for logs.
    #[error("could not {op}")]
    LookupFailed {
        op: Mutation,
        id: String,
        detail: String,
    },

    // === Request Errors ===
    /// The request could not be decoded into a field map.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    // === Storage Errors ===
    /// `SQLite` database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store lost a record it had just written.
    #[error("Storage inconsistency: {0}")]
    Storage(String),

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workspace not initialized.
    #[error("Workspace not initialized: run 'desk init' first")]
    NotInitialized,

    /// Already initialized.
    #[error("Already initialized at '{path}'")]
    AlreadyInitialized { path: PathBuf },

    // === I/O Errors ===
    /// File system or socket I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DeskError {
    /// Is this an outcome a client should receive as `{ "error": ... }`?
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(
            self,
            Self::RequiredFieldsMissing
                | Self::MissingId
                | Self::NoUpdateFields
                | Self::LookupFailed { .. }
        )
    }

    /// Can the user fix this without code changes?
    #[must_use]
    pub const fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RequiredFieldsMissing
                | Self::MissingId
                | Self::NoUpdateFields
                | Self::LookupFailed { .. }
                | Self::InvalidRequest { .. }
                | Self::NotInitialized
                | Self::AlreadyInitialized { .. }
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run: desk init"),
            Self::AlreadyInitialized { .. } => Some("Use --force to reinitialize"),
            Self::RequiredFieldsMissing => {
                Some("Provide non-empty issue_title, issue_text and created_by")
            }
            Self::NoUpdateFields => Some("Send at least one non-empty field besides _id"),
            Self::LookupFailed { .. } => Some("Run 'desk list <project>' to see valid ids"),
            _ => None,
        }
    }

    /// Collapse a lower-level failure into the generic lookup outcome.
    #[must_use]
    pub fn lookup_failed(op: Mutation, id: impl Into<String>, detail: impl fmt::Display) -> Self {
        Self::LookupFailed {
            op,
            id: id.into(),
            detail: detail.to_string(),
        }
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }
}

/// Result type using `DeskError`.
pub type Result<T> = std::result::Result<T, DeskError>;
