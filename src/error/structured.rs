//! Structured error output for scripts and agents driving the CLI.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags

use crate::error::DeskError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Database Errors (exit code 2) ===
    /// Database operation failed
    DatabaseError,
    /// Workspace not initialized
    NotInitialized,
    /// Already initialized
    AlreadyInitialized,
    /// Store returned inconsistent data
    StorageError,

    // === Lookup Errors (exit code 3) ===
    /// Update target malformed or missing
    CouldNotUpdate,
    /// Delete target malformed or missing
    CouldNotDelete,

    // === Validation Errors (exit code 4) ===
    /// Required field missing at create
    RequiredField,
    /// `_id` missing at update/delete
    MissingId,
    /// Update without fields
    NoUpdateFields,
    /// Undecodable request
    InvalidRequest,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File or socket I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseError => "DATABASE_ERROR",
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::StorageError => "STORAGE_ERROR",
            Self::CouldNotUpdate => "COULD_NOT_UPDATE",
            Self::CouldNotDelete => "COULD_NOT_DELETE",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::MissingId => "MISSING_ID",
            Self::NoUpdateFields => "NO_UPDATE_FIELDS",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
        }
    }

    /// Whether the caller might succeed by fixing the input and retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RequiredField | Self::MissingId | Self::NoUpdateFields | Self::InvalidRequest
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 2: Database errors
    /// - 3: Lookup errors
    /// - 4: Validation errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::DatabaseError
            | Self::NotInitialized
            | Self::AlreadyInitialized
            | Self::StorageError => 2,
            Self::CouldNotUpdate | Self::CouldNotDelete => 3,
            Self::RequiredField | Self::MissingId | Self::NoUpdateFields | Self::InvalidRequest => {
                4
            }
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
        }
    }
}

/// A structured error with code, message and hint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
}

impl StructuredError {
    /// Create a new structured error from a `DeskError`.
    #[must_use]
    pub fn from_error(err: &DeskError) -> Self {
        let code = code_for(err);
        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            retryable: code.is_retryable(),
        }
    }

    /// Format as JSON for machine output.
    ///
    /// Business errors keep the exact `{ "error": "<message>" }` shape the
    /// HTTP surface uses, with the extra fields alongside.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.message,
            "code": self.code.as_str(),
            "hint": self.hint,
            "retryable": self.retryable,
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }
}

fn code_for(err: &DeskError) -> ErrorCode {
    use crate::error::Mutation;

    match err {
        DeskError::RequiredFieldsMissing => ErrorCode::RequiredField,
        DeskError::MissingId => ErrorCode::MissingId,
        DeskError::NoUpdateFields => ErrorCode::NoUpdateFields,
        DeskError::LookupFailed {
            op: Mutation::Update,
            ..
        } => ErrorCode::CouldNotUpdate,
        DeskError::LookupFailed {
            op: Mutation::Delete,
            ..
        } => ErrorCode::CouldNotDelete,
        DeskError::InvalidRequest { .. } => ErrorCode::InvalidRequest,
        DeskError::Database(_) => ErrorCode::DatabaseError,
        DeskError::Storage(_) => ErrorCode::StorageError,
        DeskError::Config(_) => ErrorCode::ConfigError,
        DeskError::NotInitialized => ErrorCode::NotInitialized,
        DeskError::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
        DeskError::Io(_) => ErrorCode::IoError,
        DeskError::Json(_) => ErrorCode::JsonError,
        DeskError::Yaml(_) => ErrorCode::YamlError,
    }
}
