//! # Error Types
//!
//! Structured error types for carbon_core. Every variant carries enough
//! context for a caller to point at the one input that needs fixing
//! (a material row, an activity, a region code) instead of reporting a
//! generic calculation failure.
//!
//! ## Example
//!
//! ```rust
//! use carbon_core::errors::{CalcError, CalcResult};
//!
//! fn validate_quantity(quantity: f64) -> CalcResult<()> {
//!     if !quantity.is_finite() || quantity <= 0.0 {
//!         return Err(CalcError::invalid_input(
//!             "quantity",
//!             quantity.to_string(),
//!             "Quantity must be positive",
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_quantity(-1.0).is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for carbon_core operations
pub type CalcResult<T> = Result<T, CalcError>;

/// Structured error type for carbon calculations.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "details")]
pub enum CalcError {
    /// An input value is invalid (non-positive, non-finite, unit mismatch)
    #[error("Invalid input for '{field}': {value} - {reason}")]
    InvalidInput {
        field: String,
        value: String,
        reason: String,
    },

    /// A required field is missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// No emission factor exists for the requested key
    #[error("Emission factor not found: {kind} '{key}'")]
    FactorNotFound { kind: String, key: String },

    /// An activity was submitted to the wrong GHG scope entry point
    #[error("Wrong scope: {activity} belongs to Scope {expected_scope}, use {use_instead}")]
    WrongScope {
        activity: String,
        expected_scope: u8,
        use_instead: String,
    },

    /// Reference data violates an internal invariant (e.g. stage fractions)
    #[error("Cross-check failure for '{subject}': {reason}")]
    CrossCheckFailure { subject: String, reason: String },

    /// A project material row failed; wraps the underlying cause
    #[error("Material entry {entry_index} ('{material_id}'): {source}")]
    MaterialEntry {
        entry_index: usize,
        material_id: String,
        source: Box<CalcError>,
    },

    /// File I/O error
    #[error("File error: {operation} on '{path}' - {reason}")]
    FileError {
        operation: String,
        path: String,
        reason: String,
    },

    /// File is locked by another user/process
    #[error("File locked: '{path}' is locked by {locked_by} since {locked_at}")]
    FileLocked {
        path: String,
        locked_by: String,
        locked_at: String,
    },

    /// JSON/TOML serialization or deserialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    /// Schema version mismatch
    #[error("Version mismatch: file version {file_version}, expected {expected_version}")]
    VersionMismatch {
        file_version: String,
        expected_version: String,
    },

    /// Generic internal error (should be rare)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CalcError {
    /// Create an InvalidInput error
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a MissingField error
    pub fn missing_field(field: impl Into<String>) -> Self {
        CalcError::MissingField {
            field: field.into(),
        }
    }

    /// Create a FactorNotFound error
    pub fn factor_not_found(kind: impl Into<String>, key: impl Into<String>) -> Self {
        CalcError::FactorNotFound {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Create a WrongScope error
    pub fn wrong_scope(
        activity: impl Into<String>,
        expected_scope: u8,
        use_instead: impl Into<String>,
    ) -> Self {
        CalcError::WrongScope {
            activity: activity.into(),
            expected_scope,
            use_instead: use_instead.into(),
        }
    }

    /// Create a CrossCheckFailure error
    pub fn cross_check(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::CrossCheckFailure {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Attach the failing material row to an error
    pub fn for_material_entry(self, entry_index: usize, material_id: impl Into<String>) -> Self {
        CalcError::MaterialEntry {
            entry_index,
            material_id: material_id.into(),
            source: Box::new(self),
        }
    }

    /// Create a FileError
    pub fn file_error(
        operation: impl Into<String>,
        path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CalcError::FileError {
            operation: operation.into(),
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a FileLocked error
    pub fn file_locked(
        path: impl Into<String>,
        locked_by: impl Into<String>,
        locked_at: impl Into<String>,
    ) -> Self {
        CalcError::FileLocked {
            path: path.into(),
            locked_by: locked_by.into(),
            locked_at: locked_at.into(),
        }
    }

    /// Create a SerializationError
    pub fn serialization(reason: impl Into<String>) -> Self {
        CalcError::SerializationError {
            reason: reason.into(),
        }
    }

    /// The innermost error, looking through `MaterialEntry` wrappers
    pub fn root_cause(&self) -> &CalcError {
        match self {
            CalcError::MaterialEntry { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if this is a recoverable error (e.g., can retry)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CalcError::FileLocked { .. })
    }

    /// Get a short error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            CalcError::InvalidInput { .. } => "INVALID_INPUT",
            CalcError::MissingField { .. } => "MISSING_FIELD",
            CalcError::FactorNotFound { .. } => "FACTOR_NOT_FOUND",
            CalcError::WrongScope { .. } => "WRONG_SCOPE",
            CalcError::CrossCheckFailure { .. } => "CROSS_CHECK_FAILURE",
            CalcError::MaterialEntry { source, .. } => source.error_code(),
            CalcError::FileError { .. } => "FILE_ERROR",
            CalcError::FileLocked { .. } => "FILE_LOCKED",
            CalcError::SerializationError { .. } => "SERIALIZATION_ERROR",
            CalcError::VersionMismatch { .. } => "VERSION_MISMATCH",
            CalcError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}
