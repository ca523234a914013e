//! Error types for registry declarations.
//!
//! Errors are raised while a declaration is validated, before anything is
//! applied. Each variant carries the raw input that was rejected so the
//! message can point the user at the offending text.

use crate::value::ValueType;
use thiserror::Error;

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed hive, view prefix, or path segment
    Path,
    /// Data that does not fit the declared value type
    Data,
    /// Snapshot file could not be read or written
    Io,
    /// Two declarations claim the same identity
    Conflict,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Path => "Invalid registry path",
            Self::Data => "Invalid value data",
            Self::Io => "Snapshot unavailable",
            Self::Conflict => "Conflicting declarations",
        }
    }

    /// Get actionable advice for resolving this error category.
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Path => {
                "Paths look like [32:]HKLM\\Software\\Key; use a trailing \\\\ for the default value"
            }
            Self::Data => "Check that the data matches the declared type",
            Self::Io => "Check that the snapshot file exists and is valid JSON",
            Self::Conflict => "Give every key and every value a distinct title",
        }
    }
}

/// Errors produced while parsing paths, encoding values, or loading snapshots.
#[derive(Debug, Error)]
pub enum Error {
    /// The path could not be parsed
    #[error("invalid registry path '{path}': {reason}")]
    InvalidPath {
        /// Raw path as written
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// The data does not validate against the declared type
    #[error("invalid {value_type} data '{value}': {message}")]
    DataValidation {
        /// Declared value type
        value_type: ValueType,
        /// Raw data as written
        value: String,
        /// What is wrong with it
        message: String,
    },

    /// A declaration names a type outside the supported set
    #[error("unknown value type '{0}' (expected string, expand, array, dword, qword or binary)")]
    UnknownValueType(String),

    /// Another declaration of the same kind already uses this title
    #[error("duplicate declaration {id}: the title is already declared")]
    DuplicateTitle {
        /// Reference of the repeated resource, e.g. `registry_key[title]`
        id: String,
    },

    /// A snapshot file is structurally valid JSON but not a valid snapshot
    #[error("invalid snapshot: {message}")]
    Snapshot {
        /// Description of the problem
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn data(value_type: ValueType, value: impl Into<String>, message: &str) -> Self {
        Self::DataValidation {
            value_type,
            value: value.into(),
            message: message.to_string(),
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidPath { .. } => ErrorCategory::Path,
            Error::DataValidation { .. } | Error::UnknownValueType(_) => ErrorCategory::Data,
            Error::DuplicateTitle { .. } => ErrorCategory::Conflict,
            Error::Snapshot { .. } | Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }
}

/// Result type for registry declaration operations.
pub type Result<T> = std::result::Result<T, Error>;
