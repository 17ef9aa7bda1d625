//! Unified error types for the land registry.
//!
//! Every failure in the core is per-request and recoverable by the caller. Validation
//! failures always carry the complete list of failing paths.

use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single failing path with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    /// Dotted path of the offending input, e.g. `additional_data.sumber_data`
    pub path: String,
    /// What is wrong with the value at `path`
    pub message: String,
}

impl FieldViolation {
    /// Creates a violation for `path`.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Errors returned by every core operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },

    /// One or more inputs failed their rules
    #[error("Validation failed: {}", format_violations(.violations))]
    Validation {
        /// Every failing path, in rule order
        violations: Vec<FieldViolation>,
    },

    /// A field definition key is already taken
    #[error("Field key '{key}' is already taken")]
    Conflict {
        /// The duplicated key
        key: String,
    },

    /// No field definition with this id
    #[error("Field definition not found: {id}")]
    FieldNotFound {
        /// The missing id
        id: i64,
    },

    /// No land record with this id
    #[error("Land record not found: {id}")]
    LandNotFound {
        /// The missing id
        id: i64,
    },

    /// No certificate with this id (or not owned by the addressed land)
    #[error("Certificate not found: {id}")]
    CertificateNotFound {
        /// The missing id
        id: i64,
    },

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Filesystem failure in the document store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Pagination arithmetic overflow
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

impl Error {
    /// Builds a validation error from a single violation.
    pub fn invalid(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            violations: vec![FieldViolation::new(path, message)],
        }
    }

    /// Per-field messages for errors the caller can correct by editing input.
    ///
    /// A key conflict is reported on the `key` path so forms can show it next to
    /// the input, exactly like a validation failure.
    #[must_use]
    pub fn violations(&self) -> Vec<FieldViolation> {
        match self {
            Self::Validation { violations } => violations.clone(),
            Self::Conflict { .. } => vec![FieldViolation::new("key", "has already been taken")],
            _ => Vec::new(),
        }
    }

    /// Maps a database unique-constraint violation on the field key to `Conflict`.
    pub(crate) fn from_key_write(err: DbErr, key: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict {
                key: key.to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

fn format_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
