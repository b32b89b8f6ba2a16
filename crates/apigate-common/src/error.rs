//! Error types for Gate processing
//!
//! Errors are structured with fields so a controller can report exactly which
//! resource and which field blocked a reconciliation pass.

use thiserror::Error;

/// Main error type for Gate processing
#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A field required to derive resources is absent or empty
    #[error("precondition violation for {resource}: {field} is not set")]
    Precondition {
        /// Name of the Gate (or the derived resource) being processed
        resource: String,
        /// Path of the missing field (e.g., "spec.service.name")
        field: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },
}

impl Error {
    /// Create a precondition violation for a missing field
    pub fn precondition(resource: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Precondition {
            resource: resource.into(),
            field: field.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error for a specific resource kind
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Whether this error was caused by a missing required field
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }

    /// The offending field path, for precondition violations
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Precondition { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}
