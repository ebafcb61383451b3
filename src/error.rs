//! The crate's single error type.
//!
//! Three kinds, all fail-fast:
//! - [`SchemaError::Configuration`]: a malformed schema or descriptor definition.
//!   Raised at build time, before any data is looked at.
//! - [`SchemaError::Evaluation`]: the thing being validated is itself absent.
//! - [`SchemaError::Validation`]: bad input data. A required property is missing,
//!   a validator rejected the value, or the value has the wrong type.
use thiserror::Error;

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{0}")]
    Configuration(String),

    #[error("Descriptor: {property}: {message}")]
    Evaluation {
        property: String,
        message: String,
    },

    #[error("{property} property: {message}")]
    Validation {
        property: String,
        message: String,
    },
}

impl SchemaError {
    pub(crate) fn configuration(context: &str, message: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("{context}{message}"))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_evaluation(&self) -> bool {
        matches!(self, Self::Evaluation { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Name of the offending property, for evaluation and validation failures.
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::Configuration(_) => None,
            Self::Evaluation { property, .. } | Self::Validation { property, .. } => Some(property),
        }
    }
}
