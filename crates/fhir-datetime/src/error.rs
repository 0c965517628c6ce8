//! Error types for fhir-datetime operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FhirDateTimeError {
    #[error("Invalid type: {0}")]
    InvalidType(String),

    #[error("Cannot compare: {0}")]
    Incomparable(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid ISO 8601 string: {0}")]
    Parse(String),

    #[error("Index out of range: {index} (valid indices are 0..{len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Coarse classification of a [`FhirDateTimeError`].
///
/// Callers that only care whether a failure came from the shape of the input,
/// from its values, or from positional access can match on this instead of
/// the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong input shape, or operands that cannot be ordered against each other.
    Type,
    /// A field out of range, a field-dependency violation, or an unparsable string.
    Value,
    /// Positional access past the end of the field list.
    Index,
}

impl FhirDateTimeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidType(_) | Self::Incomparable(_) => ErrorKind::Type,
            Self::OutOfRange(_) | Self::MissingField(_) | Self::Parse(_) => ErrorKind::Value,
            Self::IndexOutOfRange { .. } => ErrorKind::Index,
        }
    }
}

pub type Result<T> = std::result::Result<T, FhirDateTimeError>;
