//! Error types for packing and unpacking.

use thiserror::Error;

/// Marshaling error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    /// The value cannot be represented by the target type.
    #[error("cannot pack value as {type_name}: {reason}")]
    InvalidValue {
        /// Target type name.
        type_name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Fewer (or more) bytes than the type requires.
    #[error("{type_name} expects {expected} bytes, got {actual}")]
    Truncated {
        /// Type being decoded.
        type_name: String,
        /// Required byte count.
        expected: usize,
        /// Available byte count.
        actual: usize,
    },

    /// Bytes that do not form a valid encoding of the type.
    #[error("invalid {type_name} encoding: {reason}")]
    InvalidEncoding {
        /// Type being decoded.
        type_name: String,
        /// What was wrong with the bytes.
        reason: String,
    },
}

impl MarshalError {
    pub(crate) fn invalid_value(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        MarshalError::InvalidValue {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_encoding(
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        MarshalError::InvalidEncoding {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for marshaling operations.
pub type MarshalResult<T> = Result<T, MarshalError>;
