//! Error types for record decoding in devinfo-types.

use thiserror::Error;

use crate::registry::FieldKind;

/// Errors that can occur when decoding a characteristic value.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in devinfo-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The record is shorter than the layout of its field kind requires.
    #[error("Malformed {kind} record: requires {expected} bytes, got {actual}")]
    MalformedRecord {
        /// The field kind being decoded.
        kind: FieldKind,
        /// Minimum number of bytes for this kind.
        expected: usize,
        /// Number of bytes actually supplied.
        actual: usize,
    },

    /// The identifier or kind is not one of the known Device Information fields.
    ///
    /// Callers should log and skip the field; this is never fatal.
    #[error("Unrecognized field: {identifier}")]
    UnrecognizedField {
        /// The identifier as reported by the peripheral.
        identifier: String,
    },
}

impl DecodeError {
    /// Create a malformed record error.
    pub fn malformed(kind: FieldKind, expected: usize, actual: usize) -> Self {
        Self::MalformedRecord {
            kind,
            expected,
            actual,
        }
    }

    /// Create an unrecognized field error.
    pub fn unrecognized(identifier: impl Into<String>) -> Self {
        Self::UnrecognizedField {
            identifier: identifier.into(),
        }
    }

    /// Whether the caller may log and carry on past this error.
    pub fn is_skippable(&self) -> bool {
        matches!(self, Self::UnrecognizedField { .. })
    }
}

/// Result type alias using devinfo-types' DecodeError type.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
