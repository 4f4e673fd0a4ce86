//! Report types produced from decoded Device Information fields.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::registry::FieldKind;

/// A decoded field ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecodedField {
    /// Which Device Information field this is.
    pub kind: FieldKind,
    /// The decoded value as it appears after the label.
    pub value: String,
}

impl DecodedField {
    /// Create a field from its kind and display value.
    pub fn new(kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// The report line for this field, e.g. `> Model Number String: X1`.
    #[must_use]
    pub fn line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DecodedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "> {}: {}", self.kind.label(), self.value)
    }
}

/// A recognised field that could not be read or decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldFailure {
    /// The field that was left out of the report.
    pub kind: FieldKind,
    /// The read or decode error, as text.
    pub reason: String,
}

/// Everything gathered from one peripheral's Device Information service.
///
/// `fields` keeps the order in which the peripheral enumerated its
/// characteristics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceInformation {
    /// Successfully decoded fields.
    pub fields: Vec<DecodedField>,
    /// Characteristic identifiers that were not in the registry.
    pub unrecognized: Vec<String>,
    /// Recognised fields whose read or decode failed.
    pub failures: Vec<FieldFailure>,
}

impl DeviceInformation {
    /// Look up the decoded value of a field.
    #[must_use]
    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.value.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of decoded fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// All decoded fields as report lines joined with `\n`.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.fields
            .iter()
            .map(DecodedField::line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
