//! Record decoder.
//!
//! [`decode`] turns one raw characteristic value into its display string.
//! It is a pure function of `(kind, record)` and safe to call from any
//! thread.

use crate::error::{DecodeError, DecodeResult};
use crate::records::{PnpId, SystemId};
use crate::registry::FieldKind;
use crate::types::DecodedField;

/// Decode a raw record into a human-readable string.
///
/// - Text kinds decode the whole record as UTF-8 (invalid sequences become
///   U+FFFD). Empty records decode to an empty string.
/// - [`FieldKind::SystemId`] renders the manufacturer identifier followed by
///   the OUI, each as uppercase hex, most-significant byte first.
/// - [`FieldKind::PnpId`] renders the vendor id source, the vendor id (only for
///   Bluetooth sources), the product id and the product version.
///
/// # Errors
///
/// - [`DecodeError::MalformedRecord`] if the record is shorter than
///   [`FieldKind::min_len`].
/// - [`DecodeError::UnrecognizedField`] for [`FieldKind::Unknown`].
///
/// # Examples
///
/// ```
/// use devinfo_types::{FieldKind, decode};
///
/// let id = decode(FieldKind::SystemId, &[1, 2, 3, 4, 5, 0xAA, 0xBB, 0xCC]).unwrap();
/// assert_eq!(id, "0504030201CCBBAA");
///
/// let name = decode(FieldKind::ManufacturerName, b"Acme").unwrap();
/// assert_eq!(name, "Acme");
/// ```
pub fn decode(kind: FieldKind, record: &[u8]) -> DecodeResult<String> {
    match kind {
        FieldKind::ManufacturerName
        | FieldKind::ModelNumber
        | FieldKind::HardwareRevision
        | FieldKind::FirmwareRevision
        | FieldKind::SoftwareRevision
        | FieldKind::RegulatoryCertificationList => {
            Ok(String::from_utf8_lossy(record).into_owned())
        }
        FieldKind::SystemId => SystemId::from_bytes(record).map(|id| id.to_string()),
        FieldKind::PnpId => PnpId::from_bytes(record).map(|pnp| pnp.to_string()),
        FieldKind::Unknown => Err(DecodeError::unrecognized(kind.symbolic_name())),
    }
}

/// Decode a raw record and pair it with its kind.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_field(kind: FieldKind, record: &[u8]) -> DecodeResult<DecodedField> {
    decode(kind, record).map(|value| DecodedField::new(kind, value))
}

/// Decode the Battery Level characteristic (0x2A19) as a percentage.
///
/// Only the first byte is significant.
///
/// # Errors
///
/// Returns [`DecodeError::MalformedRecord`] (reported against
/// [`FieldKind::Unknown`], since battery level is outside the Device
/// Information set) when the record is empty.
pub fn decode_battery_level(record: &[u8]) -> DecodeResult<u8> {
    record
        .first()
        .copied()
        .ok_or_else(|| DecodeError::malformed(FieldKind::Unknown, 1, 0))
}
