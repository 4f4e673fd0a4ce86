//! Binary Device Information records.
//!
//! System ID and PnP ID are the two fields with a byte layout; every other
//! known field is UTF-8 text.

use core::fmt;
use core::fmt::Write as _;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DecodeError, DecodeResult};
use crate::registry::{FieldKind, PNP_ID_LEN, SYSTEM_ID_LEN};

/// Render bytes as uppercase two-digit hex, last byte first.
///
/// Little-endian values on the wire read most-significant byte first.
pub(crate) fn hex_msb_first(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes.iter().rev() {
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

/// Decoded System ID (0x2A23).
///
/// The byte format is:
/// - bytes 0-4: Manufacturer Identifier (40-bit LE)
/// - bytes 5-7: Organizationally Unique Identifier (24-bit LE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemId {
    /// Manufacturer-defined identifier, as stored on the wire.
    pub manufacturer_identifier: [u8; 5],
    /// IEEE OUI, as stored on the wire.
    pub organizationally_unique_identifier: [u8; 3],
}

impl SystemId {
    /// Parse a System ID from raw bytes. Extra trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedRecord`] if `data` is shorter than
    /// 8 bytes.
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> DecodeResult<Self> {
        if data.len() < SYSTEM_ID_LEN {
            return Err(DecodeError::malformed(
                FieldKind::SystemId,
                SYSTEM_ID_LEN,
                data.len(),
            ));
        }

        let mut manufacturer_identifier = [0u8; 5];
        manufacturer_identifier.copy_from_slice(&data[0..5]);
        let mut organizationally_unique_identifier = [0u8; 3];
        organizationally_unique_identifier.copy_from_slice(&data[5..8]);

        Ok(Self {
            manufacturer_identifier,
            organizationally_unique_identifier,
        })
    }

    /// Manufacturer Identifier as 10 uppercase hex digits, MSB first.
    #[must_use]
    pub fn manufacturer_identifier_hex(&self) -> String {
        hex_msb_first(&self.manufacturer_identifier)
    }

    /// OUI as 6 uppercase hex digits, MSB first.
    #[must_use]
    pub fn oui_hex(&self) -> String {
        hex_msb_first(&self.organizationally_unique_identifier)
    }

    /// Manufacturer Identifier as a number.
    #[must_use]
    pub fn manufacturer_identifier(&self) -> u64 {
        self.manufacturer_identifier
            .iter()
            .rev()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    /// OUI as a number.
    #[must_use]
    pub fn oui(&self) -> u32 {
        self.organizationally_unique_identifier
            .iter()
            .rev()
            .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
    }
}

impl fmt::Display for SystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.manufacturer_identifier_hex(), self.oui_hex())
    }
}

/// Who assigned the PnP vendor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VendorIdSource {
    /// Bluetooth SIG assigned company identifier (source byte 1).
    Bluetooth,
    /// USB Implementer's Forum assigned vendor id (any other source byte).
    Usb,
}

impl From<u8> for VendorIdSource {
    fn from(value: u8) -> Self {
        match value {
            1 => VendorIdSource::Bluetooth,
            _ => VendorIdSource::Usb,
        }
    }
}

impl fmt::Display for VendorIdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorIdSource::Bluetooth => f.write_str("Bluetooth"),
            VendorIdSource::Usb => f.write_str("USB"),
        }
    }
}

/// Decoded PnP ID (0x2A50).
///
/// The byte format is:
/// - byte 0: Vendor ID Source
/// - bytes 1-2: Vendor ID (u16 LE)
/// - bytes 3-4: Product ID (u16 LE)
/// - bytes 5-6: Product Version (u16 LE)
///
/// The vendor id is only reported for Bluetooth-sourced ids; product id and
/// version are always reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PnpId {
    /// Which body assigned the vendor id.
    pub vendor_id_source: VendorIdSource,
    /// Vendor id, present only when assigned by the Bluetooth SIG.
    pub vendor_id: Option<u16>,
    /// Vendor-assigned product id.
    pub product_id: u16,
    /// Vendor-assigned product version.
    pub product_version: u16,
}

impl PnpId {
    /// Parse a PnP ID from raw bytes. Extra trailing bytes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MalformedRecord`] if `data` is shorter than
    /// 7 bytes, whatever the vendor id source.
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> DecodeResult<Self> {
        use bytes::Buf;

        if data.len() < PNP_ID_LEN {
            return Err(DecodeError::malformed(
                FieldKind::PnpId,
                PNP_ID_LEN,
                data.len(),
            ));
        }

        let mut buf = data;
        let vendor_id_source = VendorIdSource::from(buf.get_u8());
        let vendor_id = buf.get_u16_le();
        let product_id = buf.get_u16_le();
        let product_version = buf.get_u16_le();

        Ok(Self {
            vendor_id_source,
            vendor_id: (vendor_id_source == VendorIdSource::Bluetooth).then_some(vendor_id),
            product_id,
            product_version,
        })
    }
}

impl fmt::Display for PnpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vendor ID Source: {}", self.vendor_id_source)?;
        if let Some(vendor_id) = self.vendor_id {
            write!(f, ", Vendor ID: {}", vendor_id)?;
        }
        write!(
            f,
            ", Product ID: {}, Product Version: {}",
            self.product_id, self.product_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_msb_first() {
        assert_eq!(hex_msb_first(&[0x01, 0xAB, 0x0F]), "0FAB01");
        assert_eq!(hex_msb_first(&[]), "");
    }

    #[test]
    fn test_system_id_from_bytes() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x05, 0xAA, 0xBB, 0xCC];
        let id = SystemId::from_bytes(&bytes).unwrap();

        assert_eq!(id.manufacturer_identifier_hex(), "0504030201");
        assert_eq!(id.oui_hex(), "CCBBAA");
        assert_eq!(id.manufacturer_identifier(), 0x05_0403_0201);
        assert_eq!(id.oui(), 0xCC_BBAA);
        assert_eq!(id.to_string(), "0504030201CCBBAA");
    }

    #[test]
    fn test_system_id_pads_small_bytes() {
        let bytes = [0x00, 0x0A, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00];
        let id = SystemId::from_bytes(&bytes).unwrap();
        assert_eq!(id.to_string(), "0000000A00000001");
    }

    #[test]
    fn test_system_id_insufficient_bytes() {
        let err = SystemId::from_bytes(&[0; 7]).unwrap_err();
        assert_eq!(err, DecodeError::malformed(FieldKind::SystemId, 8, 7));
        assert!(err.to_string().contains("requires 8 bytes"));
    }

    #[test]
    fn test_system_id_extra_bytes_ignored() {
        let bytes = [1, 2, 3, 4, 5, 6, 7, 8, 0xFF, 0xFF];
        let id = SystemId::from_bytes(&bytes).unwrap();
        assert_eq!(id.to_string(), "0504030201080706");
    }

    #[test]
    fn test_vendor_id_source_from_u8() {
        assert_eq!(VendorIdSource::from(1), VendorIdSource::Bluetooth);
        assert_eq!(VendorIdSource::from(2), VendorIdSource::Usb);
        assert_eq!(VendorIdSource::from(0), VendorIdSource::Usb);
        assert_eq!(VendorIdSource::from(255), VendorIdSource::Usb);
    }

    #[test]
    fn test_pnp_id_bluetooth_source() {
        let bytes = [0x01, 0x10, 0x00, 0x20, 0x00, 0x30, 0x00];
        let pnp = PnpId::from_bytes(&bytes).unwrap();

        assert_eq!(pnp.vendor_id_source, VendorIdSource::Bluetooth);
        assert_eq!(pnp.vendor_id, Some(16));
        assert_eq!(pnp.product_id, 32);
        assert_eq!(pnp.product_version, 48);
    }

    #[test]
    fn test_pnp_id_usb_source_omits_vendor() {
        let bytes = [0x02, 0x6B, 0x1D, 0x20, 0x00, 0x30, 0x00];
        let pnp = PnpId::from_bytes(&bytes).unwrap();

        assert_eq!(pnp.vendor_id_source, VendorIdSource::Usb);
        assert_eq!(pnp.vendor_id, None);
        assert_eq!(pnp.product_id, 32);
        assert_eq!(pnp.product_version, 48);
        assert!(!pnp.to_string().contains("Vendor ID:"));
    }

    #[test]
    fn test_pnp_id_little_endian() {
        let bytes = [0x01, 0x34, 0x12, 0xCD, 0xAB, 0xFF, 0xFF];
        let pnp = PnpId::from_bytes(&bytes).unwrap();
        assert_eq!(pnp.vendor_id, Some(0x1234));
        assert_eq!(pnp.product_id, 0xABCD);
        assert_eq!(pnp.product_version, 0xFFFF);
    }

    #[test]
    fn test_pnp_id_requires_seven_bytes_for_any_source() {
        for source in [0x01, 0x02] {
            let err = PnpId::from_bytes(&[source, 0, 0, 0, 0, 0]).unwrap_err();
            assert!(matches!(
                err,
                DecodeError::MalformedRecord {
                    kind: FieldKind::PnpId,
                    expected: 7,
                    actual: 6
                }
            ));
        }
    }

    #[test]
    fn test_pnp_id_display() {
        let pnp = PnpId {
            vendor_id_source: VendorIdSource::Bluetooth,
            vendor_id: Some(16),
            product_id: 32,
            product_version: 48,
        };
        assert_eq!(
            pnp.to_string(),
            "Vendor ID Source: Bluetooth, Vendor ID: 16, Product ID: 32, Product Version: 48"
        );
    }

    #[test]
    fn test_pnp_id_serialization() {
        let pnp = PnpId::from_bytes(&[0x02, 0, 0, 0x20, 0, 0x30, 0]).unwrap();
        let json = serde_json::to_string(&pnp).unwrap();
        assert!(json.contains("\"vendor_id_source\":\"Usb\""));
        assert!(json.contains("\"vendor_id\":null"));
    }
}
