//! Identifier registry for Device Information fields.
//!
//! Maps the identifiers a peripheral reports during characteristic
//! enumeration onto the closed set of fields this crate knows how to decode.
//! Lookup is total: anything outside the table resolves to
//! [`FieldKind::Unknown`], which callers log and skip.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::uuid::{from_short, to_short};

/// Which Device Information field a characteristic represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldKind {
    /// Manufacturer Name String (0x2A29).
    ManufacturerName,
    /// Model Number String (0x2A24).
    ModelNumber,
    /// Hardware Revision String (0x2A27).
    HardwareRevision,
    /// Firmware Revision String (0x2A26).
    FirmwareRevision,
    /// Software Revision String (0x2A28).
    SoftwareRevision,
    /// System ID (0x2A23).
    SystemId,
    /// IEEE 11073-20601 Regulatory Certification Data List (0x2A2A).
    RegulatoryCertificationList,
    /// PnP ID (0x2A50).
    PnpId,
    /// Anything not in the table above.
    Unknown,
}

/// `(kind, assigned number, SIG symbolic name)` for every known field.
const REGISTRY: [(FieldKind, u16, &str); 8] = [
    (FieldKind::ManufacturerName, 0x2A29, "manufacturer_name_string"),
    (FieldKind::ModelNumber, 0x2A24, "model_number_string"),
    (FieldKind::HardwareRevision, 0x2A27, "hardware_revision_string"),
    (FieldKind::FirmwareRevision, 0x2A26, "firmware_revision_string"),
    (FieldKind::SoftwareRevision, 0x2A28, "software_revision_string"),
    (FieldKind::SystemId, 0x2A23, "system_id"),
    (
        FieldKind::RegulatoryCertificationList,
        0x2A2A,
        "ieee_11073-20601_regulatory_certification_data_list",
    ),
    (FieldKind::PnpId, 0x2A50, "pnp_id"),
];

/// Minimum length of a System ID record.
pub const SYSTEM_ID_LEN: usize = 8;

/// Minimum length of a PnP ID record.
pub const PNP_ID_LEN: usize = 7;

impl FieldKind {
    /// All known kinds, in registry order.
    pub const KNOWN: [FieldKind; 8] = [
        FieldKind::ManufacturerName,
        FieldKind::ModelNumber,
        FieldKind::HardwareRevision,
        FieldKind::FirmwareRevision,
        FieldKind::SoftwareRevision,
        FieldKind::SystemId,
        FieldKind::RegulatoryCertificationList,
        FieldKind::PnpId,
    ];

    fn entry(self) -> Option<&'static (FieldKind, u16, &'static str)> {
        REGISTRY.iter().find(|(kind, _, _)| *kind == self)
    }

    /// The 16-bit assigned number, or `None` for [`FieldKind::Unknown`].
    #[must_use]
    pub fn assigned_number(self) -> Option<u16> {
        self.entry().map(|(_, short, _)| *short)
    }

    /// The full 128-bit characteristic UUID, or `None` for [`FieldKind::Unknown`].
    #[must_use]
    pub fn uuid(self) -> Option<Uuid> {
        self.assigned_number().map(from_short)
    }

    /// The Bluetooth SIG symbolic name (e.g. `"pnp_id"`).
    #[must_use]
    pub fn symbolic_name(self) -> &'static str {
        self.entry().map_or("unknown", |(_, _, name)| name)
    }

    /// Human-readable label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            FieldKind::ManufacturerName => "Manufacturer Name String",
            FieldKind::ModelNumber => "Model Number String",
            FieldKind::HardwareRevision => "Hardware Revision String",
            FieldKind::FirmwareRevision => "Firmware Revision String",
            FieldKind::SoftwareRevision => "Software Revision String",
            FieldKind::SystemId => "System ID",
            FieldKind::RegulatoryCertificationList => {
                "IEEE 11073-20601 Regulatory Certification Data List"
            }
            FieldKind::PnpId => "PnP ID",
            FieldKind::Unknown => "Unknown",
        }
    }

    /// Minimum record length required to decode this kind.
    #[must_use]
    pub fn min_len(self) -> usize {
        match self {
            FieldKind::SystemId => SYSTEM_ID_LEN,
            FieldKind::PnpId => PNP_ID_LEN,
            _ => 0,
        }
    }

    /// Whether the record is decoded as UTF-8 text.
    #[must_use]
    pub fn is_text(self) -> bool {
        matches!(
            self,
            FieldKind::ManufacturerName
                | FieldKind::ModelNumber
                | FieldKind::HardwareRevision
                | FieldKind::FirmwareRevision
                | FieldKind::SoftwareRevision
                | FieldKind::RegulatoryCertificationList
        )
    }

    /// Whether this kind is one of the eight known fields.
    #[must_use]
    pub fn is_known(self) -> bool {
        self != FieldKind::Unknown
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<Uuid> for FieldKind {
    fn from(uuid: Uuid) -> Self {
        resolve(&uuid)
    }
}

/// Resolve a characteristic UUID to its field kind.
#[must_use]
pub fn resolve(identifier: &Uuid) -> FieldKind {
    to_short(identifier).map_or(FieldKind::Unknown, resolve_short)
}

/// Resolve a 16-bit assigned number to its field kind.
#[must_use]
pub fn resolve_short(assigned_number: u16) -> FieldKind {
    REGISTRY
        .iter()
        .find(|(_, short, _)| *short == assigned_number)
        .map_or(FieldKind::Unknown, |(kind, _, _)| *kind)
}

/// Resolve an identifier given as text.
///
/// Accepts a full UUID (`00002a29-0000-1000-8000-00805f9b34fb`), a short
/// assigned number with or without `0x` (`2a29`, `0x2A29`), or a SIG
/// symbolic name (`manufacturer_name_string`). Anything else is
/// [`FieldKind::Unknown`].
#[must_use]
pub fn resolve_str(identifier: &str) -> FieldKind {
    let identifier = identifier.trim();

    if let Some((kind, _, _)) = REGISTRY
        .iter()
        .find(|(_, _, name)| name.eq_ignore_ascii_case(identifier))
    {
        return *kind;
    }

    if let Ok(uuid) = Uuid::parse_str(identifier) {
        return resolve(&uuid);
    }

    let hex = identifier
        .strip_prefix("0x")
        .or_else(|| identifier.strip_prefix("0X"))
        .unwrap_or(identifier);
    if (1..=4).contains(&hex.len())
        && let Ok(short) = u16::from_str_radix(hex, 16)
    {
        return resolve_short(short);
    }

    FieldKind::Unknown
}
