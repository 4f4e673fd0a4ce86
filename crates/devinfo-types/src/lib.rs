//! Platform-agnostic decoding of the BLE Device Information service.
//!
//! This crate provides the pieces of a Device Information reader that do not
//! touch a radio, so they can be shared by native (devinfo-core) and other
//! transports.
//!
//! # Features
//!
//! - Identifier registry mapping characteristic UUIDs to [`FieldKind`]s
//! - Record decoder for text fields, System ID and PnP ID
//! - UUID constants for the Battery and Device Information services
//! - Error types for malformed and unrecognised records
//!
//! # Example
//!
//! ```
//! use devinfo_types::{FieldKind, decode, resolve, uuids};
//!
//! let kind = resolve(&uuids::PNP_ID);
//! assert_eq!(kind, FieldKind::PnpId);
//!
//! let text = decode(kind, &[0x01, 0x10, 0x00, 0x20, 0x00, 0x30, 0x00]).unwrap();
//! assert_eq!(
//!     text,
//!     "Vendor ID Source: Bluetooth, Vendor ID: 16, Product ID: 32, Product Version: 48"
//! );
//! ```

pub mod decode;
pub mod error;
pub mod records;
pub mod registry;
pub mod types;
pub mod uuid;

pub use decode::{decode, decode_battery_level, decode_field};
pub use error::{DecodeError, DecodeResult};
pub use records::{PnpId, SystemId, VendorIdSource};
pub use registry::{FieldKind, resolve, resolve_short, resolve_str};
pub use types::{DecodedField, DeviceInformation, FieldFailure};
pub use uuid as uuids;
