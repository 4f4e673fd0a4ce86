//! BLE transport for reading Device Information and battery level.
//!
//! This crate connects to a Bluetooth Low Energy peripheral, enumerates its
//! Device Information service (0x180A), reads every recognised
//! characteristic concurrently and decodes each one with
//! [`devinfo_types`]. It also reads the Battery Level characteristic.
//!
//! # Features
//!
//! - **Device discovery**: scan for nearby peripherals and find one by name,
//!   address or peripheral ID
//! - **Sessions**: [`Device`] owns one connection, its discovered services and
//!   its background tasks
//! - **Device information**: concurrent reads, output in enumeration order
//! - **Disconnect notification**: [`Device::watch_disconnect`]
//! - **Retries**: opt-in backoff through [`RetryConfig`]
//! - **Testing**: [`MockDevice`] implements the same [`GattDevice`] trait as
//!   [`Device`]
//!
//! # Platform Differences
//!
//! - **macOS**: peripherals are identified by a CoreBluetooth UUID, stable per
//!   Mac but not equal to the MAC address.
//! - **Linux/Windows**: peripherals are identified by their MAC address
//!   (e.g. `AA:BB:CC:DD:EE:FF`).
//!
//! [`Device::address()`] returns the appropriate identifier for the platform.
//!
//! # Quick Start
//!
//! ```no_run
//! use devinfo_core::{Device, scan};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let devices = scan::scan_for_devices().await?;
//!     println!("Found {} devices", devices.len());
//!
//!     let device = Device::connect("Polar H10").await?;
//!     println!("Battery: {}%", device.read_battery().await?);
//!     println!("{}", device.read_device_information().await?.to_text());
//!
//!     device.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod device;
pub mod error;
pub mod info;
pub mod mock;
pub mod retry;
pub mod scan;
pub mod traits;
pub mod util;

pub use device::{ConnectionConfig, Device};
pub use error::{DeviceNotFoundReason, Error, Result};
pub use mock::{MockDevice, MockDeviceBuilder};
pub use retry::{RetryConfig, with_retry};
pub use scan::{DiscoveredDevice, ScanOptions, scan_with_retry};
pub use traits::GattDevice;
pub use util::{create_identifier, format_peripheral_id};

/// Type alias for a shared device reference.
///
/// `Device` is not `Clone`; wrap it in `Arc` to use it from several tasks.
pub type SharedDevice = std::sync::Arc<Device>;

// Re-export from devinfo-types
pub use devinfo_types::uuids;
pub use devinfo_types::{
    DecodeError, DecodedField, DeviceInformation, FieldFailure, FieldKind, PnpId, SystemId,
    VendorIdSource,
};
