//! Trait abstraction over a connected GATT peripheral.
//!
//! [`GattDevice`] is the seam between the BLE session ([`crate::Device`]) and
//! everything that only needs to enumerate and read characteristics, so the
//! same orchestration runs against real hardware and [`crate::MockDevice`].

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// A connected peripheral whose characteristics can be enumerated and read.
///
/// # Example
///
/// ```ignore
/// use devinfo_core::{GattDevice, Result};
///
/// async fn print_battery<D: GattDevice>(device: &D) -> Result<()> {
///     let level = devinfo_core::info::read_battery(device).await?;
///     println!("Battery: {}%", level);
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait GattDevice: Send + Sync {
    /// Check if the device is connected.
    async fn is_connected(&self) -> bool;

    /// Disconnect from the device.
    async fn disconnect(&self) -> Result<()>;

    /// Get the device name, if available.
    fn name(&self) -> Option<&str>;

    /// Get the device address or identifier.
    ///
    /// On Linux/Windows this is typically the MAC address.
    /// On macOS this is a UUID since MAC addresses are not exposed.
    fn address(&self) -> &str;

    /// Characteristic UUIDs of a service, in the order the device enumerated them.
    ///
    /// Fails with [`crate::Error::ServiceNotFound`] if the service is absent.
    async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>>;

    /// Read the current value of a characteristic within `service`.
    ///
    /// Fails with [`crate::Error::ServiceNotFound`] if the service is absent
    /// and [`crate::Error::CharacteristicNotFound`] if the service does not
    /// list the characteristic.
    async fn read_characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>>;
}
