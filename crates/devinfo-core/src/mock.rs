//! Mock device implementation for testing.
//!
//! [`MockDevice`] implements [`GattDevice`], so the device-information and
//! battery orchestration in [`crate::info`] can run without BLE hardware.
//!
//! # Features
//!
//! - **Per-characteristic values** grouped into services in enumeration order
//! - **Failure injection**: fail specific characteristics, every read, or the
//!   next N reads
//! - **Latency simulation**: a global read delay plus per-characteristic delays

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use devinfo_types::uuids::{
    BATTERY_LEVEL, BATTERY_SERVICE, DEVICE_INFO_SERVICE, FIRMWARE_REVISION, MANUFACTURER_NAME,
    MODEL_NUMBER,
};

use crate::error::{Error, Result};
use crate::traits::GattDevice;

/// A mock peripheral for testing.
///
/// # Example
///
/// ```
/// use devinfo_core::{MockDeviceBuilder, info};
///
/// #[tokio::main]
/// async fn main() {
///     let device = MockDeviceBuilder::new().battery(42).build();
///     assert_eq!(info::read_battery(&device).await.unwrap(), 42);
/// }
/// ```
pub struct MockDevice {
    name: String,
    address: String,
    connected: AtomicBool,
    /// Services and their characteristics, in enumeration order.
    services: RwLock<Vec<(Uuid, Vec<Uuid>)>>,
    /// Values by (service, characteristic) UUID.
    values: RwLock<HashMap<(Uuid, Uuid), Vec<u8>>>,
    failing: RwLock<HashSet<Uuid>>,
    latencies: RwLock<HashMap<Uuid, Duration>>,
    read_count: AtomicU32,
    should_fail: AtomicBool,
    /// Simulated latency applied to every read, in milliseconds.
    read_latency_ms: AtomicU64,
    remaining_failures: AtomicU32,
}

impl std::fmt::Debug for MockDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDevice")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("connected", &self.connected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MockDevice {
    /// Create a connected mock device with a typical Device Information
    /// service and an 85% battery.
    pub fn new(name: &str) -> Self {
        MockDeviceBuilder::new().name(name).build()
    }

    /// Connect to the mock device.
    pub async fn connect(&self) -> Result<()> {
        if self.should_fail.load(Ordering::Relaxed) {
            return Err(Error::device_not_found(self.name.clone()));
        }
        self.connected.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Disconnect from the mock device.
    pub async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Check if connected (sync method for internal use).
    pub fn is_connected_sync(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Get the device name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the device address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Characteristic UUIDs of a service, in enumeration order.
    pub async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>> {
        self.check_connected()?;
        self.services
            .read()
            .await
            .iter()
            .find(|(uuid, _)| *uuid == service)
            .map(|(_, characteristics)| characteristics.clone())
            .ok_or_else(|| Error::service_not_found(service.to_string()))
    }

    /// Read a characteristic value within a service.
    pub async fn read_characteristic(&self, service: Uuid, uuid: Uuid) -> Result<Vec<u8>> {
        self.check_connected()?;

        let delay = self.latencies.read().await.get(&uuid).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check_should_fail(uuid).await?;

        if let Some(value) = self.values.read().await.get(&(service, uuid)).cloned() {
            self.read_count.fetch_add(1, Ordering::Relaxed);
            return Ok(value);
        }

        let has_service = self.services.read().await.iter().any(|(s, _)| *s == service);
        if has_service {
            Err(Error::characteristic_not_found(uuid.to_string(), 1))
        } else {
            Err(Error::service_not_found(service.to_string()))
        }
    }

    fn check_connected(&self) -> Result<()> {
        if !self.connected.load(Ordering::Relaxed) {
            Err(Error::NotConnected)
        } else {
            Ok(())
        }
    }

    async fn check_should_fail(&self, uuid: Uuid) -> Result<()> {
        let latency = self.read_latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::read_failed(uuid.to_string(), "transient mock failure"));
        }

        if self.should_fail.load(Ordering::Relaxed) || self.failing.read().await.contains(&uuid) {
            Err(Error::read_failed(uuid.to_string(), "mock failure"))
        } else {
            Ok(())
        }
    }

    // --- Test control methods ---

    /// Replace the value of a characteristic the device already lists.
    ///
    /// Characteristics missing from `service` are ignored.
    pub async fn set_value(&self, service: Uuid, uuid: Uuid, value: impl Into<Vec<u8>>) {
        if let Some(current) = self.values.write().await.get_mut(&(service, uuid)) {
            *current = value.into();
        }
    }

    /// Set the battery level.
    pub async fn set_battery(&self, level: u8) {
        self.set_value(BATTERY_SERVICE, BATTERY_LEVEL, [level]).await;
    }

    /// Make every read (and connect) fail.
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Make reads of one characteristic fail.
    pub async fn fail_characteristic(&self, uuid: Uuid) {
        self.failing.write().await.insert(uuid);
    }

    /// Number of successful reads so far.
    pub fn read_count(&self) -> u32 {
        self.read_count.load(Ordering::Relaxed)
    }

    /// Reset read count.
    pub fn reset_read_count(&self) {
        self.read_count.store(0, Ordering::Relaxed);
    }

    /// Delay every read by `latency`. `Duration::ZERO` disables it.
    pub fn set_read_latency(&self, latency: Duration) {
        self.read_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Fail the next `count` reads, then succeed.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Get the number of remaining transient failures.
    pub fn remaining_failures(&self) -> u32 {
        self.remaining_failures.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl GattDevice for MockDevice {
    async fn is_connected(&self) -> bool {
        self.is_connected_sync()
    }

    async fn disconnect(&self) -> Result<()> {
        MockDevice::disconnect(self).await
    }

    fn name(&self) -> Option<&str> {
        Some(MockDevice::name(self))
    }

    fn address(&self) -> &str {
        MockDevice::address(self)
    }

    async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>> {
        MockDevice::characteristics(self, service).await
    }

    async fn read_characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>> {
        MockDevice::read_characteristic(self, service, characteristic).await
    }
}

/// Builder for creating mock devices with custom services.
///
/// Starts with a Device Information service exposing manufacturer, model and
/// firmware strings, and a Battery service at 85%. Use
/// [`MockDeviceBuilder::empty`] to start without any services.
#[derive(Debug, Clone)]
pub struct MockDeviceBuilder {
    name: String,
    address: String,
    services: Vec<(Uuid, Vec<Uuid>)>,
    values: HashMap<(Uuid, Uuid), Vec<u8>>,
    failing: HashSet<Uuid>,
    latencies: HashMap<Uuid, Duration>,
    auto_connect: bool,
}

impl Default for MockDeviceBuilder {
    fn default() -> Self {
        Self::empty()
            .device_info(MANUFACTURER_NAME, "Mock Manufacturer")
            .device_info(MODEL_NUMBER, "MK-1")
            .device_info(FIRMWARE_REVISION, "1.0.0")
            .battery(85)
    }
}

impl MockDeviceBuilder {
    /// Create a new builder with the default services.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with no services at all.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            name: "Mock Device".to_string(),
            address: format!("MOCK-{:06X}", rand::random::<u32>() % 0xFFFFFF),
            services: Vec::new(),
            values: HashMap::new(),
            failing: HashSet::new(),
            latencies: HashMap::new(),
            auto_connect: true,
        }
    }

    /// Set the device name.
    #[must_use]
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the device address.
    #[must_use]
    pub fn address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Declare a service with no characteristics yet.
    #[must_use]
    pub fn service(mut self, service: Uuid) -> Self {
        self.service_entry(service);
        self
    }

    /// Append a characteristic with a value to a service.
    ///
    /// Listing the same characteristic twice in a service keeps both
    /// entries in the enumeration; the last value wins. Other services may
    /// reuse the UUID with their own value.
    #[must_use]
    pub fn characteristic(mut self, service: Uuid, uuid: Uuid, value: impl Into<Vec<u8>>) -> Self {
        self.service_entry(service).push(uuid);
        self.values.insert((service, uuid), value.into());
        self
    }

    /// Append a characteristic to the Device Information service.
    #[must_use]
    pub fn device_info(self, uuid: Uuid, value: impl Into<Vec<u8>>) -> Self {
        self.characteristic(DEVICE_INFO_SERVICE, uuid, value)
    }

    /// Set the battery level, adding the Battery service if needed.
    #[must_use]
    pub fn battery(mut self, level: u8) -> Self {
        if self
            .values
            .insert((BATTERY_SERVICE, BATTERY_LEVEL), vec![level])
            .is_none()
        {
            self.service_entry(BATTERY_SERVICE).push(BATTERY_LEVEL);
        }
        self
    }

    /// Make reads of a characteristic fail.
    #[must_use]
    pub fn failing(mut self, uuid: Uuid) -> Self {
        self.failing.insert(uuid);
        self
    }

    /// Delay reads of a characteristic.
    #[must_use]
    pub fn latency(mut self, uuid: Uuid, delay: Duration) -> Self {
        self.latencies.insert(uuid, delay);
        self
    }

    /// Set whether the device starts connected.
    #[must_use]
    pub fn auto_connect(mut self, auto: bool) -> Self {
        self.auto_connect = auto;
        self
    }

    fn service_entry(&mut self, service: Uuid) -> &mut Vec<Uuid> {
        let index = match self.services.iter().position(|(uuid, _)| *uuid == service) {
            Some(index) => index,
            None => {
                self.services.push((service, Vec::new()));
                self.services.len() - 1
            }
        };
        &mut self.services[index].1
    }

    /// Build the mock device.
    #[must_use]
    pub fn build(self) -> MockDevice {
        MockDevice {
            name: self.name,
            address: self.address,
            connected: AtomicBool::new(self.auto_connect),
            services: RwLock::new(self.services),
            values: RwLock::new(self.values),
            failing: RwLock::new(self.failing),
            latencies: RwLock::new(self.latencies),
            read_count: AtomicU32::new(0),
            should_fail: AtomicBool::new(false),
            read_latency_ms: AtomicU64::new(0),
            remaining_failures: AtomicU32::new(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devinfo_types::uuids::{PNP_ID, SERIAL_NUMBER};

    #[tokio::test]
    async fn test_mock_device_connect() {
        let device = MockDeviceBuilder::new().auto_connect(false).build();
        assert!(!device.is_connected_sync());

        device.connect().await.unwrap();
        assert!(device.is_connected_sync());

        device.disconnect().await.unwrap();
        assert!(!device.is_connected_sync());
    }

    #[tokio::test]
    async fn test_mock_device_not_connected() {
        let device = MockDeviceBuilder::new().auto_connect(false).build();

        let result = device
            .read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL)
            .await;
        assert!(matches!(result, Err(Error::NotConnected)));

        let result = device.characteristics(DEVICE_INFO_SERVICE).await;
        assert!(matches!(result, Err(Error::NotConnected)));
    }

    #[test]
    fn test_builder_defaults() {
        let builder = MockDeviceBuilder::new();
        assert_eq!(builder.name, "Mock Device");
        assert!(builder.auto_connect);
        assert_eq!(builder.services.len(), 2);
        assert_eq!(
            builder.values.get(&(BATTERY_SERVICE, BATTERY_LEVEL)),
            Some(&vec![85])
        );
    }

    #[tokio::test]
    async fn test_characteristics_keep_enumeration_order() {
        let device = MockDeviceBuilder::empty()
            .device_info(PNP_ID, [1u8, 0, 0, 0, 0, 0, 0])
            .device_info(SERIAL_NUMBER, "SN-1")
            .device_info(MANUFACTURER_NAME, "Acme")
            .build();

        let listed = device.characteristics(DEVICE_INFO_SERVICE).await.unwrap();
        assert_eq!(listed, vec![PNP_ID, SERIAL_NUMBER, MANUFACTURER_NAME]);
    }

    #[tokio::test]
    async fn test_missing_service() {
        let device = MockDeviceBuilder::empty().battery(50).build();
        let result = device.characteristics(DEVICE_INFO_SERVICE).await;
        assert!(matches!(result, Err(Error::ServiceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_missing_characteristic() {
        let device = MockDeviceBuilder::empty()
            .device_info(MANUFACTURER_NAME, "Acme")
            .build();
        let result = device
            .read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER)
            .await;
        assert!(matches!(result, Err(Error::CharacteristicNotFound { .. })));

        let result = device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await;
        assert!(matches!(result, Err(Error::ServiceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_reads_are_scoped_to_service() {
        let custom_service = Uuid::from_u128(0x0000_fe00_0000_1000_8000_0080_5f9b_34fb);
        let device = MockDeviceBuilder::empty()
            .characteristic(custom_service, MODEL_NUMBER, "vendor model")
            .device_info(MODEL_NUMBER, "MK-1")
            .build();

        let dis = device
            .read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER)
            .await
            .unwrap();
        assert_eq!(dis, b"MK-1".to_vec());

        let vendor = device
            .read_characteristic(custom_service, MODEL_NUMBER)
            .await
            .unwrap();
        assert_eq!(vendor, b"vendor model".to_vec());

        device.set_value(custom_service, MODEL_NUMBER, "changed").await;
        let dis = device
            .read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER)
            .await
            .unwrap();
        assert_eq!(dis, b"MK-1".to_vec());
    }

    #[tokio::test]
    async fn test_mock_device_read_count() {
        let device = MockDeviceBuilder::new().build();
        assert_eq!(device.read_count(), 0);

        device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await.unwrap();
        assert_eq!(device.read_count(), 1);

        device.read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER).await.unwrap();
        device.read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER).await.unwrap();
        assert_eq!(device.read_count(), 3);

        device.reset_read_count();
        assert_eq!(device.read_count(), 0);
    }

    #[tokio::test]
    async fn test_failing_characteristic() {
        let device = MockDeviceBuilder::new().failing(MODEL_NUMBER).build();

        let result = device.read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER).await;
        assert!(matches!(result, Err(Error::ReadFailed { .. })));
        assert!(device.read_characteristic(DEVICE_INFO_SERVICE, MANUFACTURER_NAME).await.is_ok());

        device.fail_characteristic(MANUFACTURER_NAME).await;
        assert!(device.read_characteristic(DEVICE_INFO_SERVICE, MANUFACTURER_NAME).await.is_err());
    }

    #[tokio::test]
    async fn test_should_fail() {
        let device = MockDeviceBuilder::new().build();
        device.set_should_fail(true);
        assert!(device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await.is_err());
        assert!(device.connect().await.is_err());

        device.set_should_fail(false);
        assert!(device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_device_transient_failures() {
        let device = MockDeviceBuilder::new().build();
        device.set_transient_failures(2);

        assert!(device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await.is_err());
        assert!(device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await.is_err());
        assert_eq!(device.remaining_failures(), 0);

        assert!(device.read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL).await.is_ok());
    }

    #[tokio::test]
    async fn test_set_values() {
        let device = MockDeviceBuilder::new().build();

        device.set_battery(12).await;
        assert_eq!(
            device
                .read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL)
                .await
                .unwrap(),
            vec![12]
        );

        device.set_value(DEVICE_INFO_SERVICE, MODEL_NUMBER, "MK-2").await;
        assert_eq!(
            device.read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER).await.unwrap(),
            b"MK-2".to_vec()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_latency() {
        let device = MockDeviceBuilder::new()
            .latency(MODEL_NUMBER, Duration::from_millis(200))
            .build();
        device.set_read_latency(Duration::from_millis(50));

        let start = tokio::time::Instant::now();
        device.read_characteristic(DEVICE_INFO_SERVICE, MODEL_NUMBER).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_gatt_device_trait() {
        let device = MockDevice::new("Trait Test");

        async fn check_via_trait<D: GattDevice>(d: &D) -> (Option<String>, bool) {
            (d.name().map(str::to_string), d.is_connected().await)
        }

        let (name, connected) = check_via_trait(&device).await;
        assert_eq!(name.as_deref(), Some("Trait Test"));
        assert!(connected);
    }

    #[tokio::test]
    async fn test_mock_device_debug() {
        let device = MockDeviceBuilder::new().address("MOCK-000001").build();
        let debug = format!("{:?}", device);
        assert!(debug.contains("MOCK-000001"));
        assert!(debug.contains("Mock Device"));
    }
}
