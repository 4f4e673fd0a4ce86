//! Peripheral connection and communication.
//!
//! A [`Device`] is an explicit session with one connected peripheral. It owns
//! the BLE handles, the services discovered at connect time and any
//! background tasks it spawned, and releases them on [`Device::disconnect`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Characteristic, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retry::{RetryConfig, with_retry};
use crate::scan::{ScanOptions, find_device_with_options};
use crate::traits::GattDevice;
use crate::util::{create_identifier, format_peripheral_id};
use devinfo_types::DeviceInformation;

/// Default timeout for BLE characteristic read operations.
const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for BLE connection operations.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for service discovery.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for BLE connection timeouts and read retries.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use devinfo_core::{ConnectionConfig, RetryConfig};
///
/// let config = ConnectionConfig::default()
///     .connection_timeout(Duration::from_secs(20))
///     .read_retry(RetryConfig::for_read());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Budget for finding the peripheral, and again for connecting to it.
    pub connection_timeout: Duration,
    /// Timeout for a single characteristic read.
    pub read_timeout: Duration,
    /// Timeout for service discovery after connection.
    pub discovery_timeout: Duration,
    /// Retry policy for characteristic reads. No retries by default.
    pub read_retry: RetryConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            discovery_timeout: DEFAULT_DISCOVERY_TIMEOUT,
            read_retry: RetryConfig::none(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new connection config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Longer timeouts and a few read retries, for weak signals and busy
    /// radio environments.
    pub fn challenging_environment() -> Self {
        Self {
            connection_timeout: Duration::from_secs(25),
            read_timeout: Duration::from_secs(15),
            discovery_timeout: Duration::from_secs(15),
            read_retry: RetryConfig::for_read(),
        }
    }

    /// Short timeouts for nearby devices with strong signals.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(8),
            read_timeout: Duration::from_secs(5),
            discovery_timeout: Duration::from_secs(5),
            read_retry: RetryConfig::none(),
        }
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Set the read timeout.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the service discovery timeout.
    #[must_use]
    pub fn discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    /// Set the read retry policy.
    #[must_use]
    pub fn read_retry(mut self, retry: RetryConfig) -> Self {
        self.read_retry = retry;
        self
    }
}

/// A connected peripheral.
///
/// `Device` is not `Clone`: it represents one live BLE connection. Wrap it
/// in `Arc<Device>` to share it across tasks.
///
/// # Cleanup
///
/// Call [`Device::disconnect`] before dropping the device. Dropping a
/// connected device logs a warning and disconnects in the background.
pub struct Device {
    /// Kept alive for the lifetime of the connection; also the source of
    /// disconnect events.
    adapter: Adapter,
    peripheral: Peripheral,
    name: Option<String>,
    /// MAC address on Linux/Windows, peripheral UUID on macOS.
    address: String,
    /// Characteristics by (service, characteristic) UUID. Within a service
    /// the first occurrence wins.
    characteristics: HashMap<(Uuid, Uuid), Characteristic>,
    /// Characteristic UUIDs per service, in discovery order.
    services: HashMap<Uuid, Vec<Uuid>>,
    background_tasks: Mutex<Vec<JoinHandle<()>>>,
    disconnected: AtomicBool,
    config: ConnectionConfig,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("services", &self.services.len())
            .field("characteristics", &self.characteristics.len())
            .finish_non_exhaustive()
    }
}

impl Device {
    /// Connect to a peripheral by name, MAC address or peripheral ID.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use devinfo_core::Device;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let device = Device::connect("Polar H10").await?;
    ///     println!("{}", device.read_device_information().await?.to_text());
    ///     device.disconnect().await?;
    ///     Ok(())
    /// }
    /// ```
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect(identifier: &str) -> Result<Self> {
        Self::connect_with_config(identifier, ConnectionConfig::default()).await
    }

    /// Connect to a peripheral with full configuration.
    ///
    /// [`ConnectionConfig::connection_timeout`] is spent twice at most: once
    /// searching for the peripheral, then once on the connection attempt.
    #[tracing::instrument(level = "info", skip_all, fields(identifier = %identifier))]
    pub async fn connect_with_config(identifier: &str, config: ConnectionConfig) -> Result<Self> {
        let options = ScanOptions::new()
            .duration(config.connection_timeout)
            .all_devices();

        let (adapter, peripheral) = find_device_with_options(identifier, options).await?;

        Self::from_peripheral_with_config(adapter, peripheral, config).await
    }

    /// Create a Device from an already-discovered peripheral.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn from_peripheral(adapter: Adapter, peripheral: Peripheral) -> Result<Self> {
        Self::from_peripheral_with_config(adapter, peripheral, ConnectionConfig::default()).await
    }

    /// Create a Device from an already-discovered peripheral with full configuration.
    #[tracing::instrument(level = "info", skip_all, fields(connect_timeout = ?config.connection_timeout))]
    pub async fn from_peripheral_with_config(
        adapter: Adapter,
        peripheral: Peripheral,
        config: ConnectionConfig,
    ) -> Result<Self> {
        info!("Connecting to device...");
        timeout(config.connection_timeout, peripheral.connect())
            .await
            .map_err(|_| Error::timeout("connect to device", config.connection_timeout))??;
        info!("Connected!");

        info!("Discovering services...");
        timeout(config.discovery_timeout, peripheral.discover_services())
            .await
            .map_err(|_| Error::timeout("discover services", config.discovery_timeout))??;

        let discovered = peripheral.services();
        debug!("Found {} services", discovered.len());

        let mut characteristics = HashMap::new();
        let mut services: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for service in &discovered {
            debug!("  Service: {}", service.uuid);
            let listed = services.entry(service.uuid).or_default();
            for characteristic in &service.characteristics {
                debug!("    Characteristic: {}", characteristic.uuid);
                listed.push(characteristic.uuid);
                characteristics
                    .entry((service.uuid, characteristic.uuid))
                    .or_insert_with(|| characteristic.clone());
            }
        }

        let properties = peripheral.properties().await?;
        let name = properties.as_ref().and_then(|p| p.local_name.clone());

        // macOS reports 00:00:00:00:00:00, so fall back to the peripheral ID
        let address = properties
            .as_ref()
            .map(|p| create_identifier(&p.address.to_string(), &peripheral.id()))
            .unwrap_or_else(|| format_peripheral_id(&peripheral.id()));

        Ok(Self {
            adapter,
            peripheral,
            name,
            address,
            characteristics,
            services,
            background_tasks: Mutex::new(Vec::new()),
            disconnected: AtomicBool::new(false),
            config,
        })
    }

    /// Check if the device is connected (queries BLE stack state).
    pub async fn is_connected(&self) -> bool {
        self.peripheral.is_connected().await.unwrap_or(false)
    }

    /// Get the current connection configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get the device name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Get the device address or identifier.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Characteristic UUIDs of a discovered service, in discovery order.
    pub fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>> {
        self.services
            .get(&service)
            .cloned()
            .ok_or_else(|| Error::service_not_found(service.to_string()))
    }

    fn find_characteristic(&self, service: Uuid, uuid: Uuid) -> Result<&Characteristic> {
        if let Some(characteristic) = self.characteristics.get(&(service, uuid)) {
            return Ok(characteristic);
        }
        if self.services.contains_key(&service) {
            Err(Error::characteristic_not_found(uuid.to_string(), 1))
        } else {
            Err(Error::service_not_found(service.to_string()))
        }
    }

    /// Read a characteristic of `service` by UUID.
    ///
    /// The same characteristic UUID under another service is never read.
    /// Each attempt is bounded by [`ConnectionConfig::read_timeout`]; failed
    /// attempts are retried per [`ConnectionConfig::read_retry`].
    pub async fn read_characteristic(&self, service: Uuid, uuid: Uuid) -> Result<Vec<u8>> {
        let characteristic = self.find_characteristic(service, uuid)?;
        let peripheral = &self.peripheral;
        let read_timeout = self.config.read_timeout;

        with_retry(&self.config.read_retry, "read_characteristic", move || async move {
            let data = timeout(read_timeout, peripheral.read(characteristic))
                .await
                .map_err(|_| Error::timeout(format!("read characteristic {}", uuid), read_timeout))??;
            Ok(data)
        })
        .await
    }

    /// Read the battery level (0-100).
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn read_battery(&self) -> Result<u8> {
        crate::info::read_battery(self).await
    }

    /// Read and decode every Device Information characteristic.
    #[tracing::instrument(level = "debug", skip(self), fields(device_name = ?self.name))]
    pub async fn read_device_information(&self) -> Result<DeviceInformation> {
        crate::info::read_device_information(self).await
    }

    /// Watch for the peripheral disconnecting.
    ///
    /// Spawns a task that follows the adapter's events. When this
    /// peripheral disconnects the task logs it and sets the returned
    /// channel to `true`. The task is stopped by [`Device::disconnect`].
    pub async fn watch_disconnect(&self) -> Result<watch::Receiver<bool>> {
        let mut events = self.adapter.events().await?;
        let (tx, rx) = watch::channel(false);
        let id = self.peripheral.id();
        let address = self.address.clone();

        let handle = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let CentralEvent::DeviceDisconnected(disconnected) = event
                    && disconnected == id
                {
                    info!(device_address = %address, "Device disconnected");
                    let _ = tx.send(true);
                    break;
                }
            }
        });

        self.background_tasks.lock().await.push(handle);
        Ok(rx)
    }

    /// Disconnect from the device.
    ///
    /// Aborts background tasks, then disconnects the peripheral.
    #[tracing::instrument(level = "info", skip(self), fields(device_name = ?self.name))]
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from device...");
        self.disconnected.store(true, Ordering::SeqCst);

        {
            let mut handles = self.background_tasks.lock().await;
            for handle in handles.drain(..) {
                handle.abort();
            }
        }

        self.peripheral.disconnect().await?;
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            return;
        }

        warn!(
            device_name = ?self.name,
            device_address = %self.address,
            "Device dropped without calling disconnect() - performing best-effort cleanup"
        );

        if let Ok(mut handles) = self.background_tasks.try_lock() {
            for handle in handles.drain(..) {
                handle.abort();
            }
        }

        let peripheral = self.peripheral.clone();
        let address = self.address.clone();

        // the runtime may already be shutting down
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = peripheral.disconnect().await {
                    debug!(
                        device_address = %address,
                        error = %e,
                        "Best-effort disconnect failed (device may already be disconnected)"
                    );
                } else {
                    debug!(device_address = %address, "Best-effort disconnect completed");
                }
            });
        }
    }
}

#[async_trait]
impl GattDevice for Device {
    async fn is_connected(&self) -> bool {
        Device::is_connected(self).await
    }

    async fn disconnect(&self) -> Result<()> {
        Device::disconnect(self).await
    }

    fn name(&self) -> Option<&str> {
        Device::name(self)
    }

    fn address(&self) -> &str {
        Device::address(self)
    }

    async fn characteristics(&self, service: Uuid) -> Result<Vec<Uuid>> {
        Device::characteristics(self, service)
    }

    async fn read_characteristic(&self, service: Uuid, characteristic: Uuid) -> Result<Vec<u8>> {
        Device::read_characteristic(self, service, characteristic).await
    }
}
