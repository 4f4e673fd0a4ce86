//! Device discovery and scanning.
//!
//! Any advertising peripheral is a candidate: Device Information is a
//! standard service, so there is no vendor filter.

use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, PeripheralProperties, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::util::{create_identifier, format_peripheral_id, matches_identifier};
use devinfo_types::uuids::{BATTERY_SERVICE, DEVICE_INFO_SERVICE};

/// Information about a discovered peripheral.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    /// The advertised local name.
    pub name: Option<String>,
    /// The peripheral ID for connecting.
    #[serde(skip)]
    pub id: PeripheralId,
    /// The BLE address as a string (may be zeros on macOS, use `id` instead).
    pub address: String,
    /// A connection identifier (peripheral ID on macOS, address on other platforms).
    pub identifier: String,
    /// RSSI signal strength.
    pub rssi: Option<i16>,
    /// Whether the Device Information service was advertised.
    pub advertises_device_info: bool,
    /// Whether the Battery service was advertised.
    pub advertises_battery: bool,
}

/// Options for scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// How long to scan for devices.
    pub duration: Duration,
    /// Only return peripherals that advertise a local name.
    pub named_only: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(5),
            named_only: true,
        }
    }
}

impl ScanOptions {
    /// Create new scan options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scan duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set scan duration in seconds.
    #[must_use]
    pub fn duration_secs(mut self, secs: u64) -> Self {
        self.duration = Duration::from_secs(secs);
        self
    }

    /// Set whether unnamed peripherals are dropped.
    #[must_use]
    pub fn named_only(mut self, named_only: bool) -> Self {
        self.named_only = named_only;
        self
    }

    /// Include unnamed peripherals.
    #[must_use]
    pub fn all_devices(self) -> Self {
        self.named_only(false)
    }
}

/// Get the first available Bluetooth adapter.
pub async fn get_adapter() -> Result<Adapter> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;

    adapters
        .into_iter()
        .next()
        .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))
}

/// Scan for peripherals in range with default options.
///
/// An empty list indicates no devices were found (not an error).
///
/// # Errors
///
/// Returns an error if no Bluetooth adapter is available or the scan could
/// not be started or stopped.
pub async fn scan_for_devices() -> Result<Vec<DiscoveredDevice>> {
    scan_with_options(ScanOptions::default()).await
}

/// Scan for devices with custom options.
pub async fn scan_with_options(options: ScanOptions) -> Result<Vec<DiscoveredDevice>> {
    let adapter = get_adapter().await?;
    scan_with_adapter(&adapter, options).await
}

/// Scan, retrying on failure or (optionally) on an empty result.
///
/// The delay between attempts starts at 500ms and doubles, capped at 5s.
pub async fn scan_with_retry(
    options: ScanOptions,
    max_retries: u32,
    retry_on_empty: bool,
) -> Result<Vec<DiscoveredDevice>> {
    let mut attempt = 0;
    let mut delay = Duration::from_millis(500);

    loop {
        match scan_with_options(options.clone()).await {
            Ok(devices) if devices.is_empty() && retry_on_empty && attempt < max_retries => {
                attempt += 1;
                warn!(
                    "No devices found, retrying ({}/{})...",
                    attempt, max_retries
                );
            }
            Ok(devices) => return Ok(devices),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                warn!(
                    "Scan failed ({}), retrying ({}/{})...",
                    e, attempt, max_retries
                );
            }
            Err(e) => return Err(e),
        }
        sleep(delay).await;
        delay = delay.saturating_mul(2).min(Duration::from_secs(5));
    }
}

/// Scan for devices using a specific adapter.
pub async fn scan_with_adapter(
    adapter: &Adapter,
    options: ScanOptions,
) -> Result<Vec<DiscoveredDevice>> {
    info!(
        "Starting BLE scan for {} seconds...",
        options.duration.as_secs()
    );

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(options.duration).await;
    adapter.stop_scan().await?;

    let peripherals = adapter.peripherals().await?;
    let mut discovered = Vec::new();

    for peripheral in peripherals {
        match process_peripheral(&peripheral, options.named_only).await {
            Ok(Some(device)) => {
                debug!("Found device: {:?} ({})", device.name, device.identifier);
                discovered.push(device);
            }
            Ok(None) => {}
            Err(e) => {
                debug!("Error processing peripheral: {}", e);
            }
        }
    }

    // strongest signal first
    discovered.sort_by(|a, b| b.rssi.cmp(&a.rssi));

    info!("Scan complete. Found {} device(s)", discovered.len());
    Ok(discovered)
}

async fn process_peripheral(
    peripheral: &Peripheral,
    named_only: bool,
) -> Result<Option<DiscoveredDevice>> {
    let Some(properties) = peripheral.properties().await? else {
        return Ok(None);
    };

    if named_only && properties.local_name.is_none() {
        return Ok(None);
    }

    let id = peripheral.id();
    let address = properties.address.to_string();
    let identifier = create_identifier(&address, &id);

    Ok(Some(DiscoveredDevice {
        name: properties.local_name.clone(),
        advertises_device_info: advertises(&properties, DEVICE_INFO_SERVICE),
        advertises_battery: advertises(&properties, BATTERY_SERVICE),
        rssi: properties.rssi,
        id,
        address,
        identifier,
    }))
}

fn advertises(properties: &PeripheralProperties, service: uuid::Uuid) -> bool {
    properties.services.contains(&service) || properties.service_data.contains_key(&service)
}

/// Find a specific device by name or address.
pub async fn find_device(identifier: &str) -> Result<(Adapter, Peripheral)> {
    find_device_with_options(identifier, ScanOptions::default()).await
}

/// Number of scans [`find_device_with_options`] runs before giving up.
const SEARCH_ATTEMPTS: u32 = 3;

/// Find a specific device by name, address or peripheral ID.
///
/// Peripherals already known to the adapter are checked first. Otherwise up
/// to 3 scans are run, each longer than the last, since advertisements are
/// easily missed. Together the scans last `options.duration`.
pub async fn find_device_with_options(
    identifier: &str,
    options: ScanOptions,
) -> Result<(Adapter, Peripheral)> {
    let adapter = get_adapter().await?;

    info!("Looking for device: {}", identifier);

    if let Some(peripheral) = find_peripheral_by_identifier(&adapter, identifier).await? {
        info!("Found device in cache (no scan needed)");
        return Ok((adapter, peripheral));
    }

    let schedule = search_schedule(options.duration, SEARCH_ATTEMPTS);
    for (attempt, scan_duration) in (1..).zip(&schedule) {
        info!(
            "Scan attempt {}/{} ({:.1}s)...",
            attempt,
            SEARCH_ATTEMPTS,
            scan_duration.as_secs_f32()
        );

        adapter.start_scan(ScanFilter::default()).await?;
        sleep(*scan_duration).await;
        adapter.stop_scan().await?;

        if let Some(peripheral) = find_peripheral_by_identifier(&adapter, identifier).await? {
            info!("Found device on attempt {}", attempt);
            return Ok((adapter, peripheral));
        }

        if attempt < SEARCH_ATTEMPTS {
            warn!("Device not found, retrying...");
        }
    }

    warn!(
        "Device not found after {} attempts: {}",
        SEARCH_ATTEMPTS, identifier
    );
    Err(Error::device_not_found(identifier))
}

/// Split `total` into `attempts` scans weighted 1, 2, 3, ...
///
/// The scans sum to exactly `total`; the rounding remainder goes to the last.
fn search_schedule(total: Duration, attempts: u32) -> Vec<Duration> {
    let parts: u32 = (1..=attempts).sum();
    if parts == 0 {
        return Vec::new();
    }

    let unit = total / parts;
    let mut schedule: Vec<Duration> = (1..=attempts).map(|n| unit * n).collect();
    if let Some(last) = schedule.last_mut() {
        *last += total - unit * parts;
    }
    schedule
}

async fn find_peripheral_by_identifier(
    adapter: &Adapter,
    identifier: &str,
) -> Result<Option<Peripheral>> {
    let peripherals = adapter.peripherals().await?;

    for peripheral in peripherals {
        if let Ok(Some(props)) = peripheral.properties().await {
            let address = props.address.to_string();
            let peripheral_id = format_peripheral_id(&peripheral.id());

            if matches_identifier(
                identifier,
                &address,
                &peripheral_id,
                props.local_name.as_deref(),
            ) {
                debug!("Matched {} ({:?})", address, props.local_name);
                return Ok(Some(peripheral));
            }
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_options_defaults() {
        let options = ScanOptions::default();
        assert_eq!(options.duration, Duration::from_secs(5));
        assert!(options.named_only);
    }

    #[test]
    fn test_scan_options_builder() {
        let options = ScanOptions::new().duration_secs(12).all_devices();
        assert_eq!(options.duration, Duration::from_secs(12));
        assert!(!options.named_only);

        let options = ScanOptions::new().duration(Duration::from_millis(1500));
        assert_eq!(options.duration, Duration::from_millis(1500));
    }

    #[test]
    fn test_advertises_checks_services_and_service_data() {
        let mut props = PeripheralProperties::default();
        assert!(!advertises(&props, DEVICE_INFO_SERVICE));

        props.services.push(DEVICE_INFO_SERVICE);
        assert!(advertises(&props, DEVICE_INFO_SERVICE));
        assert!(!advertises(&props, BATTERY_SERVICE));

        props.service_data.insert(BATTERY_SERVICE, vec![90]);
        assert!(advertises(&props, BATTERY_SERVICE));
    }

    #[test]
    fn test_search_schedule_grows() {
        let schedule = search_schedule(Duration::from_secs(6), 3);
        assert_eq!(
            schedule,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
    }

    #[test]
    fn test_search_schedule_stays_within_budget() {
        for millis in [0, 1, 999, 5_000, 7_777, 30_000] {
            let total = Duration::from_millis(millis);
            let schedule = search_schedule(total, SEARCH_ATTEMPTS);
            assert_eq!(schedule.len(), SEARCH_ATTEMPTS as usize);
            assert_eq!(schedule.iter().sum::<Duration>(), total, "budget {}ms", millis);
            assert!(schedule.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_search_schedule_no_attempts() {
        assert!(search_schedule(Duration::from_secs(5), 0).is_empty());
    }
}
