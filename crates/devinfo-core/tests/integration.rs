//! Hardware integration tests for devinfo-core
//!
//! These tests require actual BLE hardware and should be run with:
//! `cargo test --package devinfo-core --test integration -- --ignored --nocapture`
//!
//! Set the DEVINFO_DEVICE environment variable to the device to test:
//! `DEVINFO_DEVICE="Polar H10" cargo test --package devinfo-core -- --ignored`

use std::env;
use std::time::Duration;

use devinfo_core::scan::{ScanOptions, scan_with_options};
use devinfo_core::{ConnectionConfig, Device, FieldKind};
use tokio::time::timeout;

/// Default timeout for BLE operations.
const BLE_TIMEOUT: Duration = Duration::from_secs(30);

fn get_device_name() -> Option<String> {
    env::var("DEVINFO_DEVICE").ok().filter(|s| !s.is_empty())
}

async fn connect() -> Device {
    let Some(device_name) = get_device_name() else {
        panic!("DEVINFO_DEVICE is not set");
    };
    println!("Connecting to device: {}", device_name);

    match timeout(BLE_TIMEOUT, Device::connect(&device_name)).await {
        Ok(Ok(d)) => d,
        Ok(Err(e)) => panic!("Failed to connect to {}: {}", device_name, e),
        Err(_) => panic!("Connection timed out after {:?}", BLE_TIMEOUT),
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_scan_for_devices() {
    let options = ScanOptions::default().duration_secs(10).all_devices();

    match timeout(BLE_TIMEOUT, scan_with_options(options)).await {
        Ok(Ok(devices)) => {
            println!("Found {} devices", devices.len());
            for device in devices {
                println!(
                    "  {} ({}) device_info={}",
                    device.name.as_deref().unwrap_or("Unknown"),
                    device.identifier,
                    device.advertises_device_info
                );
            }
        }
        Ok(Err(e)) => panic!("Scan failed: {}", e),
        Err(_) => panic!("Scan timed out after {:?}", BLE_TIMEOUT),
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_read_device_information() {
    let device = connect().await;

    let information = timeout(BLE_TIMEOUT, device.read_device_information())
        .await
        .expect("read timed out")
        .expect("read failed");

    println!("{}", information.to_text());
    for failure in &information.failures {
        println!("  failed: {} ({})", failure.kind, failure.reason);
    }
    assert!(
        information.fields.iter().all(|f| f.kind != FieldKind::Unknown),
        "unknown fields must never reach the report"
    );

    device.disconnect().await.expect("disconnect failed");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_read_battery() {
    let device = connect().await;

    match timeout(Duration::from_secs(10), device.read_battery()).await {
        Ok(Ok(level)) => {
            println!("Battery: {}%", level);
            assert!(level <= 100);
        }
        Ok(Err(e)) => println!("Battery not available: {}", e),
        Err(_) => panic!("Battery read timed out"),
    }

    device.disconnect().await.expect("disconnect failed");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_watch_disconnect() {
    let Some(device_name) = get_device_name() else {
        panic!("DEVINFO_DEVICE is not set");
    };
    let device = Device::connect_with_config(&device_name, ConnectionConfig::fast())
        .await
        .expect("connect failed");

    let mut disconnected = device.watch_disconnect().await.expect("watch failed");
    assert!(!*disconnected.borrow());

    device.disconnect().await.expect("disconnect failed");
    // the watcher is stopped by disconnect, so the channel closes
    assert!(
        timeout(Duration::from_secs(5), disconnected.changed())
            .await
            .is_ok()
    );
}
