//! Battery and Device Information reads over any [`GattDevice`].
//!
//! Reads run concurrently; results are assembled in the order the device
//! enumerated its characteristics, whatever order the reads complete in.

use std::collections::HashSet;

use futures::future::join_all;
use tracing::{debug, info, warn};

use devinfo_types::uuids::{BATTERY_LEVEL, BATTERY_SERVICE, DEVICE_INFO_SERVICE};
use devinfo_types::{DeviceInformation, FieldFailure, decode_battery_level, decode_field, resolve};

use crate::error::Result;
use crate::traits::GattDevice;

/// Read the battery level (0-100) from the Battery service.
pub async fn read_battery<D: GattDevice + ?Sized>(device: &D) -> Result<u8> {
    let data = device
        .read_characteristic(BATTERY_SERVICE, BATTERY_LEVEL)
        .await?;
    let level = decode_battery_level(&data)?;
    debug!("Battery level: {}%", level);
    Ok(level)
}

/// Read and decode every recognised Device Information characteristic.
///
/// Characteristics the registry does not know are logged and listed in
/// [`DeviceInformation::unrecognized`]. A characteristic listed more than
/// once is read once, at its first position. Fields whose read or decode
/// fails are recorded in [`DeviceInformation::failures`] and left out of the
/// report.
///
/// # Errors
///
/// Fails only if the Device Information service cannot be enumerated.
pub async fn read_device_information<D: GattDevice + ?Sized>(
    device: &D,
) -> Result<DeviceInformation> {
    let listed = device.characteristics(DEVICE_INFO_SERVICE).await?;
    debug!("Device Information lists {} characteristics", listed.len());

    let mut information = DeviceInformation::default();
    let mut seen = HashSet::new();
    let mut wanted = Vec::new();

    for uuid in listed {
        let kind = resolve(&uuid);
        if !kind.is_known() {
            info!("Skipping unrecognized characteristic {}", uuid);
            information.unrecognized.push(uuid.to_string());
            continue;
        }
        if !seen.insert(kind) {
            debug!("Skipping duplicate {} characteristic {}", kind, uuid);
            continue;
        }
        wanted.push((kind, uuid));
    }

    let results = join_all(
        wanted
            .iter()
            .map(|(_, uuid)| device.read_characteristic(DEVICE_INFO_SERVICE, *uuid)),
    )
    .await;

    for ((kind, uuid), result) in wanted.into_iter().zip(results) {
        let decoded = match result {
            Ok(data) => decode_field(kind, &data).map_err(crate::Error::from),
            Err(e) => Err(e),
        };
        match decoded {
            Ok(field) => information.fields.push(field),
            Err(e) => {
                warn!("Failed to read {} ({}): {}", kind, uuid, e);
                information.failures.push(FieldFailure {
                    kind,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Read {} device information field(s), {} failed, {} unrecognized",
        information.fields.len(),
        information.failures.len(),
        information.unrecognized.len()
    );
    Ok(information)
}
