//! Bluetooth UUIDs for the Battery and Device Information services.
//!
//! Standard GATT attributes use 16-bit assigned numbers on the Bluetooth
//! SIG base UUID `0000xxxx-0000-1000-8000-00805f9b34fb`.

use uuid::{Uuid, uuid};

/// The Bluetooth SIG base UUID with a zero assigned number.
pub const BLUETOOTH_BASE: Uuid = uuid!("00000000-0000-1000-8000-00805f9b34fb");

const BASE_MASK: u128 = !(0xFFFF_FFFF_u128 << 96);

/// Expand a 16-bit assigned number onto the Bluetooth SIG base UUID.
pub const fn from_short(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE.as_u128() | ((short as u128) << 96))
}

/// Return the 16-bit assigned number if `uuid` lies on the SIG base.
pub fn to_short(uuid: &Uuid) -> Option<u16> {
    let value = uuid.as_u128();
    if value & BASE_MASK != BLUETOOTH_BASE.as_u128() {
        return None;
    }
    u16::try_from(value >> 96).ok()
}

// --- Standard BLE Service UUIDs ---

/// Device Information service.
pub const DEVICE_INFO_SERVICE: Uuid = uuid!("0000180a-0000-1000-8000-00805f9b34fb");

/// Battery service.
pub const BATTERY_SERVICE: Uuid = uuid!("0000180f-0000-1000-8000-00805f9b34fb");

// --- Device Information Characteristic UUIDs ---

/// System ID characteristic.
pub const SYSTEM_ID: Uuid = uuid!("00002a23-0000-1000-8000-00805f9b34fb");

/// Model number string characteristic.
pub const MODEL_NUMBER: Uuid = uuid!("00002a24-0000-1000-8000-00805f9b34fb");

/// Serial number string characteristic. Not part of the decoded field set.
pub const SERIAL_NUMBER: Uuid = uuid!("00002a25-0000-1000-8000-00805f9b34fb");

/// Firmware revision string characteristic.
pub const FIRMWARE_REVISION: Uuid = uuid!("00002a26-0000-1000-8000-00805f9b34fb");

/// Hardware revision string characteristic.
pub const HARDWARE_REVISION: Uuid = uuid!("00002a27-0000-1000-8000-00805f9b34fb");

/// Software revision string characteristic.
pub const SOFTWARE_REVISION: Uuid = uuid!("00002a28-0000-1000-8000-00805f9b34fb");

/// Manufacturer name string characteristic.
pub const MANUFACTURER_NAME: Uuid = uuid!("00002a29-0000-1000-8000-00805f9b34fb");

/// IEEE 11073-20601 regulatory certification data list characteristic.
pub const REGULATORY_CERTIFICATION_LIST: Uuid =
    uuid!("00002a2a-0000-1000-8000-00805f9b34fb");

/// PnP ID characteristic.
pub const PNP_ID: Uuid = uuid!("00002a50-0000-1000-8000-00805f9b34fb");

// --- Battery Characteristic UUIDs ---

/// Battery level characteristic.
pub const BATTERY_LEVEL: Uuid = uuid!("00002a19-0000-1000-8000-00805f9b34fb");
