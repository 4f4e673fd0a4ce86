//! Peripheral identifier helpers shared by scanning and the session.

use btleplug::platform::PeripheralId;

/// Address reported by platforms that hide the MAC (macOS).
pub const HIDDEN_ADDRESS: &str = "00:00:00:00:00:00";

/// Format a peripheral ID as a string.
///
/// On macOS peripheral IDs are CoreBluetooth UUIDs; elsewhere they wrap the
/// MAC address. The `PeripheralId(...)` debug wrapper is stripped.
pub fn format_peripheral_id(id: &PeripheralId) -> String {
    strip_id_wrapper(&format!("{:?}", id)).to_string()
}

fn strip_id_wrapper(debug: &str) -> &str {
    debug
        .trim_start_matches("PeripheralId(")
        .trim_end_matches(')')
}

/// The identifier a user should pass back to connect to this peripheral.
///
/// Uses the MAC address when the platform exposes it, the peripheral ID
/// otherwise.
pub fn create_identifier(address: &str, peripheral_id: &PeripheralId) -> String {
    if address == HIDDEN_ADDRESS {
        format_peripheral_id(peripheral_id)
    } else {
        address.to_string()
    }
}

/// Lowercase and strip `:` / `-` separators so `AA:BB` matches `aabb`.
pub fn normalize_address(address: &str) -> String {
    address
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether a peripheral matches a user-supplied identifier.
///
/// Matching is case-insensitive and tried in order: peripheral ID substring,
/// exact MAC address (separators optional, hidden addresses never match),
/// then device name substring.
pub fn matches_identifier(
    identifier: &str,
    address: &str,
    peripheral_id: &str,
    name: Option<&str>,
) -> bool {
    let identifier_lower = identifier.to_lowercase();
    if identifier_lower.is_empty() {
        return false;
    }

    if peripheral_id.to_lowercase().contains(&identifier_lower) {
        return true;
    }

    if address != HIDDEN_ADDRESS && normalize_address(address) == normalize_address(identifier) {
        return true;
    }

    name.is_some_and(|n| n.to_lowercase().contains(&identifier_lower))
}


/// Property-based tests for identifier matching.
///
/// Run with:
/// cargo test -p devinfo-core util::proptests
#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn mac() -> impl Strategy<Value = [u8; 6]> {
        any::<[u8; 6]>().prop_filter("not hidden", |b| b.iter().any(|&x| x != 0))
    }

    proptest! {
        #[test]
        fn normalize_address_is_idempotent(address in "[0-9A-Fa-f:-]{0,24}") {
            let once = normalize_address(&address);
            prop_assert_eq!(normalize_address(&once), once);
        }

        #[test]
        fn address_matches_with_any_separator_and_case(bytes in mac()) {
            let colon = bytes.iter().map(|b| format!("{:02X}", b)).collect::<Vec<_>>().join(":");
            let dashed = colon.replace(':', "-").to_lowercase();
            let bare = colon.replace(':', "");

            prop_assert!(matches_identifier(&dashed, &colon, "", None));
            prop_assert!(matches_identifier(&bare, &colon, "", None));
        }

        #[test]
        fn hidden_address_never_matches(identifier in "[0-9a-f:]{1,17}") {
            prop_assume!(!"hci0".contains(&identifier));
            prop_assert!(!matches_identifier(&identifier, HIDDEN_ADDRESS, "hci0", None));
        }
    }
}
