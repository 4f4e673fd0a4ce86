//! Output formatting utilities for text and JSON output.

use anyhow::Result;
use devinfo_core::{DeviceInformation, DiscoveredDevice};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            compact: false,
        }
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

// ============================================================================
// Scan formatting
// ============================================================================

pub fn format_scan_json(devices: &[DiscoveredDevice], opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct ScanResult<'a> {
        count: usize,
        devices: &'a [DiscoveredDevice],
    }

    opts.as_json(&ScanResult {
        count: devices.len(),
        devices,
    })
}

/// Format scan results as a table, with an alias column when any device
/// has one.
#[must_use]
pub fn format_scan_text(
    devices: &[DiscoveredDevice],
    opts: &FormatOptions,
    aliases: &std::collections::HashMap<String, String>,
    show_tips: bool,
) -> String {
    use tabled::builder::Builder;

    if devices.is_empty() {
        return "No BLE devices found.\n".to_string();
    }

    let alias_for = |identifier: &str| {
        let id_lower = identifier.to_lowercase();
        aliases
            .iter()
            .find(|(_, v)| v.to_lowercase() == id_lower)
            .map(|(k, _)| k.clone())
    };
    let has_aliases = devices.iter().any(|d| alias_for(&d.identifier).is_some());

    let count = if opts.no_color {
        devices.len().to_string()
    } else {
        format!("{}", devices.len().to_string().green().bold())
    };
    let header = format!("Found {} device(s)\n\n", count);

    let mut builder = Builder::default();
    let mut columns = vec!["Name"];
    if has_aliases {
        columns.push("Alias");
    }
    columns.extend(["Signal", "Services", "Identifier"]);
    builder.push_record(columns);

    for d in devices {
        let name = d.name.as_deref().unwrap_or("Unknown");
        let mut row = vec![if opts.no_color {
            name.to_string()
        } else {
            format!("{}", name.cyan())
        }];
        if has_aliases {
            row.push(alias_for(&d.identifier).unwrap_or_else(|| "-".to_string()));
        }
        row.push(style::format_signal_bar(d.rssi, opts.no_color));
        row.push(advertised_services(d));
        row.push(d.identifier.clone());
        builder.push_record(row);
    }

    let mut table = builder.build();
    style::apply_table_style(&mut table, opts.no_color);

    let mut output = format!("{}{}\n", header, table);
    if show_tips {
        output.push_str(&format_scan_tips(opts.no_color));
    }
    output
}

fn advertised_services(device: &DiscoveredDevice) -> String {
    match (device.advertises_device_info, device.advertises_battery) {
        (true, true) => "info, battery".to_string(),
        (true, false) => "info".to_string(),
        (false, true) => "battery".to_string(),
        (false, false) => "-".to_string(),
    }
}

/// Format helpful tips shown after scan results.
#[must_use]
pub fn format_scan_tips(no_color: bool) -> String {
    let tip_label = if no_color {
        "Tip:".to_string()
    } else {
        format!("{}", "Tip:".yellow().bold())
    };
    format!(
        "\n{} Use 'devinfo alias set <name> <identifier>' to save a device alias\n     Use 'devinfo config set device <identifier>' to set as default\n",
        tip_label
    )
}

// ============================================================================
// Battery formatting
// ============================================================================

#[derive(Serialize)]
struct BatteryJson<'a> {
    device: Option<&'a str>,
    address: &'a str,
    battery: u8,
}

#[must_use]
pub fn format_battery_text(level: u8, opts: &FormatOptions) -> String {
    format!(
        "Battery: {}\n",
        style::format_battery_colored(level, opts.no_color)
    )
}

pub fn format_battery_json(
    name: Option<&str>,
    address: &str,
    level: u8,
    opts: &FormatOptions,
) -> Result<String> {
    opts.as_json(&BatteryJson {
        device: name,
        address,
        battery: level,
    })
}

// ============================================================================
// Device Information formatting
// ============================================================================

/// The `> Label: value` report, one line per decoded field.
#[must_use]
pub fn format_info_text(info: &DeviceInformation) -> String {
    if info.is_empty() {
        return String::new();
    }
    format!("{}\n", info.to_text())
}

pub fn format_info_json(
    name: Option<&str>,
    address: &str,
    info: &DeviceInformation,
    opts: &FormatOptions,
) -> Result<String> {
    #[derive(Serialize)]
    struct InfoJson<'a> {
        device: Option<&'a str>,
        address: &'a str,
        #[serde(flatten)]
        information: &'a DeviceInformation,
    }

    opts.as_json(&InfoJson {
        device: name,
        address,
        information: info,
    })
}
