//! Visual styling utilities for the CLI.
//!
//! Spinners for long-running BLE operations, colour thresholds and table
//! styling shared by every command.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

// ============================================================================
// Spinners
// ============================================================================

/// Standard spinner tick characters (Braille dots animation)
const SPINNER_TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Standard spinner tick interval
const SPINNER_TICK_MS: u64 = 80;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .expect("valid template")
        .tick_chars(SPINNER_TICK_CHARS)
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    pb
}

/// Create a spinner for scanning operations.
pub fn scanning_spinner(timeout_secs: u64) -> ProgressBar {
    spinner(format!("Scanning for BLE devices... ({}s)", timeout_secs))
}

/// Create a spinner for connecting to a device.
pub fn connecting_spinner(device: &str) -> ProgressBar {
    spinner(format!("Connecting to {}...", device))
}

// ============================================================================
// Color Thresholds
// ============================================================================

/// Battery thresholds (percentage).
pub mod battery {
    pub const LOW: u8 = 20; // Red: < 20%
    pub const MEDIUM: u8 = 40; // Yellow: 20-40%
    // Green: > 40%
}

/// Format battery percentage with appropriate color.
pub fn format_battery_colored(percent: u8, no_color: bool) -> String {
    if no_color {
        return format!("{}%", percent);
    }

    if percent < battery::LOW {
        format!("{}%", percent.red())
    } else if percent < battery::MEDIUM {
        format!("{}%", percent.yellow())
    } else {
        format!("{}%", percent.green())
    }
}

/// Render RSSI as a ten-cell bar followed by the dBm value.
pub fn format_signal_bar(rssi: Option<i16>, no_color: bool) -> String {
    let Some(rssi) = rssi else {
        return "N/A".to_string();
    };

    // -30 dBm = excellent (10), -100 dBm = very weak (0)
    let filled = ((rssi + 100).clamp(0, 70) as f32 / 7.0).round() as usize;
    let filled = filled.min(10);
    let bar = format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled));

    if no_color {
        format!("{} {:>3}", bar, rssi)
    } else if filled >= 7 {
        format!("{} {:>3}", bar.green(), rssi)
    } else if filled >= 4 {
        format!("{} {:>3}", bar.yellow(), rssi)
    } else {
        format!("{} {:>3}", bar.red(), rssi)
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Format a success message.
pub fn format_success(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[OK] {}", message)
    } else {
        format!("{} {}", "[OK]".green(), message)
    }
}

/// Format a warning message.
pub fn format_warning(message: &str, no_color: bool) -> String {
    if no_color {
        format!("[!!] {}", message)
    } else {
        format!("{} {}", "[!!]".yellow(), message)
    }
}

/// Format a section title with an underline.
pub fn format_title(title: &str, no_color: bool) -> String {
    let underline = "━".repeat(title.chars().count());
    if no_color {
        format!("{}\n{}", title, underline)
    } else {
        format!("{}\n{}", title.bold(), underline.dimmed())
    }
}

/// Rounded borders normally, no borders when colour is off.
pub fn apply_table_style(table: &mut tabled::Table, no_color: bool) {
    use tabled::settings::Style;
    if no_color {
        table.with(Style::blank());
    } else {
        table.with(Style::rounded());
    }
}
