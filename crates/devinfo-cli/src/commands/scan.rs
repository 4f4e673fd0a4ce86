//! Scan command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use devinfo_core::{ScanOptions, scan_with_retry};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, format_scan_json, format_scan_text};
use crate::style;
use crate::util::write_output;

/// Scan attempts after an adapter error.
const SCAN_RETRIES: u32 = 2;

pub async fn cmd_scan(
    timeout: u64,
    all: bool,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
    config: &Config,
) -> Result<()> {
    let spinner = if !quiet && format == OutputFormat::Text {
        Some(style::scanning_spinner(timeout))
    } else {
        None
    };

    let options = ScanOptions::default()
        .duration_secs(timeout)
        .named_only(!all);

    let result = scan_with_retry(options, SCAN_RETRIES, false).await;

    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    let devices = result.context("Failed to scan for devices")?;

    let content = match format {
        OutputFormat::Json => format_scan_json(&devices, opts)?,
        OutputFormat::Text => format_scan_text(&devices, opts, &config.aliases, !quiet),
    };

    write_output(output, &content)
}
