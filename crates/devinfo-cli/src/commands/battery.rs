//! Battery command implementation.

use std::path::PathBuf;

use anyhow::Result;
use devinfo_core::ConnectionConfig;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_battery_json, format_battery_text};
use crate::util::{connect_device, read_until_disconnect, write_output};

pub async fn cmd_battery(
    identifier: &str,
    connection: ConnectionConfig,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    let show_progress = !quiet && format == OutputFormat::Text;
    let device = connect_device(identifier, connection, show_progress).await?;

    let result = read_until_disconnect(&device, "read battery level", device.read_battery()).await;

    if let Err(e) = device.disconnect().await {
        tracing::debug!("Disconnect failed: {}", e);
    }
    let level = result?;

    let content = match format {
        OutputFormat::Json => format_battery_json(device.name(), device.address(), level, opts)?,
        OutputFormat::Text => format_battery_text(level, opts),
    };

    write_output(output, &content)
}
