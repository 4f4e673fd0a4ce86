//! Info command implementation.

use std::path::PathBuf;

use anyhow::Result;
use devinfo_core::ConnectionConfig;

use crate::cli::OutputFormat;
use crate::format::{FormatOptions, format_info_json, format_info_text};
use crate::style;
use crate::util::{connect_device, read_until_disconnect, write_output};

pub async fn cmd_info(
    identifier: &str,
    connection: ConnectionConfig,
    format: OutputFormat,
    output: Option<&PathBuf>,
    quiet: bool,
    opts: &FormatOptions,
) -> Result<()> {
    let show_progress = !quiet && format == OutputFormat::Text;
    let device = connect_device(identifier, connection, show_progress).await?;

    let result = read_until_disconnect(
        &device,
        "read Device Information",
        device.read_device_information(),
    )
    .await;

    if let Err(e) = device.disconnect().await {
        tracing::debug!("Disconnect failed: {}", e);
    }
    let info = result?;

    let content = match format {
        OutputFormat::Json => format_info_json(device.name(), device.address(), &info, opts)?,
        OutputFormat::Text => {
            // skipped and failed fields are already logged
            if !quiet && info.is_empty() {
                eprintln!(
                    "{}",
                    style::format_warning("No Device Information fields decoded", opts.no_color)
                );
            }
            format_info_text(&info)
        }
    };

    write_output(output, &content)
}
