//! `devinfo`: read Device Information and battery level from BLE peripherals.

mod cli;
mod commands;
mod config;
mod format;
mod style;
mod util;

use std::io;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, DEFAULT_TIMEOUT_SECS, DeviceArgs};
use crate::config::{Config, resolve_device, resolve_format, resolve_timeout};
use crate::format::FormatOptions;
use crate::util::{connection_config, require_device};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "devinfo", &mut io::stdout());
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let config = Config::load();
    let no_color = cli.no_color || config.no_color;
    let opts = FormatOptions::new(no_color).with_compact(cli.compact);
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Scan {
            timeout,
            all,
            format,
        } => {
            let format = resolve_format(format, &config);
            commands::cmd_scan(timeout, all, format, output, cli.quiet, &opts, &config).await?;
        }
        Commands::Battery { device } => {
            let target = DeviceTarget::resolve(device, &config)?;
            commands::cmd_battery(
                &target.identifier,
                target.connection,
                target.format,
                output,
                cli.quiet,
                &opts,
            )
            .await?;
        }
        Commands::Info { device } => {
            let target = DeviceTarget::resolve(device, &config)?;
            commands::cmd_info(
                &target.identifier,
                target.connection,
                target.format,
                output,
                cli.quiet,
                &opts,
            )
            .await?;
        }
        Commands::Config { action } => {
            commands::cmd_config(action, cli.quiet, no_color)?;
        }
        Commands::Alias { action } => {
            commands::cmd_alias(action, cli.quiet, no_color)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Log to stderr: `warn` when quiet, `debug` when verbose, else `RUST_LOG`
/// (default `info`).
fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose)
        .init();
}

/// A device command's resolved identifier and settings.
struct DeviceTarget {
    identifier: String,
    connection: devinfo_core::ConnectionConfig,
    format: cli::OutputFormat,
}

impl DeviceTarget {
    fn resolve(args: DeviceArgs, config: &Config) -> Result<Self> {
        let identifier = require_device(resolve_device(args.device, config))?;
        let timeout = resolve_timeout(args.timeout, config, DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            identifier,
            connection: connection_config(timeout, config.retries),
            format: resolve_format(args.format, config),
        })
    }
}
