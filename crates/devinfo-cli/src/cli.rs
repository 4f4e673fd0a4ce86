//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Default seconds to search for a device, and again to connect to it.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Reusable device connection arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Device name, address or alias, or use DEVINFO_DEVICE env var
    #[arg(short, long, env = "DEVINFO_DEVICE")]
    pub device: Option<String>,

    /// Seconds to search for the device, and again to connect to it
    /// [default: configured timeout, then 30]
    #[arg(short = 'T', long)]
    pub timeout: Option<u64>,

    /// Output format (defaults to the configured format, then text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Parser)]
#[command(name = "devinfo")]
#[command(author, version, about = "Read Device Information and battery level from BLE peripherals", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan for nearby BLE peripherals
    Scan {
        /// Scan timeout in seconds
        #[arg(short, long, default_value = "10")]
        timeout: u64,

        /// Include peripherals that do not advertise a name
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Read the battery level of a device
    Battery {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Read and decode the Device Information service
    Info {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage device aliases (friendly names)
    Alias {
        #[command(subcommand)]
        action: AliasSubcommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Alias subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum AliasSubcommand {
    /// List all device aliases
    List,

    /// Set a device alias
    Set {
        /// Friendly name for the device (e.g., "chest-strap", "scale")
        name: String,

        /// Device identifier (name, MAC address or UUID)
        address: String,
    },

    /// Remove a device alias
    #[command(alias = "rm")]
    Remove {
        /// Alias name to remove
        name: String,
    },
}

/// Configuration keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigKey {
    /// Default device identifier
    Device,
    /// Default output format
    Format,
    /// Default connection timeout in seconds
    Timeout,
    /// Number of read retries
    Retries,
    /// Disable colored output
    NoColor,
}

/// Configuration subcommands
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Get a configuration value
    Get {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_enum)]
        key: ConfigKey,
        /// Configuration value
        value: String,
    },

    /// Unset (remove) a configuration value
    Unset {
        /// Configuration key to remove
        #[arg(value_enum)]
        key: ConfigKey,
    },

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init,
}

/// Parse boolean argument with flexible input
pub fn parse_bool_arg(s: &str) -> Result<bool, String> {
    match s.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" | "enable" | "enabled" => Ok(true),
        "false" | "no" | "off" | "0" | "disable" | "disabled" => Ok(false),
        _ => Err(format!(
            "Invalid boolean value '{}'. Use: true/false, yes/no, on/off, 1/0",
            s
        )),
    }
}
