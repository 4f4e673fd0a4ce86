//! Configuration file management.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::{ConfigKey, OutputFormat, parse_bool_arg};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "DEVINFO_CONFIG";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Default device identifier
    #[serde(default)]
    pub device: Option<String>,

    /// Default output format ("text" or "json")
    #[serde(default)]
    pub format: Option<String>,

    /// Connection timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Read retries per characteristic (none when unset)
    #[serde(default)]
    pub retries: Option<u32>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Device aliases (friendly name -> device identifier)
    #[serde(default)]
    pub aliases: HashMap<String, String>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devinfo")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from a specific file, falling back to defaults with a
    /// warning when it cannot be read or parsed.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Get a value as display text, `None` when unset.
    pub fn get(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::Device => self.device.clone(),
            ConfigKey::Format => self.format.clone(),
            ConfigKey::Timeout => self.timeout.map(|t| t.to_string()),
            ConfigKey::Retries => self.retries.map(|r| r.to_string()),
            ConfigKey::NoColor => Some(self.no_color.to_string()),
        }
    }

    /// Set a value from user input, validating it for the key.
    pub fn set(&mut self, key: ConfigKey, value: &str) -> Result<()> {
        match key {
            ConfigKey::Device => {
                if value.trim().is_empty() {
                    bail!("Device identifier must not be empty");
                }
                self.device = Some(value.to_string());
            }
            ConfigKey::Format => {
                let format = OutputFormat::from_str(value, true).map_err(|_| {
                    anyhow::anyhow!("Invalid format '{}'. Valid values: text, json", value)
                })?;
                self.format = Some(format_name(format).to_string());
            }
            ConfigKey::Timeout => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid number of seconds", value))?;
                if secs == 0 {
                    bail!("Timeout must be at least 1 second");
                }
                self.timeout = Some(secs);
            }
            ConfigKey::Retries => {
                let retries: u32 = value
                    .parse()
                    .with_context(|| format!("'{}' is not a valid retry count", value))?;
                self.retries = Some(retries);
            }
            ConfigKey::NoColor => {
                self.no_color = parse_bool_arg(value).map_err(anyhow::Error::msg)?;
            }
        }
        Ok(())
    }

    /// Reset a value to its default.
    pub fn unset(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::Device => self.device = None,
            ConfigKey::Format => self.format = None,
            ConfigKey::Timeout => self.timeout = None,
            ConfigKey::Retries => self.retries = None,
            ConfigKey::NoColor => self.no_color = false,
        }
    }
}

fn format_name(format: OutputFormat) -> &'static str {
    match format {
        OutputFormat::Text => "text",
        OutputFormat::Json => "json",
    }
}

/// Resolve device from arg (or env var, via clap) or config.
/// Aliases are resolved in both cases.
pub fn resolve_device(device: Option<String>, config: &Config) -> Option<String> {
    device
        .or_else(|| config.device.clone())
        .map(|d| resolve_alias(&d, config))
}

/// Resolve an alias to its device identifier, or return the original if not an alias.
pub fn resolve_alias(device: &str, config: &Config) -> String {
    config
        .aliases
        .get(device)
        .cloned()
        .unwrap_or_else(|| device.to_string())
}

/// Resolve timeout: use provided value, fall back to config, then default
pub fn resolve_timeout(cmd_timeout: Option<u64>, config: &Config, default: u64) -> u64 {
    cmd_timeout.or(config.timeout).unwrap_or(default)
}

/// Resolve output format: flag, then config, then text.
pub fn resolve_format(cmd_format: Option<OutputFormat>, config: &Config) -> OutputFormat {
    cmd_format
        .or_else(|| {
            config
                .format
                .as_deref()
                .and_then(|f| OutputFormat::from_str(f, true).ok())
        })
        .unwrap_or_default()
}
