//! Config command implementation.

use anyhow::{Context, Result, bail};

use crate::cli::{ConfigAction, ConfigKey};
use crate::config::Config;
use crate::style;

pub fn cmd_config(action: ConfigAction, quiet: bool, no_color: bool) -> Result<()> {
    let path = Config::path();

    match action {
        ConfigAction::Path => {
            println!("{}", path.display());
        }
        ConfigAction::Show => {
            let config = Config::load();
            let content = toml::to_string_pretty(&config).context("Failed to serialize config")?;
            if !quiet {
                println!("{}", style::format_title(&path.display().to_string(), no_color));
            }
            print!("{}", content);
        }
        ConfigAction::Get { key } => {
            let config = Config::load();
            match config.get(key) {
                Some(value) => println!("{}", value),
                None => {
                    if !quiet {
                        eprintln!("{} is not set", key_name(key));
                    }
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load();
            config.set(key, &value)?;
            config.save()?;
            if !quiet {
                println!(
                    "{}",
                    style::format_success(&format!("Set {} = {}", key_name(key), value), no_color)
                );
            }
        }
        ConfigAction::Unset { key } => {
            let mut config = Config::load();
            config.unset(key);
            config.save()?;
            if !quiet {
                println!(
                    "{}",
                    style::format_success(&format!("Unset {}", key_name(key)), no_color)
                );
            }
        }
        ConfigAction::Init => {
            if path.exists() {
                bail!("Config file already exists: {}", path.display());
            }
            Config::default().save()?;
            if !quiet {
                println!(
                    "{}",
                    style::format_success(
                        &format!("Created config file: {}", path.display()),
                        no_color
                    )
                );
            }
        }
    }

    Ok(())
}

/// The key as written in the config file.
fn key_name(key: ConfigKey) -> &'static str {
    match key {
        ConfigKey::Device => "device",
        ConfigKey::Format => "format",
        ConfigKey::Timeout => "timeout",
        ConfigKey::Retries => "retries",
        ConfigKey::NoColor => "no_color",
    }
}
