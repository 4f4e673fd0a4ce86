//! Alias command implementation.
//!
//! Manages friendly device names (aliases) that map to device identifiers.

use anyhow::{Result, bail};
use tabled::builder::Builder;

use crate::cli::AliasSubcommand;
use crate::config::Config;
use crate::style;

pub fn cmd_alias(action: AliasSubcommand, quiet: bool, no_color: bool) -> Result<()> {
    let mut config = Config::load();
    let message = apply_alias(&mut config, action, no_color)?;
    if let Some(message) = message
        && !quiet
    {
        println!("{}", message);
    }
    Ok(())
}

/// Apply an alias action to `config`, saving it when it changed.
///
/// Returns the text to show the user.
fn apply_alias(
    config: &mut Config,
    action: AliasSubcommand,
    no_color: bool,
) -> Result<Option<String>> {
    match action {
        AliasSubcommand::List => {
            if config.aliases.is_empty() {
                return Ok(Some(
                    "No aliases configured.\n\nAdd an alias with: devinfo alias set <name> <identifier>"
                        .to_string(),
                ));
            }

            let mut builder = Builder::default();
            builder.push_record(["Alias", "Device"]);

            let mut aliases: Vec<_> = config.aliases.iter().collect();
            aliases.sort_by_key(|(name, _)| name.as_str());
            for (name, identifier) in aliases {
                builder.push_record([name.as_str(), identifier.as_str()]);
            }

            let mut table = builder.build();
            style::apply_table_style(&mut table, no_color);
            Ok(Some(table.to_string()))
        }
        AliasSubcommand::Set { name, address } => {
            if looks_like_address(&name) {
                bail!(
                    "Alias name '{}' looks like a device address. \
                     Use a friendly name instead (e.g., 'chest-strap', 'scale').",
                    name
                );
            }
            if address.trim().is_empty() {
                bail!("Device identifier must not be empty");
            }

            let was_update = config.aliases.contains_key(&name);
            config.aliases.insert(name.clone(), address.clone());
            config.save()?;

            let verb = if was_update { "Updated" } else { "Added" };
            Ok(Some(style::format_success(
                &format!("{} alias '{}' -> {}", verb, name, address),
                no_color,
            )))
        }
        AliasSubcommand::Remove { name } => {
            if config.aliases.remove(&name).is_none() {
                bail!("Alias '{}' not found", name);
            }
            config.save()?;
            Ok(Some(style::format_success(
                &format!("Removed alias '{}'", name),
                no_color,
            )))
        }
    }
}

/// Check if a string looks like a device address (MAC or UUID).
fn looks_like_address(s: &str) -> bool {
    // XX:XX:XX:XX:XX:XX or XX-XX-XX-XX-XX-XX
    let mac_pattern = s.chars().filter(|c| *c == ':' || *c == '-').count() >= 5
        && s.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '-');

    let uuid_pattern = s.len() >= 32 && s.chars().all(|c| c.is_ascii_hexdigit() || c == '-');

    mac_pattern || uuid_pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looks_like_address_mac() {
        assert!(looks_like_address("AA:BB:CC:DD:EE:FF"));
        assert!(looks_like_address("aa-bb-cc-dd-ee-ff"));
        assert!(!looks_like_address("AA:BB:CC"));
    }

    #[test]
    fn test_looks_like_address_uuid() {
        assert!(looks_like_address("12345678-1234-1234-1234-123456789abc"));
        assert!(looks_like_address("12345678123412341234123456789abc"));
    }

    #[test]
    fn test_looks_like_address_friendly_names() {
        assert!(!looks_like_address("chest-strap"));
        assert!(!looks_like_address("scale"));
        assert!(!looks_like_address("Polar H10"));
        assert!(!looks_like_address(""));
    }

    #[test]
    fn test_list_empty() {
        let mut config = Config::default();
        let message = apply_alias(&mut config, AliasSubcommand::List, true)
            .unwrap()
            .unwrap();
        assert!(message.contains("No aliases configured"));
    }

    #[test]
    fn test_list_sorted() {
        let mut config = Config::default();
        config.aliases.insert("scale".into(), "11:22:33:44:55:66".into());
        config.aliases.insert("chest-strap".into(), "AA:BB:CC:DD:EE:FF".into());

        let table = apply_alias(&mut config, AliasSubcommand::List, true)
            .unwrap()
            .unwrap();
        let strap = table.find("chest-strap").unwrap();
        let scale = table.find("scale").unwrap();
        assert!(strap < scale);
    }

    #[test]
    fn test_set_rejects_address_as_name() {
        let mut config = Config::default();
        let result = apply_alias(
            &mut config,
            AliasSubcommand::Set {
                name: "AA:BB:CC:DD:EE:FF".into(),
                address: "AA:BB:CC:DD:EE:FF".into(),
            },
            true,
        );
        assert!(result.is_err());
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_remove_missing_alias() {
        let mut config = Config::default();
        let err = apply_alias(
            &mut config,
            AliasSubcommand::Remove {
                name: "scale".into(),
            },
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
